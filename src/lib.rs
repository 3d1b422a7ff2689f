pub mod builder;
pub mod cli;
pub mod config;
pub mod confusion;
#[cfg(feature = "fhe")]
pub mod fhe;
pub mod fingerprint;
pub mod hamming;
pub mod orb;
pub mod record;
pub mod utils;
pub mod verify;

pub use builder::FingerprintBuilder;
pub use config::Opts;
pub use fingerprint::Fingerprint;
