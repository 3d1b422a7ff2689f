mod build;
mod compare;
mod evaluate;
mod extract;
mod render;
mod show;

pub use build::*;
pub use compare::*;
pub use evaluate::*;
pub use extract::*;
pub use render::*;
pub use show::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> anyhow::Result<()>;
}
