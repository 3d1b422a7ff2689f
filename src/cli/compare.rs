use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde_json::json;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, OutputFormat};
use crate::fingerprint::Fingerprint;
use crate::hamming::checked_hamming;

#[derive(Parser, Debug, Clone)]
pub struct CompareCommand {
    /// 指纹文件 1（32 字节原始数据或 .npy）
    pub a: PathBuf,
    /// 指纹文件 2
    pub b: PathBuf,
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for CompareCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let a = Fingerprint::read_from(&self.a)?;
        let b = Fingerprint::read_from(&self.b)?;
        let distance = checked_hamming(a.as_bytes(), b.as_bytes())?;

        match self.output_format {
            OutputFormat::Json => {
                let value = json!({
                    "a": a.to_hex(),
                    "b": b.to_hex(),
                    "distance": distance,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            OutputFormat::Table => {
                for (i, (x, y)) in a.as_bytes().iter().zip(b.as_bytes()).enumerate() {
                    println!("Byte {}: {} {}", i, x, y);
                }
                println!("Hamming({}, {}) = {}", self.a.display(), self.b.display(), distance);
            }
        }
        Ok(())
    }
}
