use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde_json::json;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, OrbOptions, OutputFormat};
use crate::fingerprint::Fingerprint;
use crate::orb::OrbDetector;

#[derive(Parser, Debug, Clone)]
pub struct ExtractCommand {
    #[command(flatten)]
    pub orb: OrbOptions,
    /// 图片路径
    pub image: PathBuf,
    /// 同时将指纹保存到文件
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for ExtractCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let mut orb = OrbDetector::create(&self.orb)?;
        let (_, _, descriptors) = orb.detect_file(&self.image)?;
        let fingerprint = Fingerprint::from_descriptors(&descriptors);

        if let Some(output) = &self.output {
            fingerprint.write_to(output)?;
        }

        match self.output_format {
            OutputFormat::Json => {
                let value = json!({
                    "path": self.image.to_string_lossy(),
                    "descriptors": descriptors.len(),
                    "hex_256": fingerprint.to_hex(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            OutputFormat::Table => {
                println!("{}\t{}\t{}", fingerprint, descriptors.len(), self.image.display());
            }
        }
        Ok(())
    }
}
