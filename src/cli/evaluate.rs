use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde_json::json;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, OutputFormat};
use crate::confusion::{ConfusionMatrix, render_to_file};
use crate::record::{SUMMARY_FILE, read_records};
use crate::verify::{Sample, evaluate};

#[derive(Parser, Debug, Clone)]
pub struct EvaluateCommand {
    /// 汇总 CSV 文件，或包含 orb_fingerprints.csv 的目录
    pub summary: PathBuf,
    /// 两个指纹被判定为同一人的最大汉明距离
    #[arg(short, long, value_name = "N", default_value_t = 57, value_parser = clap::value_parser!(u32).range(0..=256))]
    pub threshold: u32,
    /// 在 TFHE 加密的指纹上计算距离，结果与明文比较相同（需要启用 fhe 特性）
    #[arg(long)]
    pub encrypted: bool,
    /// 将混淆矩阵热力图保存到文件
    #[arg(long, value_name = "FILE")]
    pub heatmap: Option<PathBuf>,
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for EvaluateCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let path = if self.summary.is_dir() { self.summary.join(SUMMARY_FILE) } else { self.summary.clone() };
        let samples = read_records(&path)?.iter().map(Sample::try_from).collect::<Result<Vec<_>>>()?;

        let cm = if self.encrypted {
            evaluate_encrypted(&samples, self.threshold)?
        } else {
            evaluate(&samples, self.threshold)
        };

        match self.output_format {
            OutputFormat::Json => {
                let value = json!({
                    "threshold": self.threshold,
                    "encrypted": self.encrypted,
                    "confusion": cm,
                    "accuracy": cm.accuracy(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            OutputFormat::Table => {
                println!("TP={}, TN={}, FP={}, FN={}", cm.tp, cm.tn, cm.fp, cm.fn_);
                println!("Accuracy={:.3}", cm.accuracy());
            }
        }

        if let Some(heatmap) = &self.heatmap {
            render_to_file(&cm, heatmap)?;
        }
        Ok(())
    }
}

#[cfg(feature = "fhe")]
fn evaluate_encrypted(samples: &[Sample], threshold: u32) -> Result<ConfusionMatrix> {
    crate::fhe::evaluate_encrypted(samples, threshold)
}

#[cfg(not(feature = "fhe"))]
fn evaluate_encrypted(_samples: &[Sample], _threshold: u32) -> Result<ConfusionMatrix> {
    anyhow::bail!("--encrypted 需要在编译时启用 fhe 特性")
}
