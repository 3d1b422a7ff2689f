use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::builder::FingerprintBuilder;
use crate::cli::SubCommandExtend;
use crate::config::{Opts, OrbOptions};

#[derive(Parser, Debug, Clone)]
pub struct BuildCommand {
    #[command(flatten)]
    pub orb: OrbOptions,
    /// 数据集目录，每个子目录对应一个人
    pub data_root: PathBuf,
    /// 指纹文件和汇总 CSV 的输出目录
    pub out_dir: PathBuf,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "pgm")]
    pub suffix: String,
    /// 子目录名需要匹配的正则表达式
    #[arg(long, value_name = "REGEX", default_value = ".*")]
    pub subject_pattern: String,
    /// 图片读取失败时跳过该图片，而不是中止
    #[arg(long)]
    pub skip_errors: bool,
}

impl SubCommandExtend for BuildCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        FingerprintBuilder::new(self.orb.clone())
            .subject_pattern(&self.subject_pattern)?
            .suffix(&self.suffix)?
            .skip_errors(self.skip_errors)
            .build(&self.data_root, &self.out_dir)?;
        Ok(())
    }
}
