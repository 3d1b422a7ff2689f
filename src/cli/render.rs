use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::confusion::{ConfusionMatrix, render_to_file};

#[derive(Parser, Debug, Clone)]
pub struct RenderCommand {
    /// 输出图片路径，格式由扩展名决定
    pub output: PathBuf,
    /// 真正例数量
    #[arg(long, default_value_t = 78)]
    pub tp: u64,
    /// 真负例数量
    #[arg(long, default_value_t = 3040)]
    pub tn: u64,
    /// 假正例数量
    #[arg(long, default_value_t = 1796)]
    pub fp: u64,
    /// 假负例数量
    #[arg(long = "fn", default_value_t = 36)]
    pub fn_: u64,
}

impl SubCommandExtend for RenderCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let cm = ConfusionMatrix::new(self.tp, self.tn, self.fp, self.fn_);
        render_to_file(&cm, &self.output)
    }
}
