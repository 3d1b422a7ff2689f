use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, OrbOptions};
use crate::orb::OrbDetector;
use crate::utils;

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    #[command(flatten)]
    pub orb: OrbOptions,
    /// 图片路径
    pub image: PathBuf,
    /// 绘制结果的保存路径
    pub output: PathBuf,
}

impl SubCommandExtend for ShowCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let mut orb = OrbDetector::create(&self.orb)?;
        let (image, kps, _) = orb.detect_file(&self.image)?;
        let output = utils::draw_keypoints(&image, &kps)?;
        utils::imwrite(&self.output, &output)?;
        info!("{} 个特征点，已保存到 {}", kps.len(), self.output.display());
        Ok(())
    }
}
