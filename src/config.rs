use clap::{Parser, Subcommand, ValueEnum};
use opencv::features2d::ORB_ScoreType;

use crate::cli::*;

#[derive(Parser, Debug, Clone)]
pub struct OrbOptions {
    /// ORB 特征点最大保留数量
    #[arg(short = 'n', value_name = "N", long, default_value_t = 500)]
    pub orb_nfeatures: u32,
    /// ORB 特征金字塔缩放因子
    #[arg(long, value_name = "SCALE", default_value_t = 1.2)]
    pub orb_scale_factor: f32,
    /// ORB 特征金字塔层数
    #[arg(long, value_name = "N", default_value_t = 8)]
    pub orb_nlevels: u32,
    /// 图片边缘不检测特征点的宽度，应与 patch size 一致
    #[arg(long, value_name = "PIXELS", default_value_t = 31)]
    pub orb_edge_threshold: u32,
    /// 原图所在的金字塔层级
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub orb_first_level: u32,
    /// 生成每个描述符位时比较的像素点数量，2 对应标准的 256 位汉明距离描述符
    #[arg(long, value_name = "K", default_value_t = 2, value_parser = clap::value_parser!(u32).range(2..=4))]
    pub orb_wta_k: u32,
    /// 特征点排序方式
    #[arg(long, value_enum, default_value_t = OrbScore::Harris)]
    pub orb_score_type: OrbScore,
    /// 计算描述符时使用的图块大小
    #[arg(long, value_name = "PIXELS", default_value_t = 31)]
    pub orb_patch_size: u32,
    /// FAST 角点检测器阈值
    #[arg(long, value_name = "THRESHOLD", default_value_t = 20)]
    pub orb_fast_threshold: u32,
    /// 检测前不进行直方图均衡化
    #[arg(long)]
    pub no_equalize: bool,
}

impl Default for OrbOptions {
    fn default() -> Self {
        Self {
            orb_nfeatures: 500,
            orb_scale_factor: 1.2,
            orb_nlevels: 8,
            orb_edge_threshold: 31,
            orb_first_level: 0,
            orb_wta_k: 2,
            orb_score_type: OrbScore::Harris,
            orb_patch_size: 31,
            orb_fast_threshold: 20,
            no_equalize: false,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbScore {
    /// Harris 角点响应
    Harris,
    /// FAST 角点响应，速度更快但稳定性稍差
    Fast,
}

impl From<OrbScore> for ORB_ScoreType {
    fn from(score: OrbScore) -> Self {
        match score {
            OrbScore::Harris => ORB_ScoreType::HARRIS_SCORE,
            OrbScore::Fast => ORB_ScoreType::FAST_SCORE,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "orbprint", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 为数据集中的每张图片生成 ORB 指纹
    Build(BuildCommand),
    /// 比较两个已保存的指纹
    Compare(CompareCommand),
    /// 计算单张图片的指纹
    Extract(ExtractCommand),
    /// 对所有指纹两两比较，统计同一人验证的混淆矩阵
    Evaluate(EvaluateCommand),
    /// 将混淆矩阵绘制为热力图
    Render(RenderCommand),
    /// 绘制图片上检测到的特征点
    Show(ShowCommand),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}
