use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use opencv::core::{KeyPoint, Mat, Ptr, Vector};
use opencv::features2d::ORB;
use opencv::prelude::*;

use crate::config::OrbOptions;
use crate::fingerprint::Descriptor;
use crate::utils;

/// OpenCV ORB 特征点检测器
///
/// OpenCV 的算法对象不能在线程间共享，并行处理时每个线程各自创建一个
pub struct OrbDetector {
    orb: Ptr<ORB>,
    equalize: bool,
}

impl OrbDetector {
    pub fn create(opts: &OrbOptions) -> Result<Self> {
        let orb = ORB::create(
            opts.orb_nfeatures as i32,
            opts.orb_scale_factor,
            opts.orb_nlevels as i32,
            opts.orb_edge_threshold as i32,
            opts.orb_first_level as i32,
            opts.orb_wta_k as i32,
            opts.orb_score_type.into(),
            opts.orb_patch_size as i32,
            opts.orb_fast_threshold as i32,
        )
        .context("创建 ORB 检测器失败")?;
        Ok(Self { orb, equalize: !opts.no_equalize })
    }

    /// 读取图片并计算特征点与描述符
    pub fn detect_file(&mut self, path: &Path) -> Result<(Mat, Vector<KeyPoint>, Vec<Descriptor>)> {
        let image = utils::imread(path, self.equalize)?;
        let (keypoints, descriptors) = self
            .detect_image(&image)
            .with_context(|| format!("计算特征点失败: {}", path.display()))?;
        debug!("{}: {} 个特征点", path.display(), descriptors.len());
        Ok((image, keypoints, descriptors))
    }

    /// 对已读取的灰度图计算特征点与描述符，没有特征点时返回空列表
    pub fn detect_image(&mut self, image: &Mat) -> Result<(Vector<KeyPoint>, Vec<Descriptor>)> {
        let mask = Mat::default();
        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        self.orb.detect_and_compute(image, &mask, &mut keypoints, &mut descriptors, false)?;
        let descriptors = utils::descriptors_to_vec(&descriptors)?;
        Ok((keypoints, descriptors))
    }
}
