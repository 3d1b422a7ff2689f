use std::path::Path;

use anyhow::{Result, anyhow, bail, ensure};
use indicatif::ProgressStyle;
use opencv::core::{self, KeyPoint, Mat, Vector};
use opencv::features2d;
use opencv::imgcodecs;
use opencv::imgproc;
use opencv::prelude::*;

use crate::fingerprint::{Descriptor, FINGERPRINT_BYTES};

/// 以灰度模式读取图片，可选进行直方图均衡化
pub fn imread(path: &Path, equalize: bool) -> Result<Mat> {
    let filename = path.to_str().ok_or_else(|| anyhow!("路径不是有效的 UTF-8: {}", path.display()))?;
    let img = imgcodecs::imread(filename, imgcodecs::IMREAD_GRAYSCALE)?;
    // OpenCV 读取失败时不会报错，而是返回空矩阵
    if img.empty() {
        bail!("无法读取图片: {}", path.display());
    }
    ensure!(img.channels() == 1, "图片不是单通道灰度图: {}", path.display());
    if !equalize {
        return Ok(img);
    }
    let mut output = Mat::default();
    imgproc::equalize_hist(&img, &mut output)?;
    Ok(output)
}

pub fn imwrite(path: &Path, img: &impl core::ToInputArray) -> Result<()> {
    let filename = path.to_str().ok_or_else(|| anyhow!("路径不是有效的 UTF-8: {}", path.display()))?;
    if !imgcodecs::imwrite(filename, img, &Vector::<i32>::new())? {
        bail!("无法写入图片: {}", path.display());
    }
    Ok(())
}

/// 将 OpenCV 的描述符矩阵转换为定长数组
pub fn descriptors_to_vec(descriptors: &Mat) -> Result<Vec<Descriptor>> {
    if descriptors.empty() {
        return Ok(vec![]);
    }
    ensure!(
        descriptors.cols() as usize == FINGERPRINT_BYTES,
        "描述符宽度应为 {} 字节，实际为 {}",
        FINGERPRINT_BYTES,
        descriptors.cols()
    );
    let data = descriptors.data_bytes()?;
    Ok(data
        .chunks_exact(FINGERPRINT_BYTES)
        .map(|chunk| chunk.try_into().expect("chunk size is fixed"))
        .collect())
}

pub fn draw_keypoints(image: &impl core::ToInputArray, keypoints: &Vector<KeyPoint>) -> Result<Mat> {
    let mut output = Mat::default();
    features2d::draw_keypoints(
        image,
        keypoints,
        &mut output,
        core::Scalar::all(-1.0),
        features2d::DrawMatchesFlags::DRAW_RICH_KEYPOINTS,
    )?;
    Ok(output)
}

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .expect("invalid progress bar template")
        .progress_chars("#>-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_empty() {
        let mat = Mat::default();
        assert!(descriptors_to_vec(&mat).unwrap().is_empty());
    }

    #[test]
    fn test_descriptors_to_vec() {
        let rows: Vec<[u8; 32]> = (0..3u8).map(|i| [i; 32]).collect();
        let mat = Mat::from_slice_2d(&rows).unwrap();
        let des = descriptors_to_vec(&mat).unwrap();
        assert_eq!(des, rows);
    }

    #[test]
    fn test_descriptors_wrong_width() {
        let rows = vec![[0u8; 16], [1u8; 16]];
        let mat = Mat::from_slice_2d(&rows).unwrap();
        assert!(descriptors_to_vec(&mat).is_err());
    }

    #[test]
    fn test_imread_missing() {
        let err = imread(Path::new("/nonexistent/face.pgm"), true).unwrap_err();
        assert!(err.to_string().contains("face.pgm"));
    }
}
