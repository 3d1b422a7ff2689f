use std::path::Path;

use anyhow::Result;
use log::info;
use opencv::core::{CV_8UC3, Mat, Point, Rect, Scalar};
use opencv::imgproc;
use serde::{Deserialize, Serialize};

use crate::utils;

/// 同一人验证的二分类混淆矩阵
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
}

impl ConfusionMatrix {
    pub fn new(tp: u64, tn: u64, fp: u64, fn_: u64) -> Self {
        Self { tp, tn, fp, fn_ }
    }

    /// 记录一次判断结果
    pub fn record(&mut self, actual: bool, predicted: bool) {
        match (actual, predicted) {
            (true, true) => self.tp += 1,
            (false, false) => self.tn += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_ += 1,
        }
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.tp += other.tp;
        self.tn += other.tn;
        self.fp += other.fp;
        self.fn_ += other.fn_;
        self
    }

    pub fn total(&self) -> u64 {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// (TP + TN) / 总数，没有样本时为 0
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => (self.tp + self.tn) as f64 / total as f64,
        }
    }

    /// 行为真实类别（正、负），列为预测类别（正、负）
    pub fn as_grid(&self) -> [[u64; 2]; 2] {
        [[self.tp, self.fn_], [self.fp, self.tn]]
    }
}

const WIDTH: i32 = 600;
const HEIGHT: i32 = 500;
const MARGIN_LEFT: i32 = 200;
const MARGIN_TOP: i32 = 70;
const MARGIN_RIGHT: i32 = 30;
const MARGIN_BOTTOM: i32 = 80;
const FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

const TITLE: &str = "Confusion matrix";
const X_LABEL: &str = "Predicted class";
const Y_LABEL: &str = "Actual class";
const X_TICKS: [&str; 2] = ["Predicted positive", "Predicted negative"];
const Y_TICKS: [&str; 2] = ["Actual positive", "Actual negative"];

/// 将 [0, 1] 映射到由白到深蓝的渐变，返回 BGR 颜色
pub fn blues(t: f64) -> Scalar {
    const LOW: [f64; 3] = [247., 251., 255.];
    const HIGH: [f64; 3] = [8., 48., 107.];
    let t = t.clamp(0.0, 1.0);
    let c: Vec<f64> = LOW.iter().zip(HIGH).map(|(l, h)| l + (h - l) * t).collect();
    Scalar::new(c[2], c[1], c[0], 0.)
}

/// 渲染混淆矩阵热力图并返回图像
pub fn render_heatmap(cm: &ConfusionMatrix) -> Result<Mat> {
    let mut img = Mat::new_rows_cols_with_default(HEIGHT, WIDTH, CV_8UC3, Scalar::all(255.))?;
    let grid = cm.as_grid();
    let max = grid.iter().flatten().copied().max().unwrap_or(0).max(1);

    let cell_w = (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / 2;
    let cell_h = (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) / 2;
    let black = Scalar::all(0.);
    let white = Scalar::all(255.);

    for (row, counts) in grid.iter().enumerate() {
        for (col, &count) in counts.iter().enumerate() {
            let t = count as f64 / max as f64;
            let rect = Rect::new(
                MARGIN_LEFT + col as i32 * cell_w,
                MARGIN_TOP + row as i32 * cell_h,
                cell_w,
                cell_h,
            );
            imgproc::rectangle(&mut img, rect, blues(t), imgproc::FILLED, imgproc::LINE_8, 0)?;
            let center = Point::new(rect.x + cell_w / 2, rect.y + cell_h / 2);
            let color = if t > 0.5 { white } else { black };
            put_text_centered(&mut img, &count.to_string(), center, 0.9, color, 2)?;
        }
    }
    imgproc::rectangle(
        &mut img,
        Rect::new(MARGIN_LEFT, MARGIN_TOP, cell_w * 2, cell_h * 2),
        black,
        1,
        imgproc::LINE_8,
        0,
    )?;

    put_text_centered(&mut img, TITLE, Point::new(WIDTH / 2, MARGIN_TOP / 2), 0.8, black, 2)?;
    for (i, tick) in X_TICKS.iter().enumerate() {
        let x = MARGIN_LEFT + i as i32 * cell_w + cell_w / 2;
        put_text_centered(&mut img, tick, Point::new(x, HEIGHT - MARGIN_BOTTOM + 20), 0.5, black, 1)?;
    }
    let plot_center = MARGIN_LEFT + cell_w;
    put_text_centered(&mut img, X_LABEL, Point::new(plot_center, HEIGHT - 25), 0.6, black, 1)?;
    for (i, tick) in Y_TICKS.iter().enumerate() {
        let y = MARGIN_TOP + i as i32 * cell_h + cell_h / 2;
        put_text_centered(&mut img, tick, Point::new(MARGIN_LEFT / 2 + 10, y), 0.5, black, 1)?;
    }
    put_text_centered(&mut img, Y_LABEL, Point::new(MARGIN_LEFT / 2 + 10, MARGIN_TOP - 12), 0.6, black, 1)?;

    Ok(img)
}

/// 渲染混淆矩阵热力图并保存，格式由扩展名决定
pub fn render_to_file(cm: &ConfusionMatrix, path: &Path) -> Result<()> {
    let img = render_heatmap(cm)?;
    utils::imwrite(path, &img)?;
    info!("混淆矩阵已保存到 {}", path.display());
    Ok(())
}

fn put_text_centered(
    img: &mut Mat,
    text: &str,
    center: Point,
    scale: f64,
    color: Scalar,
    thickness: i32,
) -> Result<()> {
    let mut baseline = 0;
    let size = imgproc::get_text_size(text, FONT, scale, thickness, &mut baseline)?;
    let org = Point::new(center.x - size.width / 2, center.y + size.height / 2);
    imgproc::put_text(img, text, org, FONT, scale, color, thickness, imgproc::LINE_AA, false)?;
    Ok(())
}
