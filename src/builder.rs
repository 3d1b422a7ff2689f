use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use indicatif::{ParallelProgressIterator, ProgressBar};
use log::{error, info};
use rayon::prelude::*;
use regex::Regex;
use walkdir::WalkDir;

use crate::config::OrbOptions;
use crate::fingerprint::Fingerprint;
use crate::orb::OrbDetector;
use crate::record::{FingerprintRecord, SUMMARY_FILE, write_records};
use crate::utils::pb_style;

/// 数据集中的一张待处理图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub subject: String,
    pub stem: String,
    pub path: PathBuf,
}

impl ImageEntry {
    /// 指纹文件名：`<subject>_<stem>.bin`
    pub fn output_name(&self) -> String {
        format!("{}_{}.bin", self.subject, self.stem)
    }
}

/// 批量生成指纹
///
/// 输入目录下每个子目录对应一个人，子目录中的每张图片生成一个指纹文件，
/// 最后在输出目录写入汇总 CSV
pub struct FingerprintBuilder {
    orb: OrbOptions,
    re_subject: Regex,
    re_suffix: Regex,
    skip_errors: bool,
}

impl FingerprintBuilder {
    pub fn new(orb: OrbOptions) -> Self {
        Self {
            orb,
            re_subject: Regex::new(".*").expect("failed to build regex"),
            re_suffix: suffix_regex("pgm").expect("failed to build regex"),
            skip_errors: false,
        }
    }

    /// 子目录名需要匹配的正则表达式
    pub fn subject_pattern(mut self, pattern: &str) -> Result<Self> {
        self.re_subject = Regex::new(pattern)?;
        Ok(self)
    }

    /// 扫描的文件后缀名，多个后缀用逗号分隔，不区分大小写
    pub fn suffix(mut self, suffix: &str) -> Result<Self> {
        self.re_suffix = suffix_regex(suffix)?;
        Ok(self)
    }

    /// 图片处理失败时跳过而不是中止
    pub fn skip_errors(mut self, skip_errors: bool) -> Self {
        self.skip_errors = skip_errors;
        self
    }

    /// 按子目录名、文件名排序列出所有待处理图片
    ///
    /// 两张图片对应同一个指纹文件名时返回错误，例如 `s1_1/2.pgm` 与 `s1/1_2.pgm`
    pub fn scan(&self, data_root: &Path) -> Result<Vec<ImageEntry>> {
        info!("开始扫描目录: {}", data_root.display());
        let mut entries = vec![];
        let mut outputs: HashMap<String, PathBuf> = HashMap::new();
        for subject in sorted_children(data_root)? {
            if !subject.file_type().is_dir() {
                continue;
            }
            let name = subject.file_name().to_string_lossy().into_owned();
            if !self.re_subject.is_match(&name) {
                continue;
            }
            for image in sorted_children(subject.path())? {
                let path = image.path();
                if !image.file_type().is_file() {
                    continue;
                }
                let Some(ext) = path.extension() else {
                    continue;
                };
                if !self.re_suffix.is_match(&ext.to_string_lossy()) {
                    continue;
                }
                let stem = path.file_stem().unwrap_or_default().to_string_lossy().into_owned();
                let entry = ImageEntry { subject: name.clone(), stem, path: path.to_path_buf() };
                if let Some(prev) = outputs.insert(entry.output_name(), entry.path.clone()) {
                    bail!(
                        "{} 与 {} 的指纹文件名相同: {}",
                        prev.display(),
                        entry.path.display(),
                        entry.output_name()
                    );
                }
                entries.push(entry);
            }
        }
        info!("扫描完成，共 {} 张图片", entries.len());
        Ok(entries)
    }

    /// 生成 `data_root` 中所有图片的指纹，写入 `out_dir`，返回与输入顺序一致的记录
    pub fn build(&self, data_root: &Path, out_dir: &Path) -> Result<Vec<FingerprintRecord>> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("创建输出目录失败: {}", out_dir.display()))?;

        let entries = self.scan(data_root)?;
        let pb = ProgressBar::new(entries.len() as u64).with_style(pb_style());

        let init = || OrbDetector::create(&self.orb);
        let run = |orb: &mut Result<OrbDetector>, entry: &ImageEntry| -> Result<FingerprintRecord> {
            let orb = orb.as_mut().map_err(|e| anyhow!("{:#}", e))?;
            let record = process_image(orb, entry, out_dir)
                .with_context(|| format!("处理图片失败: {}", entry.path.display()))?;
            pb.set_message(record.id.clone());
            Ok(record)
        };

        let iter = entries.par_iter().progress_with(pb.clone());
        let records: Vec<FingerprintRecord> = if self.skip_errors {
            iter.map_init(init, |orb, entry| run(orb, entry).map_err(|e| error!("跳过: {:#}", e)).ok())
                .filter_map(|record| record)
                .collect()
        } else {
            // 遇到第一个错误后不再处理剩余图片
            iter.map_init(init, run).collect::<Result<Vec<_>>>()?
        };
        pb.finish_with_message("指纹生成完成");

        let csv_path = out_dir.join(SUMMARY_FILE);
        write_records(&csv_path, &records)?;
        info!("已保存 {} 个指纹到 {}", records.len(), csv_path.display());
        Ok(records)
    }
}

/// 计算单张图片的指纹并写入 `<out_dir>/<subject>_<stem>.bin`
fn process_image(orb: &mut OrbDetector, entry: &ImageEntry, out_dir: &Path) -> Result<FingerprintRecord> {
    let (_, _, descriptors) = orb.detect_file(&entry.path)?;
    let fingerprint = Fingerprint::from_descriptors(&descriptors);
    fingerprint.write_to(out_dir.join(entry.output_name()))?;
    Ok(FingerprintRecord::new(&entry.subject, &entry.stem, &entry.path, &fingerprint))
}

fn suffix_regex(suffix: &str) -> Result<Regex> {
    let re = format!("(?i)^({})$", suffix.replace(',', "|"));
    Ok(Regex::new(&re)?)
}

fn sorted_children(dir: &Path) -> Result<Vec<walkdir::DirEntry>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("读取目录失败: {}", dir.display()))
}
