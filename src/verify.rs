use anyhow::Result;
use log::info;
use rayon::prelude::*;

use crate::confusion::ConfusionMatrix;
use crate::fingerprint::Fingerprint;
use crate::record::FingerprintRecord;

/// 参与验证的一张图片：所属的人与指纹
#[derive(Debug, Clone)]
pub struct Sample {
    pub subject: String,
    pub fingerprint: Fingerprint,
}

impl TryFrom<&FingerprintRecord> for Sample {
    type Error = anyhow::Error;

    fn try_from(record: &FingerprintRecord) -> Result<Self> {
        Ok(Self { subject: record.subject().to_owned(), fingerprint: record.fingerprint()? })
    }
}

/// 两两比较所有样本，距离不超过 `threshold` 时判定为同一人
///
/// 每对样本 (i, j) 只比较一次，i < j
pub fn evaluate(samples: &[Sample], threshold: u32) -> ConfusionMatrix {
    info!("对 {} 个指纹进行两两比较，阈值 = {}", samples.len(), threshold);
    (0..samples.len())
        .into_par_iter()
        .map(|i| {
            let mut cm = ConfusionMatrix::default();
            let a = &samples[i];
            for b in &samples[i + 1..] {
                let actual = a.subject == b.subject;
                let predicted = a.fingerprint.distance(&b.fingerprint) <= threshold;
                cm.record(actual, predicted);
            }
            cm
        })
        .reduce(ConfusionMatrix::default, ConfusionMatrix::merge)
}
