use anyhow::{Context, Result};
use indicatif::ProgressBar;
use log::info;
use tfhe::prelude::*;
use tfhe::{ClientKey, ConfigBuilder, FheUint8, FheUint16, ServerKey, generate_keys, set_server_key};

use crate::confusion::ConfusionMatrix;
use crate::fingerprint::Fingerprint;
use crate::utils::pb_style;
use crate::verify::Sample;

/// 加密后的指纹，每个字节一个密文
pub struct EncryptedFingerprint(Vec<FheUint8>);

/// 在 TFHE 密文上比较指纹
///
/// 客户端密钥负责加密指纹和解密判断结果，服务端密钥在计算前装入当前线程
pub struct EncryptedComparator {
    client_key: ClientKey,
    server_key: ServerKey,
}

impl Default for EncryptedComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl EncryptedComparator {
    pub fn new() -> Self {
        info!("生成 FHE 密钥");
        let config = ConfigBuilder::default().build();
        let (client_key, server_key) = generate_keys(config);
        Self { client_key, server_key }
    }

    pub fn encrypt(&self, fingerprint: &Fingerprint) -> EncryptedFingerprint {
        let bytes = fingerprint.as_bytes().iter().map(|&b| FheUint8::encrypt(b, &self.client_key));
        EncryptedFingerprint(bytes.collect())
    }

    /// 密文上的汉明距离：逐字节 XOR 后 popcount 再求和
    ///
    /// 累加器为 16 位，完全相反的两个指纹距离为 256，8 位累加器会回绕到 0
    pub fn distance(&self, a: &EncryptedFingerprint, b: &EncryptedFingerprint) -> FheUint16 {
        set_server_key(self.server_key.clone());
        let mut sum = FheUint16::encrypt(0u16, &self.client_key);
        for (x, y) in a.0.iter().zip(&b.0) {
            let ones: FheUint16 = (x ^ y).count_ones().cast_into();
            sum += &ones;
        }
        sum
    }

    pub fn decrypt_distance(&self, distance: &FheUint16) -> u32 {
        let distance: u16 = distance.decrypt(&self.client_key);
        distance.into()
    }

    /// 在密文上判断 `distance <= threshold`，只解密判断结果
    pub fn is_match(&self, a: &EncryptedFingerprint, b: &EncryptedFingerprint, threshold: u32) -> Result<bool> {
        let bound = u16::try_from(threshold).with_context(|| format!("阈值超出范围: {}", threshold))?;
        let matched = self.distance(a, b).le(bound);
        Ok(matched.decrypt(&self.client_key))
    }
}

/// 与 [`crate::verify::evaluate`] 相同的两两比较，距离在密文上计算
///
/// 每个指纹只加密一次；TFHE 内部已经用 rayon 并行，这里逐对顺序执行
pub fn evaluate_encrypted(samples: &[Sample], threshold: u32) -> Result<ConfusionMatrix> {
    let n = samples.len();
    info!("对 {} 个加密指纹进行两两比较，阈值 = {}", n, threshold);
    let comparator = EncryptedComparator::new();
    let encrypted: Vec<EncryptedFingerprint> = samples.iter().map(|s| comparator.encrypt(&s.fingerprint)).collect();

    let pb = ProgressBar::new((n * n.saturating_sub(1) / 2) as u64).with_style(pb_style());
    let mut cm = ConfusionMatrix::default();
    for i in 0..n {
        for j in i + 1..n {
            let actual = samples[i].subject == samples[j].subject;
            let predicted = comparator.is_match(&encrypted[i], &encrypted[j], threshold)?;
            cm.record(actual, predicted);
            pb.inc(1);
        }
    }
    pb.finish_with_message("密文比较完成");
    Ok(cm)
}
