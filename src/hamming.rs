use anyhow::{Result, ensure};
use bytemuck::pod_read_unaligned;

/// 逐字节计算汉明距离，调用方需保证 va 和 vb 长度一致
#[inline(always)]
pub fn hamming_naive(va: &[u8], vb: &[u8]) -> u32 {
    let mut sum = 0;
    for i in 0..va.len() {
        sum += (va[i] ^ vb[i]).count_ones();
    }
    sum
}

#[inline(always)]
pub fn hamming_256(va: &[u8], vb: &[u8]) -> u32 {
    // [u8; 32] 没有 8 字节对齐，不能直接 cast_slice 成 &[u64]
    let word = |v: &[u8], i: usize| pod_read_unaligned::<u64>(&v[i * 8..i * 8 + 8]);
    (word(va, 0) ^ word(vb, 0)).count_ones()
        + (word(va, 1) ^ word(vb, 1)).count_ones()
        + (word(va, 2) ^ word(vb, 2)).count_ones()
        + (word(va, 3) ^ word(vb, 3)).count_ones()
}

/// 计算任意长度的两个字节序列的汉明距离
///
/// 长度不一致时直接返回错误，不做截断或填充
pub fn checked_hamming(va: &[u8], vb: &[u8]) -> Result<u32> {
    ensure!(va.len() == vb.len(), "向量长度不一致: {} != {}", va.len(), vb.len());
    if va.len() == 32 {
        return Ok(hamming_256(va, vb));
    }
    Ok(hamming_naive(va, vb))
}
