use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, ensure};
use ndarray::Array1;
use ndarray_npy::{read_npy, write_npy};

use crate::hamming::hamming_256;

/// ORB 描述符的字节数
pub const FINGERPRINT_BYTES: usize = 32;
/// ORB 描述符的位数
pub const FINGERPRINT_BITS: usize = FINGERPRINT_BYTES * 8;

/// 单个 ORB 描述符，256 位
pub type Descriptor = [u8; FINGERPRINT_BYTES];

/// 一张图片的 256 位指纹，由所有描述符按位多数投票得到
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_BYTES]);

impl Fingerprint {
    /// 按位多数投票聚合描述符，没有描述符时返回全 0 指纹
    pub fn from_descriptors(descriptors: &[Descriptor]) -> Self {
        Self(majority_vote(descriptors))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_BYTES] {
        &self.0
    }

    /// 与另一个指纹的汉明距离，范围 0 ~ 256
    pub fn distance(&self, other: &Self) -> u32 {
        hamming_256(&self.0, &other.0)
    }

    /// 编码为 64 个小写十六进制字符，每个字节高半字节在前
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        ensure!(s.len() == FINGERPRINT_BYTES * 2, "十六进制指纹长度应为 64，实际为 {}", s.len());
        ensure!(s.bytes().all(|c| c.is_ascii_hexdigit()), "无效的十六进制指纹: {}", s);
        let mut bytes = [0u8; FINGERPRINT_BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)?;
        }
        Ok(Self(bytes))
    }

    /// 从文件读取指纹
    ///
    /// `.npy` 文件按一维 uint8 数组读取，其他文件按 32 字节原始数据读取
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = if is_npy(path) {
            let arr: Array1<u8> =
                read_npy(path).with_context(|| format!("读取 npy 文件失败: {}", path.display()))?;
            arr.to_vec()
        } else {
            fs::read(path).with_context(|| format!("读取指纹文件失败: {}", path.display()))?
        };
        Self::try_from(data.as_slice()).with_context(|| format!("无效的指纹文件: {}", path.display()))
    }

    /// 写入指纹文件，扩展名为 `.npy` 时写入 NumPy 格式，否则写入 32 字节原始数据
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if is_npy(path) {
            write_npy(path, &Array1::from(self.0.to_vec()))
                .with_context(|| format!("写入 npy 文件失败: {}", path.display()))?;
        } else {
            fs::write(path, self.0)
                .with_context(|| format!("写入指纹文件失败: {}", path.display()))?;
        }
        Ok(())
    }
}

impl From<[u8; FINGERPRINT_BYTES]> for Fingerprint {
    fn from(bytes: [u8; FINGERPRINT_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Fingerprint {
    type Error = anyhow::Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; FINGERPRINT_BYTES] = bytes
            .try_into()
            .map_err(|_| anyhow!("指纹长度应为 {} 字节，实际为 {}", FINGERPRINT_BYTES, bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl FromStr for Fingerprint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn is_npy(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("npy"))
}

/// 将 32 字节展开为 256 位，每个字节内高位在前
pub fn unpack_bits(bytes: &[u8; FINGERPRINT_BYTES]) -> [bool; FINGERPRINT_BITS] {
    let mut bits = [false; FINGERPRINT_BITS];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = (bytes[i / 8] >> (7 - i % 8)) & 1 == 1;
    }
    bits
}

/// `unpack_bits` 的逆操作
pub fn pack_bits(bits: &[bool; FINGERPRINT_BITS]) -> [u8; FINGERPRINT_BYTES] {
    let mut bytes = [0u8; FINGERPRINT_BYTES];
    for (i, chunk) in bits.chunks_exact(8).enumerate() {
        let mut b = 0;
        for &bit in chunk {
            b <<= 1;
            b |= bit as u8;
        }
        bytes[i] = b;
    }
    bytes
}

/// 对每个位计算 1 的占比，严格大于一半时该位为 1，恰好一半时为 0
pub fn majority_vote(descriptors: &[Descriptor]) -> Descriptor {
    if descriptors.is_empty() {
        return [0u8; FINGERPRINT_BYTES];
    }

    let mut bit_counts = [0usize; FINGERPRINT_BITS];
    for des in descriptors {
        for (count, bit) in bit_counts.iter_mut().zip(unpack_bits(des)) {
            *count += bit as usize;
        }
    }

    // ones / n > 0.5 等价于 2 * ones > n，避免浮点误差
    let n = descriptors.len();
    let mut votes = [false; FINGERPRINT_BITS];
    for (vote, count) in votes.iter_mut().zip(bit_counts) {
        *vote = 2 * count > n;
    }
    pack_bits(&votes)
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;
    use rstest::rstest;

    use super::*;

    fn random_descriptors(rng: &mut StdRng, n: usize) -> Vec<Descriptor> {
        let mut data = vec![[0u8; FINGERPRINT_BYTES]; n];
        for des in &mut data {
            rng.fill(&mut des[..]);
        }
        data
    }

    #[test]
    fn test_single_descriptor_is_identity() {
        let mut rng = StdRng::seed_from_u64(42);
        for des in random_descriptors(&mut rng, 50) {
            assert_eq!(majority_vote(&[des]), des);
        }
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(majority_vote(&[]), [0u8; 32]);
        assert_eq!(Fingerprint::from_descriptors(&[]), Fingerprint::default());
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(500)]
    fn test_output_length_fixed(#[case] n: usize) {
        let mut rng = StdRng::seed_from_u64(n as u64);
        let fp = Fingerprint::from_descriptors(&random_descriptors(&mut rng, n));
        assert_eq!(fp.as_bytes().len(), 32);
        assert_eq!(fp.to_hex().len(), 64);
    }

    #[test]
    fn test_tie_resolves_to_zero() {
        // 两个描述符只有第一个字节的最低位不同
        let mut a = [0xa5u8; 32];
        let mut b = [0xa5u8; 32];
        a[0] &= !1;
        b[0] |= 1;
        let out = majority_vote(&[a, b]);
        assert_eq!(out[0] & 1, 0);
        assert_eq!(out[0], 0xa4);
        assert_eq!(&out[1..], &a[1..]);
    }

    #[test]
    fn test_majority_of_three() {
        let a = [0b1100_0000u8; 32];
        let b = [0b1010_0000u8; 32];
        let c = [0b1001_0000u8; 32];
        assert_eq!(majority_vote(&[a, b, c]), [0b1000_0000u8; 32]);
    }

    #[test]
    fn test_bit_order_msb_first() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0b1000_0000;
        bytes[31] = 0b0000_0001;
        let bits = unpack_bits(&bytes);
        assert!(bits[0]);
        assert!(bits[255]);
        assert_eq!(bits.iter().filter(|b| **b).count(), 2);
    }

    #[test]
    fn test_pack_unpack_roundtrip() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut bits = [false; FINGERPRINT_BITS];
        for bit in bits.iter_mut() {
            *bit = rng.random();
        }
        assert_eq!(unpack_bits(&pack_bits(&bits)), bits);
    }

    #[test]
    fn test_distance() {
        let a = Fingerprint::from([0x00; 32]);
        let b = Fingerprint::from([0xff; 32]);
        assert_eq!(a.distance(&b), 256);
        assert_eq!(b.distance(&a), 256);
        assert_eq!(a.distance(&a), 0);

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let x = Fingerprint::from_descriptors(&random_descriptors(&mut rng, 5));
            let y = Fingerprint::from_descriptors(&random_descriptors(&mut rng, 5));
            let expected = crate::hamming::checked_hamming(x.as_bytes(), y.as_bytes()).unwrap();
            assert_eq!(x.distance(&y), expected);
        }
    }

    #[test]
    fn test_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        bytes[31] = 0x01;
        let fp = Fingerprint::from(bytes);
        let hex = fp.to_hex();
        assert!(hex.starts_with("ab00"));
        assert!(hex.ends_with("01"));
        assert_eq!(Fingerprint::from_hex(&hex).unwrap(), fp);
        assert_eq!(Fingerprint::from_hex(&hex.to_uppercase()).unwrap(), fp);
        assert_eq!(fp.to_string(), hex);
    }

    #[rstest]
    #[case("")]
    #[case("00")]
    #[case(&"0".repeat(65))]
    #[case(&"zz".repeat(32))]
    #[case(&"é".repeat(32))]
    fn test_hex_invalid(#[case] s: &str) {
        assert!(Fingerprint::from_hex(s).is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let fp = Fingerprint::from_descriptors(&random_descriptors(&mut rng, 10));

        let bin = dir.path().join("s1_1.bin");
        fp.write_to(&bin).unwrap();
        assert_eq!(std::fs::read(&bin).unwrap(), fp.as_bytes().to_vec());
        assert_eq!(Fingerprint::read_from(&bin).unwrap(), fp);

        let npy = dir.path().join("s1_1.npy");
        fp.write_to(&npy).unwrap();
        assert_eq!(Fingerprint::read_from(&npy).unwrap(), fp);
    }

    #[test]
    fn test_read_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, [0u8; 31]).unwrap();
        assert!(Fingerprint::read_from(&path).is_err());
    }
}
