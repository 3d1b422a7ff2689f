use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// 汇总文件的默认文件名
pub const SUMMARY_FILE: &str = "orb_fingerprints.csv";

const HEADER: [&str; 3] = ["id", "path", "hex_256"];

/// 汇总文件中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// `subject/stem`
    pub id: String,
    /// 原始图片路径
    pub path: String,
    /// 64 个十六进制字符
    pub hex_256: String,
}

impl FingerprintRecord {
    pub fn new(subject: &str, stem: &str, path: &Path, fingerprint: &Fingerprint) -> Self {
        Self {
            id: format!("{}/{}", subject, stem),
            path: path.to_string_lossy().into_owned(),
            hex_256: fingerprint.to_hex(),
        }
    }

    pub fn subject(&self) -> &str {
        self.id.split('/').next().unwrap_or(&self.id)
    }

    pub fn fingerprint(&self) -> Result<Fingerprint> {
        Fingerprint::from_hex(&self.hex_256).with_context(|| format!("记录 {} 的指纹无效", self.id))
    }
}

/// 写入 CSV 汇总文件，表头为 `id,path,hex_256`
pub fn write_records(path: &Path, records: &[FingerprintRecord]) -> Result<()> {
    let mut out = String::new();
    push_row(&mut out, &HEADER);
    for record in records {
        push_row(&mut out, &[&record.id, &record.path, &record.hex_256]);
    }
    fs::write(path, out).with_context(|| format!("写入汇总文件失败: {}", path.display()))
}

/// 读取 CSV 汇总文件，并校验表头和每一行的指纹
pub fn read_records(path: &Path) -> Result<Vec<FingerprintRecord>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("读取汇总文件失败: {}", path.display()))?;
    let mut rows = parse_csv(&content).with_context(|| format!("解析失败: {}", path.display()))?;
    if rows.is_empty() {
        bail!("汇总文件为空: {}", path.display());
    }
    let header = rows.remove(0);
    ensure!(header == HEADER, "表头应为 {:?}，实际为 {:?}", HEADER, header);

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let [id, path, hex_256]: [String; 3] = row
                .try_into()
                .map_err(|row: Vec<String>| anyhow::anyhow!("第 {} 行应有 3 列，实际为 {}", i + 2, row.len()))?;
            let record = FingerprintRecord { id, path, hex_256 };
            record.fingerprint()?;
            Ok(record)
        })
        .collect()
}

fn push_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

fn parse_csv(content: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = vec![];
    let mut row = vec![];
    let mut field = String::new();
    let mut quoted = false;
    // 引号字段结束后只能紧跟分隔符或换行
    let mut closed = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    quoted = false;
                    closed = true;
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            ',' => {
                row.push(std::mem::take(&mut field));
                closed = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                closed = false;
            }
            _ if closed => bail!("第 {} 行引号字段后有多余字符: {:?}", rows.len() + 1, c),
            '"' if field.is_empty() => quoted = true,
            _ => field.push(c),
        }
    }
    ensure!(!quoted, "引号未闭合");
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, path: &str, byte: u8) -> FingerprintRecord {
        FingerprintRecord {
            id: id.to_owned(),
            path: path.to_owned(),
            hex_256: Fingerprint::from([byte; 32]).to_hex(),
        }
    }

    #[test]
    fn test_subject() {
        assert_eq!(record("s1/3", "data/s1/3.pgm", 0).subject(), "s1");
        assert_eq!(record("noslash", "x", 0).subject(), "noslash");
    }

    #[test]
    fn test_new() {
        let fp = Fingerprint::from([0xff; 32]);
        let r = FingerprintRecord::new("s2", "7", Path::new("data/s2/7.pgm"), &fp);
        assert_eq!(r.id, "s2/7");
        assert_eq!(r.path, "data/s2/7.pgm");
        assert_eq!(r.hex_256, "f".repeat(64));
    }

    #[test]
    fn test_write_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        write_records(&path, &[record("s1/1", "data/s1/1.pgm", 0x01)]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "id,path,hex_256");
        assert_eq!(lines[1], format!("s1/1,data/s1/1.pgm,{}", "01".repeat(32)));
    }

    #[test]
    fn test_roundtrip_with_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        let records = vec![
            record("s1/1", "data/s1/1.pgm", 0x00),
            record("s1/2", "data/with,comma/2.pgm", 0x0f),
            record("s2/1", "data/\"quoted\"\nname.pgm", 0xf0),
        ];
        write_records(&path, &records).unwrap();
        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn test_read_bad_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        fs::write(&path, "name,path,hex\n").unwrap();
        assert!(read_records(&path).is_err());
    }

    #[test]
    fn test_read_bad_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        fs::write(&path, "id,path,hex_256\ns1/1,a.pgm,abc\n").unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("s1/1"));
    }

    #[test]
    fn test_read_trailing_text_after_quote() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        let hex = "00".repeat(32);
        fs::write(&path, format!("id,path,hex_256\ns1/1,\"a.pgm\"x,{}\n", hex)).unwrap();
        let err = read_records(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("第 2 行"));

        fs::write(&path, format!("id,path,hex_256\ns1/1,\"a,b.pgm\",{}\n", hex)).unwrap();
        assert_eq!(read_records(&path).unwrap()[0].path, "a,b.pgm");
    }

    #[test]
    fn test_read_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        let hex = "00".repeat(32);
        fs::write(&path, format!("id,path,hex_256\r\ns1/1,a.pgm,{}\r\n", hex)).unwrap();
        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hex_256, hex);
    }
}
