//! File checksums and size formatting for artifact checks

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Bytes fetched in test mode; checksums cover at most this prefix
pub const TEST_FILE_SIZE: u64 = 10_241;

/// Hex md5 of a file, or of its first `limit` bytes
pub fn file_md5(path: &Path, limit: Option<u64>) -> io::Result<String> {
    let file = File::open(path)?;

    let mut contents = Vec::new();
    match limit {
        Some(limit) => file.take(limit).read_to_end(&mut contents)?,
        None => BufReader::new(file).read_to_end(&mut contents)?,
    };

    Ok(format!("{:x}", md5::compute(&contents)))
}

/// Human-readable byte count, e.g. `9.77KiB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 9] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

    if bytes == 0 {
        return "0.00B".to_string();
    }

    let mut exponent = 0;
    let mut scaled = bytes;
    while scaled >= 1024 && exponent < UNITS.len() - 1 {
        scaled /= 1024;
        exponent += 1;
    }
    let converted = bytes as f64 / 1024f64.powi(exponent as i32);

    format!("{:.2}{}", converted, UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_md5_full_and_prefix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("video.mp4");
        fs::write(&path, b"hello world").unwrap();

        assert_eq!(
            file_md5(&path, None).unwrap(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(
            file_md5(&path, Some(5)).unwrap(),
            format!("{:x}", md5::compute(b"hello"))
        );
    }

    #[test]
    fn test_md5_prefix_larger_than_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.mp4");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            file_md5(&path, Some(TEST_FILE_SIZE)).unwrap(),
            file_md5(&path, None).unwrap()
        );
    }

    #[test]
    fn test_md5_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(file_md5(&dir.path().join("missing"), None).is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.00B");
        assert_eq!(format_bytes(500), "500.00B");
        assert_eq!(format_bytes(10_000), "9.77KiB");
        assert_eq!(format_bytes(1024 * 1024), "1.00MiB");
    }
}
