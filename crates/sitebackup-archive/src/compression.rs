//! Compression settings and checksums for archive files.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Default compression level (6 = balanced speed/ratio).
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Calculates SHA256 checksum of a file.
pub fn calculate_checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;

    let hash = hasher.finalize();
    Ok(format!("{:x}", hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_calculate_checksum() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(temp_dir.path(), "test.txt", b"abc");

        let checksum = calculate_checksum(&path).unwrap();
        assert_eq!(
            checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        let other = create_test_file(temp_dir.path(), "other.txt", b"abd");
        assert_ne!(calculate_checksum(&other).unwrap(), checksum);
    }

    #[test]
    fn test_checksum_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(calculate_checksum(&temp_dir.path().join("missing")).is_err());
    }
}
