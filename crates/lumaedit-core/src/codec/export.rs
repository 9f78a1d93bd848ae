use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// A fresh export file name: `<prefix>_<uuid>.jpg`.
pub fn export_file_name(prefix: &str) -> String {
    format!("{}_{}.jpg", prefix, Uuid::new_v4())
}

/// Write encoded export bytes to a new uniquely named file in `dir`.
///
/// The directory is created if missing. Returns the written path.
pub fn write_export(bytes: &[u8], dir: &Path, prefix: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(prefix));
    fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_are_unique() {
        let a = export_file_name("lumaedit");
        let b = export_file_name("lumaedit");
        assert_ne!(a, b);
        assert!(a.starts_with("lumaedit_"));
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn test_write_export_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out");
        let path = write_export(&[1, 2, 3], &nested, "shot").unwrap();
        assert_eq!(path.parent(), Some(nested.as_path()));
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_write_export_fails_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blocker");
        fs::write(&file, b"x").unwrap();
        assert!(write_export(&[0], &file, "shot").is_err());
    }
}
