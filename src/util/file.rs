//! File access shared by the shape and sequence codecs.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use super::{Error, Result};

/// Memory-map `path` read-only.
///
/// Empty files are reported as truncated data.
pub fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;

    let size = file.metadata()?.len();
    if size == 0 {
        return Err(Error::UnexpectedEndOfData("file"));
    }

    // Safety: mapped read-only; the file must not be truncated while mapped.
    let map = unsafe { Mmap::map(&file) }.map_err(Error::Io)?;
    tracing::trace!(path = %path.display(), size, "mapped file");
    Ok(map)
}

/// Write through a sibling `.tmp` file, then rename over `path`.
///
/// `fill` produces the whole file. On error the temporary file is removed and
/// `path` is left untouched.
pub fn write_atomic(path: &Path, fill: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let tmp = tmp_path(path);
    match write_new(&tmp, fill) {
        Ok(()) => {
            fs::rename(&tmp, path)?;
            tracing::debug!(path = %path.display(), "saved");
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn write_new(path: &Path, fill: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    fill(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.dts");
        assert!(matches!(map_file(&path), Err(Error::FileNotFound(p)) if p == path));
    }

    #[test]
    fn test_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(map_file(file.path()), Err(Error::UnexpectedEndOfData(_))));
    }

    #[test]
    fn test_write_atomic() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_atomic(&path, |w| Ok(w.write_all(b"abcd")?))?;
        assert_eq!(&map_file(&path)?[..], b"abcd");
        assert!(!tmp_path(&path).exists());
        Ok(())
    }

    #[test]
    fn test_write_atomic_failure_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, b"old").unwrap();
        let result = write_atomic(&path, |_| Err(Error::corrupt("boom")));
        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"old");
        assert!(!tmp_path(&path).exists());
    }
}
