//! Whole-file replacement through a sibling temp file

use std::fs::{self, File};
use std::path::Path;

use crate::error::SheetResult;

/// Write a new version of `path` and swap it in.
///
/// The content goes to a temp file in the same directory, which is then
/// renamed over the target. Readers never see a half-written file and a
/// failed write leaves the original untouched.
pub(crate) fn replace_file<F>(path: &Path, write: F) -> SheetResult<()>
where
    F: FnOnce(&mut File) -> SheetResult<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".notify-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;

    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(temp.path(), meta.permissions())?;
    }

    temp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetError;
    use std::io::Write;

    #[test]
    fn test_replace_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, "old").unwrap();

        replace_file(&path, |f| Ok(f.write_all(b"new")?)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, "old").unwrap();

        let result = replace_file(&path, |f| {
            f.write_all(b"partial")?;
            Err(SheetError::Parse("boom".into()))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
