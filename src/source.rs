//! The script under repair
//!
//! A [`SourceFile`] owns the working copy on disk for the duration of a
//! session. Reads produce a [`Snapshot`]: a versioned view of the line
//! sequence. Edit line numbers coming back from the model are only valid
//! against the snapshot the model was shown, so the id travels with the
//! lines and the patch applier refuses a stale one.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A versioned view of the file's lines at one point in time.
///
/// Lines keep their trailing newline, matching what is written back to
/// disk. The final line may lack one if the file did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: u64,
    pub lines: Vec<String>,
}

impl Snapshot {
    /// Render the lines with a 1-based `"{n}: "` prefix for the model
    /// prompt. Content and newlines are preserved verbatim.
    pub fn numbered(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(&format!("{}: {}", i + 1, line));
        }
        out
    }

    pub fn text(&self) -> String {
        self.lines.concat()
    }
}

/// The target script, exclusively owned by one repair session.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    next_snapshot_id: u64,
}

impl SourceFile {
    /// Open the script for a session. Fails if the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("script not found: {}", path.display());
        }
        Ok(Self {
            path: path.to_path_buf(),
            next_snapshot_id: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current file contents as a fresh snapshot.
    pub fn snapshot(&mut self) -> Result<Snapshot> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let id = self.next_snapshot_id;
        self.next_snapshot_id += 1;
        Ok(Snapshot {
            id,
            lines: content.split_inclusive('\n').map(String::from).collect(),
        })
    }

    /// Replace the file contents with the given line sequence.
    pub fn write_lines(&self, lines: &[String]) -> Result<()> {
        fs::write(&self.path, lines.concat())
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// `<path>.bak`, next to the working file.
    pub fn backup_path(&self) -> PathBuf {
        backup_path_for(&self.path)
    }

    /// Copy the working file to `<path>.bak`. Called once per session,
    /// before the first patch attempt.
    pub fn create_backup(&self) -> Result<PathBuf> {
        let backup = self.backup_path();
        fs::copy(&self.path, &backup)
            .with_context(|| format!("failed to create backup {}", backup.display()))?;
        Ok(backup)
    }
}

pub fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Copy `<path>.bak` back over the working file. Returns `false` when no
/// backup exists; the working file is left untouched in that case.
pub fn restore_backup(path: &Path) -> Result<bool> {
    let backup = backup_path_for(path);
    if !backup.is_file() {
        return Ok(false);
    }
    fs::copy(&backup, path)
        .with_context(|| format!("failed to restore {}", backup.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_numbered_listing() {
        let snapshot = Snapshot {
            id: 0,
            lines: vec!["a\n".to_string(), "b\n".to_string(), "c".to_string()],
        };
        assert_eq!(snapshot.numbered(), "1: a\n2: b\n3: c");
    }

    #[test]
    fn test_snapshot_ids_increase() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("script.py");
        fs::write(&path, "x = 1\n").unwrap();

        let mut source = SourceFile::open(&path).unwrap();
        let first = source.snapshot().unwrap();
        let second = source.snapshot().unwrap();
        assert_eq!(first.id, 0);
        assert_eq!(second.id, 1);
        assert_eq!(first.lines, vec!["x = 1\n".to_string()]);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(SourceFile::open(&dir.path().join("absent.py")).is_err());
    }

    #[test]
    fn test_backup_appends_suffix() {
        let path = Path::new("demo/script.py");
        assert_eq!(backup_path_for(path), PathBuf::from("demo/script.py.bak"));
    }

    #[test]
    fn test_backup_and_restore_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("script.py");
        let original = "def f():\n    return 1\n";
        fs::write(&path, original).unwrap();

        let mut source = SourceFile::open(&path).unwrap();
        source.create_backup().unwrap();

        // Mutate the working file a couple of times.
        source
            .write_lines(&["def f():\n".to_string(), "    return 2\n".to_string()])
            .unwrap();
        source.write_lines(&["broken\n".to_string()]).unwrap();

        assert!(restore_backup(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_restore_without_backup_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("script.py");
        fs::write(&path, "content\n").unwrap();

        assert!(!restore_backup(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "content\n");
    }
}
