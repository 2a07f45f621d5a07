//! Program loader for source files on disk

use regvm_core::{LoadError, Program, ProgramLoader};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Loads programs by path, optionally relative to a base directory
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    root: Option<PathBuf>,
}

impl FileLoader {
    /// Resolve ids as given (relative to the working directory)
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative ids against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }

    pub fn resolve(&self, id: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(id),
            None => PathBuf::from(id),
        }
    }

    /// Read a program directly from `path`
    pub fn load_path(path: impl AsRef<Path>) -> Result<Program, LoadError> {
        let path = path.as_ref();
        let id = path.display().to_string();
        let source = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoadError::NotFound(id.clone()),
            _ => LoadError::Io { id: id.clone(), source },
        })?;

        Ok(Program::from_source(id, &source))
    }
}

impl ProgramLoader for FileLoader {
    fn load(&self, id: &str) -> Result<Program, LoadError> {
        Self::load_path(self.resolve(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_existing_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "MOV R0 #1").unwrap();
        writeln!(file, "HALT").unwrap();

        let program = FileLoader::load_path(file.path()).unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.line(1), Some("HALT"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let loader = FileLoader::with_root(dir.path());

        match loader.load("absent.txt") {
            Err(LoadError::NotFound(id)) => assert!(id.ends_with("absent.txt")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = FileLoader::load_path(dir.path());
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_root_is_joined() {
        let loader = FileLoader::with_root("/srv/programs");
        assert_eq!(loader.resolve("a.txt"), PathBuf::from("/srv/programs/a.txt"));
        assert_eq!(FileLoader::new().resolve("a.txt"), PathBuf::from("a.txt"));
    }
}
