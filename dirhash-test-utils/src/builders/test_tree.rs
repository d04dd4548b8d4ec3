//! Temporary directory trees

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for a directory tree inside a fresh temporary directory
#[derive(Debug, Default)]
pub struct TestTreeBuilder {
    files: Vec<(PathBuf, Vec<u8>)>,
    dirs: Vec<PathBuf>,
}

impl TestTreeBuilder {
    /// Create a new tree builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; parent directories are created as needed
    pub fn with_file(mut self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        self.files
            .push((relative.as_ref().to_path_buf(), content.as_ref().to_vec()));
        self
    }

    /// Add an (initially empty) directory
    pub fn with_dir(mut self, relative: impl AsRef<Path>) -> Self {
        self.dirs.push(relative.as_ref().to_path_buf());
        self
    }

    /// Add `count` files of `size` bytes spread over a few subdirectories
    ///
    /// Large enough trees keep a worker busy long enough to observe it running
    /// and to stop it part way.
    pub fn with_many_files(mut self, count: usize, size: usize) -> Self {
        for i in 0..count {
            let content: Vec<u8> = (0..size).map(|b| (b + i) as u8).collect();
            self.files
                .push((PathBuf::from(format!("d{:02}/f{i:05}.bin", i % 16)), content));
        }
        self
    }

    /// Materialize the tree
    pub fn build(self) -> io::Result<TestTree> {
        let tree = TestTree {
            dir: TempDir::new()?,
        };
        for dir in &self.dirs {
            fs::create_dir_all(tree.path().join(dir))?;
        }
        for (relative, content) in &self.files {
            tree.write(relative, content)?;
        }
        Ok(tree)
    }
}

/// A directory tree that is removed when dropped
#[derive(Debug)]
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    /// Root of the tree
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Root as a UTF-8 string, for the C interface
    pub fn path_str(&self) -> String {
        self.dir.path().display().to_string()
    }

    /// Create or overwrite a file
    pub fn write(&self, relative: impl AsRef<Path>, content: impl AsRef<[u8]>) -> io::Result<()> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    }

    pub fn remove(&self, relative: impl AsRef<Path>) -> io::Result<()> {
        fs::remove_file(self.path().join(relative))
    }

    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> io::Result<()> {
        fs::rename(self.path().join(from), self.path().join(to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_files_and_dirs() {
        let tree = TestTreeBuilder::new()
            .with_file("a.txt", "x")
            .with_file("sub/b.txt", "y")
            .with_dir("empty")
            .build()
            .unwrap();

        assert_eq!(fs::read(tree.path().join("a.txt")).unwrap(), b"x");
        assert_eq!(fs::read(tree.path().join("sub/b.txt")).unwrap(), b"y");
        assert!(tree.path().join("empty").is_dir());
    }

    #[test]
    fn test_mutations() {
        let tree = TestTreeBuilder::new()
            .with_file("a.txt", "x")
            .build()
            .unwrap();
        tree.rename("a.txt", "c.txt").unwrap();
        assert!(!tree.path().join("a.txt").exists());
        tree.remove("c.txt").unwrap();
        assert!(!tree.path().join("c.txt").exists());
    }

    #[test]
    fn test_many_files() {
        let tree = TestTreeBuilder::new().with_many_files(20, 8).build().unwrap();
        assert!(tree.path().join("d00/f00000.bin").is_file());
        assert!(tree.path().join("d03/f00019.bin").is_file());
    }
}
