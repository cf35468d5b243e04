//! Processing environment: file output, diagnostics and options
//!
//! Extensions reach the outside world only through a `ProcessingEnv`, the
//! same one the processor writes generated classes with.

use crate::diagnostics::{Messager, SourceLocation};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File creation errors
#[derive(Error, Debug)]
pub enum FilerError {
    #[error("Source file already created: {0}")]
    AlreadyExists(String),

    #[error("IO error writing {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Creates generated source files
pub trait Filer {
    /// Create the source file for `qualified_name`. `origin` is the
    /// declaration the file was generated for.
    fn create_source_file(
        &self,
        qualified_name: &str,
        source: &str,
        origin: &SourceLocation,
    ) -> Result<(), FilerError>;
}

/// Keeps generated files in memory, in creation order
#[derive(Debug, Default)]
pub struct InMemoryFiler {
    files: RefCell<Vec<(String, String)>>,
}

impl InMemoryFiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, qualified_name: &str) -> Option<String> {
        self.files
            .borrow()
            .iter()
            .find(|(n, _)| n == qualified_name)
            .map(|(_, s)| s.clone())
    }

    /// Qualified names of created files, in creation order
    pub fn names(&self) -> Vec<String> {
        self.files.borrow().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

impl Filer for InMemoryFiler {
    fn create_source_file(
        &self,
        qualified_name: &str,
        source: &str,
        _origin: &SourceLocation,
    ) -> Result<(), FilerError> {
        let mut files = self.files.borrow_mut();
        if files.iter().any(|(n, _)| n == qualified_name) {
            return Err(FilerError::AlreadyExists(qualified_name.to_string()));
        }
        files.push((qualified_name.to_string(), source.to_string()));
        Ok(())
    }
}

/// Writes `<root>/<package path>/<Name>.java`
#[derive(Debug)]
pub struct FsFiler {
    root: PathBuf,
    created: RefCell<HashSet<String>>,
}

impl FsFiler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            created: RefCell::new(HashSet::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output path for a qualified class name
    pub fn path_for(&self, qualified_name: &str) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments: Vec<&str> = qualified_name.split('.').collect();
        let file = segments.pop().unwrap_or(qualified_name);
        for segment in segments {
            path.push(segment);
        }
        path.push(format!("{}.java", file));
        path
    }
}

impl Filer for FsFiler {
    fn create_source_file(
        &self,
        qualified_name: &str,
        source: &str,
        _origin: &SourceLocation,
    ) -> Result<(), FilerError> {
        if !self.created.borrow_mut().insert(qualified_name.to_string()) {
            return Err(FilerError::AlreadyExists(qualified_name.to_string()));
        }
        let path = self.path_for(qualified_name);
        let io = |source| FilerError::Io {
            name: qualified_name.to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        std::fs::write(&path, source).map_err(io)?;
        tracing::info!(path = %path.display(), "wrote generated source");
        Ok(())
    }
}

/// What extensions and the processor can reach outside the model
pub trait ProcessingEnv {
    fn messager(&self) -> &dyn Messager;
    fn filer(&self) -> &dyn Filer;
    /// Processor options, passed through uninterpreted
    fn options(&self) -> &BTreeMap<String, String>;
}

/// A `ProcessingEnv` over concrete collaborators
#[derive(Debug, Default)]
pub struct Env<M, F> {
    pub messager: M,
    pub filer: F,
    pub options: BTreeMap<String, String>,
}

impl<M: Messager, F: Filer> Env<M, F> {
    pub fn new(messager: M, filer: F) -> Self {
        Self {
            messager,
            filer,
            options: BTreeMap::new(),
        }
    }

    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }
}

impl<M: Messager, F: Filer> ProcessingEnv for Env<M, F> {
    fn messager(&self) -> &dyn Messager {
        &self.messager
    }

    fn filer(&self) -> &dyn Filer {
        &self.filer
    }

    fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_filer_rejects_duplicates() {
        let filer = InMemoryFiler::new();
        let origin = SourceLocation::new("p.Baz");
        filer.create_source_file("p.A", "class A {}", &origin).unwrap();
        let err = filer.create_source_file("p.A", "class A {}", &origin).unwrap_err();
        assert!(matches!(err, FilerError::AlreadyExists(ref n) if n == "p.A"));
        assert_eq!(filer.names(), vec!["p.A".to_string()]);
    }

    #[test]
    fn test_fs_filer_writes_package_path() {
        let dir = tempfile::tempdir().unwrap();
        let filer = FsFiler::new(dir.path());
        filer
            .create_source_file("foo.bar.Side_Baz", "class Side_Baz {}", &SourceLocation::new("x"))
            .unwrap();
        let written =
            std::fs::read_to_string(dir.path().join("foo").join("bar").join("Side_Baz.java"))
                .unwrap();
        assert_eq!(written, "class Side_Baz {}");
    }
}
