#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use compwatch::config::WORKSPACE_CONFIG_FILE;

/// Builder for an on-disk workspace in a temporary directory.
pub struct WorkspaceBuilder {
    config: String,
    files: Vec<(String, String)>,
}

impl WorkspaceBuilder {
    pub fn new() -> Self {
        Self {
            config: "{ components: [] }".to_string(),
            files: Vec::new(),
        }
    }

    /// Raw `workspace.jsonc` contents.
    pub fn config(mut self, jsonc: &str) -> Self {
        self.config = jsonc.to_string();
        self
    }

    pub fn file(mut self, relative: &str, contents: &str) -> Self {
        self.files.push((relative.to_string(), contents.to_string()));
        self
    }

    pub fn build(self) -> TestWorkspace {
        let dir = tempfile::tempdir().expect("failed to create temp workspace");
        let ws = TestWorkspace { dir };
        ws.write(WORKSPACE_CONFIG_FILE, &self.config);
        for (relative, contents) in &self.files {
            ws.write(relative, contents);
        }
        ws
    }
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A temporary workspace. Removed from disk when dropped.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Canonical root, matching what the registry resolves it to.
    pub fn root(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("temp workspace root should canonicalize")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn config_path(&self) -> PathBuf {
        self.path(WORKSPACE_CONFIG_FILE)
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(&path, contents).expect("failed to write workspace file");
        self.path(relative)
    }

    pub fn write_config(&self, jsonc: &str) -> PathBuf {
        self.write(WORKSPACE_CONFIG_FILE, jsonc)
    }

    pub fn remove_file(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::remove_file(&path).expect("failed to remove file");
        path
    }

    pub fn remove_dir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::remove_dir_all(&path).expect("failed to remove directory");
        path
    }

    pub fn exists(&self, relative: &str) -> bool {
        Path::new(&self.path(relative)).exists()
    }
}
