//! Per-run diagnostic log.
//!
//! When configured, each run truncates the file and appends one line per
//! stage, ending with the diagnostic trace. Write errors are ignored; the
//! log is a debugging aid.

use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DiagLog {
    path: Option<PathBuf>,
}

impl DiagLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Clear the previous run and write a header line.
    pub fn start(&self, header: &str) {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = std::fs::write(path, "");
            self.write(&format!("=== {} ===", header));
        }
    }

    pub fn write(&self, msg: &str) {
        if let Some(path) = &self.path {
            if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(f, "{}", msg);
            }
        }
    }
}
