//! Collaborators for running the editor from the command line.

use std::io;
use std::path::PathBuf;

use multicode_core::{Blob, ErrorNotifier, FileSaver};

/// Saves files into one directory.
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSaver for DirectorySaver {
    fn save(&mut self, blob: Blob, file_name: &str) -> io::Result<()> {
        if file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to save outside {}: {file_name}", self.dir.display()),
            ));
        }
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, blob.content)?;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Reports user-facing errors through the log.
pub struct LogNotifier;

impl ErrorNotifier for LogNotifier {
    fn alert_error(&mut self, message: &str) {
        tracing::error!("{}", message);
    }
}
