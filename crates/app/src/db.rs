use std::path::{Path, PathBuf};

use thiserror::Error;

pub const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Error)]
pub enum DbUrlError {
    #[error("invalid --db value: {raw:?}")]
    Invalid { raw: String },
}

/// Where campaign progress lives, as given by `--db`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    /// In-memory database; the URL is passed to sqlx untouched.
    Memory(String),
    /// On-disk database at an absolute path, with any `?` connect options.
    File { path: PathBuf, options: Option<String> },
}

impl DbTarget {
    /// Accepts `sqlite://path`, `sqlite:path`, a bare path, or a memory URL.
    /// Relative paths resolve against the working directory.
    pub fn parse(raw: &str) -> Result<Self, DbUrlError> {
        let invalid = || DbUrlError::Invalid {
            raw: raw.to_string(),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }
        if trimmed == MEMORY_URL || trimmed.contains("mode=memory") {
            return Ok(Self::Memory(trimmed.to_string()));
        }

        let rest = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        let (path, options) = match rest.split_once('?') {
            Some((path, options)) => (path, Some(options.to_string())),
            None => (rest, None),
        };
        if path.is_empty() {
            return Err(invalid());
        }

        let path = Path::new(path);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(path)
        };
        Ok(Self::File { path, options })
    }

    /// URL handed to the storage layer.
    pub fn url(&self) -> String {
        match self {
            Self::Memory(url) => url.clone(),
            Self::File { path, options } => match options {
                Some(options) => format!("sqlite://{}?{options}", path.display()),
                None => format!("sqlite://{}", path.display()),
            },
        }
    }

    /// sqlx will not create a missing database file, so make it (and its
    /// directory) here. Existing files are left as they are.
    pub fn ensure_file(&self) -> std::io::Result<()> {
        let Self::File { path, .. } = self else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(drop)
    }
}
