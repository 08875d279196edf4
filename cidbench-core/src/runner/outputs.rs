use std::fs;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use super::error::Result;

/// Reads one identifier per line. Blank lines and surrounding whitespace are skipped.
pub fn read_identifiers(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Writes one identifier per line, replacing any existing file.
pub fn write_identifiers(path: &Path, ids: &[String]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(fs::File::create(path)?);
    for id in ids {
        writeln!(out, "{id}")?;
    }
    out.flush()?;
    Ok(())
}

/// Persists the identifiers produced by a run at most once.
///
/// An empty set never touches the file, so a run that produced nothing keeps the list
/// left by an earlier run.
#[derive(Debug)]
pub struct IdentifierSink {
    path: Option<PathBuf>,
}

impl IdentifierSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns `true` if this call wrote the file; later calls are no-ops.
    pub fn flush(&mut self, ids: &[String]) -> Result<bool> {
        let Some(path) = self.path.take() else {
            return Ok(false);
        };
        if ids.is_empty() {
            tracing::info!(path = %path.display(), "no identifiers produced, leaving file untouched");
            return Ok(false);
        }
        write_identifiers(&path, ids)?;
        tracing::info!(path = %path.display(), count = ids.len(), "identifiers written");
        Ok(true)
    }
}
