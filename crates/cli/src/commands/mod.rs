//! CLI subcommands.

pub mod inspect;
pub mod place_order;

use std::path::Path;

use gallery_checkout::Document;
use thiserror::Error;

/// Errors reading a page snapshot.
#[derive(Debug, Error)]
pub enum PageFileError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid JSON page snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML page snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Load a page snapshot, choosing the format by extension.
///
/// # Errors
///
/// Returns [`PageFileError`] when the file is unreadable or malformed.
pub fn load_page(path: &Path) -> Result<Document, PageFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| PageFileError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_page(&content, path)
}

fn parse_page(content: &str, path: &Path) -> Result<Document, PageFileError> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}
