//! Resolving the document under test to a navigable URL

use std::path::Path;
use url::Url;

use crate::error::{PageCheckError, PageCheckResult};

const PASSTHROUGH_SCHEMES: [&str; 3] = ["http", "https", "file"];

/// Turn a path or URL into something the browser can navigate to.
///
/// URLs with a web or file scheme are used as-is. Anything else is treated as
/// a filesystem path relative to `base_dir` and must exist.
pub fn resolve(target: &str, base_dir: &Path) -> PageCheckResult<Url> {
    let target = target.trim();
    if target.is_empty() {
        return Err(PageCheckError::InvalidTarget("empty target".to_string()));
    }

    if let Ok(url) = Url::parse(target) {
        if PASSTHROUGH_SCHEMES.contains(&url.scheme()) {
            return Ok(url);
        }
    }

    let path = base_dir.join(target);
    let path = path.canonicalize().map_err(|e| {
        PageCheckError::InvalidTarget(format!("{}: {}", path.display(), e))
    })?;

    if !path.is_file() {
        return Err(PageCheckError::InvalidTarget(format!(
            "{} is not a file",
            path.display()
        )));
    }

    Url::from_file_path(&path).map_err(|_| {
        PageCheckError::InvalidTarget(format!("cannot build file URL for {}", path.display()))
    })
}
