//! Release asset resolution and upload

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ReleaseError, Result};
use crate::github::{ReleaseHandle, RepositoryHost};
use crate::glob::{expand, is_regular_file};

/// Expand asset patterns into regular files below `workdir`
///
/// Patterns are processed in order and each file is returned once, at
/// its first match. Directories matched by a pattern are skipped.
///
/// # Errors
///
/// * A pattern is invalid
/// * A directory below `workdir` cannot be read
pub fn resolve_asset_paths(patterns: &[String], workdir: &Path) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for pattern in patterns {
        for path in expand(pattern, workdir)? {
            let path = path?;
            if is_regular_file(&path) && seen.insert(path.clone()) {
                info!(pattern = %pattern, "✓ {}", display_relative(&path, workdir));
                paths.push(path);
            }
        }
    }

    Ok(paths)
}

/// MIME type for an asset, `application/octet-stream` when unknown
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Upload files one at a time, in order
///
/// # Returns
///
/// * `Vec<String>` - Uploaded asset names
///
/// # Errors
///
/// * A file cannot be read
/// * The host rejects an upload (later files are not attempted)
pub async fn upload_assets(
    host: &dyn RepositoryHost,
    release: &ReleaseHandle,
    paths: &[PathBuf],
) -> Result<Vec<String>> {
    let mut uploaded = Vec::with_capacity(paths.len());

    for path in paths {
        let name = asset_name(path);
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ReleaseError::filesystem(path, e))?;
        let content_type = content_type_for(path);

        host.upload_asset(release, &name, &content_type, data).await?;
        info!(%content_type, "Uploaded asset: {}", name);
        uploaded.push(name);
    }

    Ok(uploaded)
}

fn asset_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn display_relative(path: &Path, workdir: &Path) -> String {
    let base = std::path::absolute(workdir).unwrap_or_else(|_| workdir.to_path_buf());
    path.strip_prefix(&base)
        .unwrap_or(path)
        .display()
        .to_string()
}
