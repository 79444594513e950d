use std::path::{Component, Path, PathBuf};

use thiserror::Error;

const PDF_EXTENSION: &str = "pdf";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path segment is empty")]
    Empty,
    #[error("staging path contains unsupported component: {0}")]
    UnsupportedComponent(String),
}

/// Turns a collection name or item title into a single path segment.
///
/// Names made only of dots (`.`, `..`) and the empty name would resolve to a
/// directory other than their own, so their dots become `_`.
pub fn segment_for(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    if name.chars().all(|c| c == '.') {
        return "_".repeat(name.len());
    }
    name.chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `<title>.pdf`, the name an attachment is staged and uploaded under.
pub fn pdf_filename(title: &str) -> String {
    format!("{}.{PDF_EXTENSION}", segment_for(title))
}

/// Joins remote (tablet) paths. Remote paths are always `/`-separated.
pub fn remote_join(parent: &str, name: &str) -> String {
    let segment = segment_for(name);
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        segment
    } else {
        format!("{parent}/{segment}")
    }
}

pub fn staging_path_for(staging_root: &Path, segment: &str) -> Result<PathBuf, PathError> {
    if segment.is_empty() {
        return Err(PathError::Empty);
    }

    let mut out = staging_root.to_path_buf();
    for component in Path::new(segment).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => continue,
            Component::RootDir | Component::ParentDir | Component::Prefix(_) => {
                return Err(PathError::UnsupportedComponent(segment.to_string()));
            }
        }
    }
    if out == staging_root {
        return Err(PathError::UnsupportedComponent(segment.to_string()));
    }
    Ok(out)
}
