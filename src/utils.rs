//! Utility functions for file operations and path manipulation

use std::path::{Component, Path, PathBuf};

/// Bytes of the target name kept in its temporary sibling's name
const TEMP_PREFIX_BYTES: usize = 64;

/// Longest prefix of `text` within `max_bytes` that does not split a character
pub fn truncate_to_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Write `content` to `dir/name` through a temporary sibling and a rename
///
/// Creates `dir` when missing. Readers see either the old file or the complete
/// new one, never a partial write.
pub async fn write_atomic(dir: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let final_path = dir.join(name);
    // Short and deterministic: never longer than a valid name, and a retry reuses it
    let temp_path = dir.join(format!(".{}.tmp", truncate_to_boundary(name, TEMP_PREFIX_BYTES)));

    if let Err(e) = tokio::fs::write(&temp_path, content).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }
    if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(final_path)
}

/// Markdown link target for `target`, as seen from a file in `from_dir`
///
/// A target inside `from_dir` becomes relative to it; anything else is kept
/// as given. Components are joined with `/` on every platform.
pub fn link_path(from_dir: &Path, target: &Path) -> String {
    let relative = target.strip_prefix(from_dir).unwrap_or(target);
    relative
        .components()
        .filter_map(|component| match component {
            Component::CurDir => None,
            Component::RootDir => Some(String::new()),
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}
