//! Safe filename generation utilities

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Maximum length of a sanitized title, in characters
pub const MAX_TITLE_LEN: usize = 100;

/// Fallback stem when nothing survives sanitization
pub const FALLBACK_STEM: &str = "video";

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s-]").unwrap())
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Reduce a video title to a filename stem
///
/// Characters outside word characters, whitespace and `-` are removed, the
/// result is trimmed, whitespace runs become `_` and the stem is capped at
/// [`MAX_TITLE_LEN`] characters.
pub fn sanitize_title(title: &str) -> String {
    let stripped = disallowed_chars().replace_all(title, "");
    let collapsed = whitespace_runs().replace_all(stripped.trim(), "_");
    let stem: String = collapsed.chars().take(MAX_TITLE_LEN).collect();

    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

/// Convert a title to a safe filename with the given extension
pub fn to_safe_filename(title: &str, extension: &str) -> String {
    let stem = sanitize_title(title);
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, extension)
    }
}

/// Generate a unique filename by appending a number if the file already exists
pub fn generate_unique_filename(base_path: &Path, filename: &str) -> std::io::Result<String> {
    if !base_path.join(filename).exists() {
        return Ok(filename.to_string());
    }

    let path = Path::new(filename);
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    for counter in 1..=10_000 {
        let candidate = format!("{}_{}{}", stem, counter, extension);
        if !base_path.join(&candidate).exists() {
            return Ok(candidate);
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        "Too many files with similar names",
    ))
}
