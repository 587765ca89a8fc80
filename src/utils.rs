//! Utility functions for output path construction

use std::path::{Path, PathBuf};

/// Character substituted for path separators in item names
const SEPARATOR_REPLACEMENT: char = '_';

/// Turn an item name into a filename stem that cannot escape the output directory
///
/// Path separators (`/` and `\`) and NUL are replaced with `_`; everything else
/// is kept, so distinct names may collide after sanitizing. An empty name
/// becomes `_` so the stem is never empty. Applying the function twice gives
/// the same result as applying it once.
///
/// # Examples
///
/// ```
/// use track_dl::utils::sanitize_file_stem;
///
/// assert_eq!(sanitize_file_stem("AC/DC - T.N.T."), "AC_DC - T.N.T.");
/// assert_eq!(sanitize_file_stem(r"Left\Right"), "Left_Right");
/// ```
#[must_use]
pub fn sanitize_file_stem(name: &str) -> String {
    if name.is_empty() {
        return SEPARATOR_REPLACEMENT.to_string();
    }

    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => SEPARATOR_REPLACEMENT,
            other => other,
        })
        .collect()
}

/// Build `<output_dir>/<sanitized name>.<extension>`
///
/// The extension is appended rather than set, so names containing dots
/// (`"T.N.T."`) keep every character of their stem.
#[must_use]
pub fn destination_path(output_dir: &Path, name: &str, extension: &str) -> PathBuf {
    let mut file_name = sanitize_file_stem(name);
    file_name.push('.');
    file_name.push_str(extension);
    output_dir.join(file_name)
}
