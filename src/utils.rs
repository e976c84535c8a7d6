use std::path::{Component, Path, PathBuf};
use std::time::Duration;

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Returns at most `max_chars` characters of `text`, never splitting a char.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Joins an archive entry name under `root`, dropping `..`, root and prefix components.
///
/// Returns `None` when nothing usable is left of the name.
pub fn safe_entry_path(root: &Path, entry_name: &str) -> Option<PathBuf> {
    let relative: PathBuf = Path::new(entry_name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(root.join(relative))
    }
}
