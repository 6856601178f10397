//! Shared presentation helpers: colors and root-relative path rendering.

use crate::tree::path::to_relative_key;
use owo_colors::OwoColorize;
use std::path::Path;

/// Line colors for report sections; plain text when disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Tone {
    Added,
    Removed,
    Modified,
    Failed,
    Plain,
}

impl Palette {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub(super) fn paint(&self, tone: Tone, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        match tone {
            Tone::Added => text.green().to_string(),
            Tone::Removed => text.blue().to_string(),
            Tone::Modified => text.red().to_string(),
            Tone::Failed => text.yellow().to_string(),
            Tone::Plain => text.to_string(),
        }
    }

    pub(super) fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Path relative to `root` with `/` separators, or the full path if it is not below it.
pub(super) fn display_path(root: &Path, path: &Path) -> String {
    to_relative_key(root, path).unwrap_or_else(|_| path.display().to_string())
}

/// A titled, sorted list of paths, omitted when empty.
pub(super) fn push_section<'a>(
    output: &mut String,
    palette: Palette,
    tone: Tone,
    title: &str,
    root: &Path,
    paths: impl IntoIterator<Item = &'a Path>,
) {
    let mut lines: Vec<String> = paths.into_iter().map(|p| display_path(root, p)).collect();
    if lines.is_empty() {
        return;
    }
    lines.sort();
    output.push_str(&palette.heading(&format!("{} ({}):", title, lines.len())));
    output.push('\n');
    for line in lines {
        output.push_str("  ");
        output.push_str(&palette.paint(tone, &line));
        output.push('\n');
    }
}
