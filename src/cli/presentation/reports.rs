//! Report formatters for update, verify, status and import.

use super::shared::{display_path, push_section, Palette, Tone};
use crate::import::ImportReport;
use crate::reconcile::{ChangeReport, EntryFailure, StatusReport};
use crate::store::EntryStore;
use crate::verify::VerifyReport;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn push_failures(output: &mut String, palette: Palette, root: &Path, failures: &[EntryFailure]) {
    if failures.is_empty() {
        return;
    }
    let mut failures: Vec<&EntryFailure> = failures.iter().collect();
    failures.sort_by(|a, b| a.path.cmp(&b.path));
    output.push_str(&palette.heading(&format!("Failed ({}):", failures.len())));
    output.push('\n');
    for failure in failures {
        let line = format!("{}: {}", display_path(root, &failure.path), failure.message);
        output.push_str("  ");
        output.push_str(&palette.paint(Tone::Failed, &line));
        output.push('\n');
    }
}

fn paths(list: &[PathBuf]) -> impl Iterator<Item = &Path> {
    list.iter().map(PathBuf::as_path)
}

/// Output for `init` and `update`.
pub fn format_change_report(report: &ChangeReport, root: &Path, palette: Palette) -> String {
    let mut output = String::new();
    push_section(&mut output, palette, Tone::Added, "Added", root, paths(&report.added));
    push_section(&mut output, palette, Tone::Removed, "Removed", root, paths(&report.removed));
    push_section(&mut output, palette, Tone::Modified, "Modified", root, paths(&report.modified));
    push_failures(&mut output, palette, root, &report.failed);

    if report.is_clean() && report.failed.is_empty() {
        output.push_str("No changes.");
    } else {
        output.push_str(&format!(
            "{} added, {} removed, {} modified, {} failed",
            report.added.len(),
            report.removed.len(),
            report.modified.len(),
            report.failed.len()
        ));
    }
    output
}

/// Output for `verify`. With `verbose`, intact entries are listed too.
pub fn format_verify_report(
    report: &VerifyReport,
    store: &EntryStore,
    root: &Path,
    verbose: bool,
    palette: Palette,
) -> String {
    let mut output = String::new();
    if verbose {
        let flagged: HashSet<&Path> = paths(&report.modified)
            .chain(paths(&report.removed))
            .chain(report.failed.iter().map(|f| f.path.as_path()))
            .collect();
        let intact = store
            .keys()
            .map(PathBuf::as_path)
            .filter(|path| !flagged.contains(path));
        push_section(&mut output, palette, Tone::Plain, "OK", root, intact);
    }
    push_section(&mut output, palette, Tone::Modified, "Modified", root, paths(&report.modified));
    push_section(&mut output, palette, Tone::Removed, "Removed", root, paths(&report.removed));
    push_failures(&mut output, palette, root, &report.failed);

    if report.is_clean() {
        output.push_str(&format!("Verified {} entries: all OK.", report.checked));
    } else {
        output.push_str(&format!(
            "Verified {} entries: {} modified, {} removed, {} failed",
            report.checked,
            report.modified.len(),
            report.removed.len(),
            report.failed.len()
        ));
    }
    output
}

/// Output for `status`.
pub fn format_status_report(report: &StatusReport, root: &Path, palette: Palette) -> String {
    let mut output = String::new();
    push_section(&mut output, palette, Tone::Added, "Untracked", root, paths(&report.untracked));
    push_section(&mut output, palette, Tone::Removed, "Missing", root, paths(&report.missing));
    push_section(&mut output, palette, Tone::Modified, "Changed", root, paths(&report.changed));
    push_failures(&mut output, palette, root, &report.failed);

    let drift = report.untracked.len() + report.missing.len() + report.changed.len();
    if drift == 0 && report.failed.is_empty() {
        output.push_str("Up to date.");
    } else {
        output.push_str(&format!(
            "{} untracked, {} missing, {} changed",
            report.untracked.len(),
            report.missing.len(),
            report.changed.len()
        ));
    }
    output
}

/// Output for `import`.
pub fn format_import_report(report: &ImportReport, root: &Path, palette: Palette) -> String {
    let mut output = String::new();
    push_section(&mut output, palette, Tone::Added, "Imported", root, paths(&report.imported));
    if !report.skipped.is_empty() {
        output.push_str(&palette.heading(&format!("Skipped ({}):", report.skipped.len())));
        output.push('\n');
        for skip in &report.skipped {
            let line = format!(
                "line {}: {} ({})",
                skip.line,
                display_path(root, &skip.path),
                skip.reason
            );
            output.push_str("  ");
            output.push_str(&palette.paint(Tone::Failed, &line));
            output.push('\n');
        }
    }
    output.push_str(&format!(
        "{} imported, {} skipped",
        report.imported.len(),
        report.skipped.len()
    ));
    output
}
