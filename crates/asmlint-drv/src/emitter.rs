//! Diagnostic rendering: human-readable text and machine-readable JSON.
//!
//! The textual format is one header line `level: message`, then for each
//! label a `--> path:line:col` location line (1-based), the source line
//! itself, and a caret underline whose width equals the *display* width
//! of the labelled range (East-Asian-wide characters underline as two
//! columns). Notes and helps follow as `note:` / `help:` lines.
//!
//! Cancelled diagnostics are skipped by both emitters.

use std::io::Write;

use anyhow::Result;
use asmlint_util::{Diagnostic, Label, Level, SourceMap};
use colored::Colorize;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

/// Render diagnostics as plain or colorized text
pub fn emit_text(
    source_map: &SourceMap,
    diagnostics: &[Diagnostic],
    out: &mut impl Write,
    color: bool,
) -> Result<()> {
    for diag in diagnostics {
        if diag.is_cancelled() {
            continue;
        }
        emit_one(source_map, diag, out, color)?;
    }
    Ok(())
}

fn emit_one(
    source_map: &SourceMap,
    diag: &Diagnostic,
    out: &mut impl Write,
    color: bool,
) -> Result<()> {
    writeln!(out, "{}: {}", format_level(diag.level, color), diag.message)?;

    if let Some(label) = &diag.primary_label {
        emit_label(source_map, label, out, color)?;
    }
    for label in &diag.secondary_labels {
        emit_label(source_map, label, out, color)?;
    }

    if let Some(note) = &diag.note {
        writeln!(out, "{}: {}", format_note_word(color), note)?;
    }
    if let Some(help) = &diag.help {
        writeln!(out, "{}: {}", format_help_word(color), help)?;
    }
    Ok(())
}

fn emit_label(
    source_map: &SourceMap,
    label: &Label,
    out: &mut impl Write,
    color: bool,
) -> Result<()> {
    let Some(file) = source_map.lookup_source_file(label.span.lo) else {
        return Ok(());
    };
    let line_idx = file.line_index(label.span.lo);
    let col_idx = file.column_index(label.span.lo);
    let line_content = file.line(line_idx);

    writeln!(
        out,
        "  --> {}:{}:{}",
        file.path().display(),
        line_idx + 1,
        col_idx + 1
    )?;
    writeln!(out, "   {} | {}", line_idx + 1, line_content)?;

    // caret underline sized by display width over the labelled bytes
    let line_start = file.line_start(line_idx);
    let offset_in_line = ((label.span.lo - file.start_pos()) - line_start).min(line_content.len());
    let end_in_line = (label.span.hi - file.start_pos())
        .saturating_sub(line_start)
        .min(line_content.len())
        .max(offset_in_line);
    let before = &line_content[..offset_in_line];
    let covered = &line_content[offset_in_line..end_in_line];

    let pad = UnicodeWidthStr::width(before);
    let width = UnicodeWidthStr::width(covered).max(1);
    let carets = "^".repeat(width);
    let carets = if color {
        carets.red().bold().to_string()
    } else {
        carets
    };
    writeln!(out, "     | {}{}", " ".repeat(pad), carets)?;

    if !label.message.is_empty() {
        writeln!(out, "     = {}", label.message)?;
    }
    Ok(())
}

fn format_level(level: Level, color: bool) -> String {
    if !color {
        return level.to_string();
    }
    match level {
        Level::Error => level.to_string().red().bold().to_string(),
        Level::Warning => level.to_string().yellow().bold().to_string(),
        Level::Note => level.to_string().cyan().bold().to_string(),
    }
}

fn format_note_word(color: bool) -> String {
    if color {
        "note".cyan().bold().to_string()
    } else {
        "note".to_string()
    }
}

fn format_help_word(color: bool) -> String {
    if color {
        "help".cyan().bold().to_string()
    } else {
        "help".to_string()
    }
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonLabel {
    file: String,
    line: usize,
    col: usize,
    span: [usize; 2],
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDiagnostic {
    level: String,
    code: &'static str,
    message: String,
    primary_label: Option<JsonLabel>,
    secondary_labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

fn json_label(source_map: &SourceMap, label: &Label) -> JsonLabel {
    let (file, line, col) = match source_map.lookup_source_file(label.span.lo) {
        Some(file) => {
            let line = file.line_index(label.span.lo) + 1;
            let col = file.column_index(label.span.lo) + 1;
            (file.path().display().to_string(), line, col)
        }
        None => (String::new(), 0, 0),
    };
    JsonLabel {
        file,
        line,
        col,
        span: [label.span.lo, label.span.hi],
        message: label.message.clone(),
    }
}

/// Render diagnostics as a JSON array
pub fn emit_json(
    source_map: &SourceMap,
    diagnostics: &[Diagnostic],
    out: &mut impl Write,
) -> Result<()> {
    let payload: Vec<JsonDiagnostic> = diagnostics
        .iter()
        .filter(|d| !d.is_cancelled())
        .map(|d| JsonDiagnostic {
            level: d.level.to_string(),
            code: d.code.name(),
            message: d.message.clone(),
            primary_label: d.primary_label.as_ref().map(|l| json_label(source_map, l)),
            secondary_labels: d
                .secondary_labels
                .iter()
                .map(|l| json_label(source_map, l))
                .collect(),
            note: d.note.clone(),
            help: d.help.clone(),
        })
        .collect();
    serde_json::to_writer(out, &payload)?;
    Ok(())
}
