//! Terminal rendering of the audit log and PDF summaries

use std::fmt::Write as _;

use redacto_core::{AuditLog, PdfInfo, Theme};

const RESET: &str = "\x1b[0m";

/// ANSI color used for headings in each theme
fn accent(theme: Theme) -> Option<&'static str> {
    match theme {
        Theme::Cyber => Some("\x1b[32m"),
        Theme::Midnight => Some("\x1b[34m"),
        Theme::Amber => Some("\x1b[33m"),
        Theme::Light => None,
    }
}

fn heading(theme: Theme, text: &str) -> String {
    match accent(theme) {
        Some(color) => format!("{}{}{}", color, text, RESET),
        None => text.to_string(),
    }
}

/// Numbered table of detections with their approval marks
pub fn audit_log_table(log: &AuditLog, theme: Theme) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(
            theme,
            &format!(
                "{} detections, {} approved for redaction",
                log.len(),
                log.approved_count()
            )
        )
    );

    if log.is_empty() {
        let _ = writeln!(out, "  no sensitive content detected");
        return out;
    }

    let type_width = log
        .iter()
        .map(|e| e.entity_type.len())
        .max()
        .unwrap_or(0)
        .max("TYPE".len());

    let _ = writeln!(
        out,
        "  {:>4}  {:<3}  {:<width$}  {:>4}  TEXT",
        "#",
        "",
        "TYPE",
        "PAGE",
        width = type_width
    );
    for (i, entry) in log.iter().enumerate() {
        let mark = if entry.approved { "[x]" } else { "[ ]" };
        let _ = writeln!(
            out,
            "  {:>4}  {}  {:<width$}  {:>4}  {}",
            i + 1,
            mark,
            entry.entity_type,
            entry.page,
            entry.text_found,
            width = type_width
        );
    }
    out
}

/// One line per entity type, e.g. `PERSON: 3`
pub fn type_summary(log: &AuditLog) -> String {
    log.summary_by_type()
        .iter()
        .map(|(kind, count)| format!("{}: {}", kind, count))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn pdf_summary(info: &PdfInfo, theme: Theme) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading(theme, "Sanitized document"));
    let _ = writeln!(out, "  pages:     {}", info.page_count);
    let _ = writeln!(out, "  version:   {}", info.version);
    let _ = writeln!(out, "  size:      {} bytes", info.size_bytes);
    let _ = writeln!(out, "  encrypted: {}", if info.encrypted { "yes" } else { "no" });
    let metadata = if info.metadata_stripped() {
        "stripped".to_string()
    } else {
        let mut kept = Vec::new();
        if info.has_info_metadata {
            kept.push("info dictionary");
        }
        if info.has_xmp_metadata {
            kept.push("XMP stream");
        }
        format!("present ({})", kept.join(", "))
    };
    let _ = writeln!(out, "  metadata:  {}", metadata);
    out
}
