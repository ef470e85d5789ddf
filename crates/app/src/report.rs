use cpscan_ocr::ScanResult;
use std::fmt::Write;

/// Marker for a field no strategy could recover. Deliberately distinct from
/// an empty string: blank means "recognized as nothing", this means "never
/// found".
const NOT_FOUND: &str = "not found";

const FIELDS: [&str; 5] = ["name", "cp", "hp", "stardust", "moves"];

/// Plain-text report for one scan, one field per line.
pub fn render(result: &ScanResult) -> String {
    let e = &result.extracted;
    let mut out = String::new();
    line(&mut out, "name", e.name.as_ref().map(|f| f.value.clone()));
    line(&mut out, "cp", e.cp.as_ref().map(|f| f.value.to_string()));
    line(&mut out, "hp", e.hp.as_ref().map(|f| f.value.to_string()));
    line(&mut out, "stardust", e.stardust.as_ref().map(|f| f.value.to_string()));
    let moves = if e.moves.is_empty() { None } else { Some(e.moves.join(", ")) };
    line(&mut out, "moves", moves);
    if let Some(verdict) = &result.verdict {
        let _ = writeln!(out, "check:     {verdict}");
    }
    let _ = writeln!(out, "confidence: {:.2}", e.confidence);
    if e.needs_review() {
        let _ = writeln!(out, "(low confidence — review the screenshot)");
    }
    out
}

/// Report for a failed scan: every field explicitly not found.
pub fn render_failure() -> String {
    let mut out = String::new();
    for field in FIELDS {
        line(&mut out, field, None);
    }
    out
}

fn line(out: &mut String, label: &str, value: Option<String>) {
    let shown = value.unwrap_or_else(|| NOT_FOUND.to_string());
    let _ = writeln!(out, "{label}:{:width$}{shown}", "", width = 10 - label.len().min(9));
}
