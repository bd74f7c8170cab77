//! Plain-text attendance table.

use std::fmt::Write;

use crate::api::AttendanceRecord;
use crate::timestamp::display_time;

pub const EMPTY_TABLE_TEXT: &str = "No attendance records yet.";

/// Render records as a `# | Name | Time` table with IST times.
pub fn render_attendance_table(records: &[AttendanceRecord]) -> String {
    if records.is_empty() {
        return EMPTY_TABLE_TEXT.to_string();
    }

    let rows: Vec<(String, &str, String)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| ((i + 1).to_string(), r.name.as_str(), display_time(&r.time)))
        .collect();

    let idx_w = rows.iter().map(|r| r.0.len()).max().unwrap_or(1).max(1);
    let name_w = rows
        .iter()
        .map(|r| r.1.chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<idx_w$}  {:<name_w$}  Time", "#", "Name");
    let _ = writeln!(
        out,
        "{}  {}  {}",
        "-".repeat(idx_w),
        "-".repeat(name_w),
        "-".repeat(20)
    );
    for (idx, name, time) in rows {
        let _ = writeln!(out, "{:<idx_w$}  {:<name_w$}  {}", idx, name, time);
    }
    out
}
