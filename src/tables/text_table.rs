//! Markdown and LaTeX tabular text. Every column is padded to its
//! widest cell so that the source text lines up.

use std::io::Write;

use anyhow::Result;
use itertools::Itertools;

use super::table_view::{plain_rows, TableView};

fn column_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let num_columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..num_columns)
        .map(|i| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn padded_cells<'r>(row: &'r [String], widths: &'r [usize]) -> impl Iterator<Item = String> + 'r {
    row.iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
}

/// `| a | b |` rows; a separator line follows the first row.
pub fn write_markdown(view: &dyn TableView, out: &mut impl Write) -> Result<()> {
    let rows = plain_rows(view);
    let widths = column_widths(&rows);
    for (i, row) in rows.iter().enumerate() {
        writeln!(out, "| {} |", padded_cells(row, &widths).join(" | "))?;
        if i == 0 {
            let bar = widths.iter().map(|w| "-".repeat(*w)).join(" | ");
            writeln!(out, "| {bar} |")?;
        }
    }
    Ok(())
}

/// Escape the characters that are special in LaTeX text mode and may
/// show up in program or source names.
fn tex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '_' | '&' | '%' | '$' | '#' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Rows for the body of a `tabular` environment: cells joined with
/// ` & `, each row ending in `\\`.
pub fn write_tex(view: &dyn TableView, out: &mut impl Write) -> Result<()> {
    let rows: Vec<Vec<String>> = plain_rows(view)
        .into_iter()
        .map(|row| row.iter().map(|cell| tex_escape(cell)).collect())
        .collect();
    let widths = column_widths(&rows);
    for row in &rows {
        writeln!(out, "{}\\\\", padded_cells(row, &widths).join(" & "))?;
    }
    Ok(())
}
