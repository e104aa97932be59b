//! Print a `TableView` to a terminal in human-readable format (with
//! spaces for padding, and ANSI sequences for formatting), or as TSV.

//! Does not escape anything in the fields. Program and source names
//! containing tabs or newlines will make the TSV ambiguous.

use std::io::Write;

use anyhow::{bail, Result};
use strum_macros::EnumString;
use yansi::{Paint, Style};

use super::table_view::{ColumnFormatting, Highlight, TableView};

#[derive(Debug, EnumString, PartialEq, Clone, Copy)]
#[strum(serialize_all = "kebab_case")]
pub enum ColorOpt {
    Auto,
    Always,
    Never,
}

impl ColorOpt {
    pub fn want_color(self, detected_terminal: bool) -> bool {
        match self {
            ColorOpt::Auto => detected_terminal,
            ColorOpt::Always => true,
            ColorOpt::Never => false,
        }
    }
}

/// Column widths are fixed beforehand. The last column gets no
/// padding; a value wider than its column is still followed by one
/// space.
pub struct TerminalTable {
    widths: Vec<usize>,
    formatting: Vec<ColumnFormatting>,
    padding: String,
    /// Print with tab as separator, without ANSI codes and padding
    pub tsv_mode: bool,
    pub color: bool,
}

impl TerminalTable {
    /// `widths` must have one entry per column; the last one is only
    /// used for right-adjusting numbers.
    pub fn new(widths: &[usize], formatting: &[ColumnFormatting], tsv_mode: bool, color: bool) -> Self {
        let max_width = widths.iter().max().copied().unwrap_or(0);
        Self {
            widths: widths.to_owned(),
            formatting: formatting.to_owned(),
            padding: " ".repeat(max_width + 1),
            tsv_mode,
            color: color && !tsv_mode,
        }
    }

    fn write_row(
        &self,
        row: &[(&str, Highlight)],
        line_style: Option<Style>,
        out: &mut impl Write,
    ) -> Result<()> {
        if row.len() != self.widths.len() {
            bail!(
                "row has {} values but the table has {} columns",
                row.len(),
                self.widths.len()
            )
        }
        let last = row.len().saturating_sub(1);
        for (i, (width, (val, highlight))) in self.widths.iter().zip(row).enumerate() {
            if self.tsv_mode {
                if i > 0 {
                    out.write_all(b"\t")?;
                }
                out.write_all(val.as_bytes())?;
                continue;
            }

            let needed_padding = width.saturating_sub(val.chars().count());
            let right_adjust = self.formatting.get(i) == Some(&ColumnFormatting::Number);
            if right_adjust {
                out.write_all(self.padding[0..needed_padding].as_bytes())?;
            }
            let style = match (self.color, highlight, line_style) {
                (false, _, _) => None,
                (true, _, Some(style)) => Some(style),
                (true, Highlight::Green, None) => Some(Style::new().green()),
                (true, Highlight::Red, None) => Some(Style::new().red()),
                (true, Highlight::Neutral, None) => None,
            };
            match style {
                Some(style) => write!(out, "{}", val.paint(style))?,
                None => out.write_all(val.as_bytes())?,
            }
            if i < last {
                if !right_adjust {
                    out.write_all(self.padding[0..needed_padding].as_bytes())?;
                }
                out.write_all(b" ")?;
            }
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_title_row(&self, titles: &[&str], out: &mut impl Write) -> Result<()> {
        const STYLE: Style = Style::new().bold().italic();
        let row: Vec<_> = titles.iter().map(|t| (*t, Highlight::Neutral)).collect();
        self.write_row(&row, Some(STYLE), out)
    }

    pub fn write_data_row(&self, data: &[(&str, Highlight)], out: &mut impl Write) -> Result<()> {
        self.write_row(data, None, out)
    }
}

/// Write a whole table view, sizing the columns to fit.
pub fn write_terminal(
    view: &dyn TableView,
    tsv_mode: bool,
    color: bool,
    out: &mut impl Write,
) -> Result<()> {
    let header = view.table_view_header();
    let body: Vec<_> = view.table_view_body().collect();
    let num_columns = view.column_formatting().len();
    let mut widths = vec![0; num_columns];
    let all_cells = header
        .iter()
        .map(|row| row.iter().map(|s| s.as_ref()).collect::<Vec<&str>>())
        .chain(
            body.iter()
                .map(|row| row.iter().map(|(s, _)| s.as_ref()).collect()),
        );
    for row in all_cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let table = TerminalTable::new(&widths, &view.column_formatting(), tsv_mode, color);
    for title_row in &header {
        let titles: Vec<&str> = title_row.iter().map(|s| s.as_ref()).collect();
        table.write_title_row(&titles, out)?;
    }
    for row in &body {
        let data: Vec<(&str, Highlight)> = row.iter().map(|(s, h)| (s.as_ref(), *h)).collect();
        table.write_data_row(&data, out)?;
    }
    Ok(())
}
