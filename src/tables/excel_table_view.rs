use std::{ffi::OsString, path::Path};

use anyhow::{anyhow, Context, Result};
use rust_xlsxwriter::{workbook::Workbook, Color, Format, FormatAlign};

use super::table_view::{ColumnFormatting, Highlight, TableView};

/// How many characters to add to the automatic column width
/// calculation to try to avoid setting widths too small to accomodate
/// the strings in the cells.
const WIDTH_SAFETY_MARGIN_CHARS: f64 = 2.0;

/// Excel's limit on worksheet name length, in characters.
const MAX_WORKSHEET_NAME_CHARS: usize = 31;

/// Excel rejects worksheet names that are too long, contain any of
/// `[]:*?/\`, or start or end with an apostrophe.
fn worksheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let truncated: String = replaced
        .trim_matches('\'')
        .chars()
        .take(MAX_WORKSHEET_NAME_CHARS)
        .collect();
    truncated.trim_end_matches('\'').to_string()
}

fn colnum(i: usize) -> Result<u16> {
    u16::try_from(i).with_context(|| anyhow!("too many columns for excel"))
}

/// One worksheet per table. Written to a temporary file first, then
/// renamed into place.
pub fn excel_file_write<'t>(
    tables: impl IntoIterator<Item = &'t (dyn TableView + 't)>,
    file: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();

    for table in tables {
        let worksheet = workbook.add_worksheet();
        let name = worksheet_name(&table.table_name());
        worksheet.set_name(&name).with_context(|| {
            anyhow!(
                "trying to use table name {:?} as worksheet name {name:?}",
                table.table_name()
            )
        })?;

        let formatting = table.column_formatting();
        // Our own max width tracking, in characters
        let mut column_widths: Vec<usize> = formatting.iter().map(|_| 1).collect();
        let mut rownum = 0;

        let title_format = Format::new().set_bold();
        for title_row in table.table_view_header() {
            for (i, val) in title_row.iter().enumerate() {
                if let Some(w) = column_widths.get_mut(i) {
                    *w = (*w).max(val.chars().count());
                }
                worksheet
                    .write_with_format(rownum, colnum(i)?, val.as_ref(), &title_format)
                    .with_context(|| anyhow!("write title value {val:?}"))?;
            }
            rownum += 1;
        }

        for row in table.table_view_body() {
            for (i, (val, highlight)) in row.iter().enumerate() {
                let mut format = Format::new();
                if formatting.get(i) == Some(&ColumnFormatting::Number) {
                    format = format.set_align(FormatAlign::Right);
                }
                match highlight {
                    Highlight::Neutral => (),
                    Highlight::Red => {
                        format = format.set_font_color(Color::Red);
                    }
                    Highlight::Green => {
                        format = format.set_background_color(Color::Green);
                    }
                }
                if let Some(w) = column_widths.get_mut(i) {
                    *w = (*w).max(val.chars().count());
                }
                worksheet
                    .write_with_format(rownum, colnum(i)?, val.as_ref(), &format)
                    .with_context(|| anyhow!("write value {val:?}"))?;
            }
            rownum += 1;
        }

        // Autofit works badly for our numbers (in LibreOffice, at
        // least), so use our own character counting.
        for (i, num_chars) in column_widths.iter().enumerate() {
            let width = *num_chars as f64 + WIDTH_SAFETY_MARGIN_CHARS;
            worksheet
                .set_column_width(colnum(i)?, width)
                .with_context(|| anyhow!("setting column width on column {i} to {width}"))?;
        }
    }

    let file_name = file
        .file_name()
        .ok_or_else(|| anyhow!("path misses a filename: {file:?}"))?;
    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let file_tmp = file.with_file_name(tmp_name);
    workbook
        .save(&file_tmp)
        .with_context(|| anyhow!("saving to file {file_tmp:?}"))?;
    std::fs::rename(&file_tmp, file)
        .with_context(|| anyhow!("renaming {file_tmp:?} to {file:?}"))?;

    Ok(())
}
