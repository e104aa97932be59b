//! A representation of tables as title rows and body rows of strings
//! and formatting instructions, independent of serialisation format.

use std::borrow::Cow;

use crate::pivot::{Grid, GridKind, LABEL_COLUMNS};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Highlight {
    /// No special formatting, normal number display
    Neutral,
    /// "Bad"
    Red,
    /// "Good"
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnFormatting {
    /// Row labels: left-adjusted
    Label,
    /// Values are numbers: right-adjusted
    Number,
}

/// A full table. dyn compatible.
pub trait TableView {
    fn table_name(&self) -> Cow<str>;

    /// One or more title rows, each as long as a body row.
    fn table_view_header(&self) -> Vec<Vec<Cow<str>>>;

    fn column_formatting(&self) -> Vec<ColumnFormatting>;

    fn table_view_body<'s>(
        &'s self,
    ) -> Box<dyn Iterator<Item = Vec<(Cow<'s, str>, Highlight)>> + 's>;
}

/// Speedups noticeably above 1 are good, noticeably below bad; 0
/// means there was nothing to compare.
pub fn speedup_highlight(value: f64) -> Highlight {
    if value > 1.1 {
        Highlight::Green
    } else if value > 0.0 && value < 0.9 {
        Highlight::Red
    } else {
        Highlight::Neutral
    }
}

impl TableView for Grid {
    fn table_name(&self) -> Cow<str> {
        self.name().into()
    }

    /// Leaves out the source row if it carries no information.
    fn table_view_header(&self) -> Vec<Vec<Cow<str>>> {
        let [opts, sources] = self.header_rows();
        let mut header = vec![opts];
        if !self.has_degenerate_source_row() {
            header.push(sources);
        }
        header
            .into_iter()
            .map(|row| row.into_iter().map(Cow::Owned).collect())
            .collect()
    }

    fn column_formatting(&self) -> Vec<ColumnFormatting> {
        let mut v = vec![ColumnFormatting::Label; LABEL_COLUMNS];
        v.extend(std::iter::repeat(ColumnFormatting::Number).take(self.value_column_count()));
        v
    }

    fn table_view_body<'s>(
        &'s self,
    ) -> Box<dyn Iterator<Item = Vec<(Cow<'s, str>, Highlight)>> + 's> {
        Box::new(self.data_rows().iter().enumerate().map(move |(ri, cells)| {
            let mut row: Vec<(Cow<str>, Highlight)> = self
                .row_labels(ri)
                .into_iter()
                .map(|s| (Cow::Borrowed(s), Highlight::Neutral))
                .collect();
            for cell in cells {
                let highlight = match (self.kind, cell.value) {
                    (GridKind::Speedup, Some(value)) => speedup_highlight(value),
                    _ => Highlight::Neutral,
                };
                row.push((Cow::Borrowed(cell.text.as_str()), highlight));
            }
            row
        }))
    }
}

/// Header and body as plain strings, for writers that do not use
/// formatting.
pub fn plain_rows(view: &dyn TableView) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = view
        .table_view_header()
        .into_iter()
        .map(|row| row.into_iter().map(Cow::into_owned).collect())
        .collect();
    rows.extend(
        view.table_view_body()
            .map(|row| row.into_iter().map(|(s, _)| s.into_owned()).collect()),
    );
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_speedup_highlight() {
        assert_eq!(speedup_highlight(2.0), Highlight::Green);
        assert_eq!(speedup_highlight(1.0), Highlight::Neutral);
        assert_eq!(speedup_highlight(0.5), Highlight::Red);
        assert_eq!(speedup_highlight(0.0), Highlight::Neutral);
    }
}
