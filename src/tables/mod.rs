//! Rendering of pivot grids: text tables (Markdown, LaTeX, terminal,
//! TSV), Excel workbooks and SVG charts.

pub mod chart;
pub mod excel_table_view;
pub mod table_view;
pub mod terminal_table;
pub mod text_table;
