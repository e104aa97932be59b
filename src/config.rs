//! Report configuration: what used to be process-global constants
//! (results directory, category orderings, chart styling) as one
//! value that is loaded once and passed down explicitly.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config_file::LoadConfigFile;

/// Where a value that is missing from a rank table is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownRank {
    /// Unknown values rank equal to the *second* known value. This is
    /// what the existing tables were produced with, and table layouts
    /// depend on it.
    #[default]
    SecondPosition,
    /// Unknown values rank after all known values.
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChartStyle {
    /// Bar fill colors, cycled per optimization level
    pub bar_colors: Vec<String>,
    pub panel_width: f64,
    pub panel_height: f64,
    /// Font size of axis labels and the y-axis title
    pub label_font_size: f64,
    /// Font size of tick labels
    pub tick_font_size: f64,
    /// Font size of the legend
    pub legend_font_size: f64,
    /// Fraction of a data-size slot covered by its group of bars
    pub group_width: f64,
    /// Draw a dashed line at speedup 1
    pub reference_line: bool,
    pub y_label: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            bar_colors: ["#005D80", "#009052", "#FEDB4D", "#E6793D", "#ff1744"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            panel_width: 320.0,
            panel_height: 240.0,
            label_font_size: 8.0,
            tick_font_size: 8.0,
            legend_font_size: 6.0,
            group_width: 0.8,
            reference_line: true,
            y_label: "Speedup".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReportConfig {
    /// Where to look for timing results when `--dir` is not given
    pub results_dir: PathBuf,
    /// Data size names, smallest to largest
    pub data_size_order: Vec<String>,
    /// Short chart labels for `data_size_order`, same length
    pub data_size_labels: Vec<String>,
    /// Source variants, in left-to-right table order
    pub source_order: Vec<String>,
    pub unknown_rank: UnknownRank,
    /// Files whose name contains this string are metadata files
    pub metadata_marker: String,
    /// Stripped from the per-run identifiers in timing files to get
    /// the program name
    pub timing_suffix: String,
    pub chart: ChartStyle,
}

impl Default for ReportConfig {
    fn default() -> Self {
        fn strings(s: &[&str]) -> Vec<String> {
            s.iter().map(|s| s.to_string()).collect()
        }
        Self {
            results_dir: "./results".into(),
            data_size_order: strings(&[
                "MINI",
                "SMALL",
                "MEDIUM",
                "LARGE",
                "EXTRALARGE",
                "STANDARD",
            ]),
            data_size_labels: strings(&["XS", "S", "M", "L", "XL", "STD"]),
            source_order: strings(&[
                "original",
                "original_autopar",
                "fission_autopar",
                "fission_manual",
            ]),
            unknown_rank: UnknownRank::default(),
            metadata_marker: "model".into(),
            timing_suffix: "_time".into(),
            chart: ChartStyle::default(),
        }
    }
}

impl ReportConfig {
    /// The compact chart label for a data size, or the name itself if
    /// it has none.
    pub fn data_size_label<'s>(&'s self, data_size: &'s str) -> &'s str {
        self.data_size_order
            .iter()
            .position(|s| s.eq_ignore_ascii_case(data_size))
            .and_then(|i| self.data_size_labels.get(i))
            .map(String::as_str)
            .unwrap_or(data_size)
    }
}

impl LoadConfigFile for ReportConfig {
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>> {
        Ok(Some(PathBuf::from("benchpivot")))
    }
}
