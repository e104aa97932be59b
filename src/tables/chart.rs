//! Grouped bar charts of a speedup grid, written as standalone SVG.
//!
//! One figure per column source. Each figure has a panel per program
//! (at most 2 rows by 3 columns of them), and within a panel a group
//! of bars per data size with one bar per optimization level. All
//! panels share the y-range `[0, max(1, ceil(largest value))]`.

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};

use crate::{
    config::{ChartStyle, ReportConfig},
    pivot::{Grid, GridKind},
};

const MAX_PANEL_ROWS: usize = 2;
const MAX_PANEL_COLS: usize = 3;

// Space inside a panel around the plot area
const MARGIN_LEFT: f64 = 44.0;
const MARGIN_RIGHT: f64 = 10.0;
const MARGIN_TOP: f64 = 26.0;
const MARGIN_BOTTOM: f64 = 30.0;

const FALLBACK_COLOR: &str = "#888888";

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// (rows, cols) of the panel layout for `num_programs` programs.
pub fn panel_layout(num_programs: usize) -> (usize, usize) {
    (
        num_programs.min(MAX_PANEL_ROWS),
        num_programs.min(MAX_PANEL_COLS),
    )
}

/// Upper end of the shared y-range. Missing values count as 1.
pub fn y_max(grid: &Grid) -> f64 {
    let largest = grid
        .data_rows()
        .iter()
        .flatten()
        .map(|cell| cell.value.unwrap_or(1.0))
        .fold(f64::NEG_INFINITY, f64::max);
    if largest.is_finite() {
        largest.ceil().max(1.0)
    } else {
        1.0
    }
}

fn bar_color(style: &ChartStyle, i: usize) -> &str {
    if style.bar_colors.is_empty() {
        FALLBACK_COLOR
    } else {
        &style.bar_colors[i % style.bar_colors.len()]
    }
}

fn write_panel(
    svg: &mut String,
    grid: &Grid,
    config: &ReportConfig,
    source_index: usize,
    program_index: usize,
    origin: (f64, f64),
    y_max: f64,
) -> std::fmt::Result {
    let style = &config.chart;
    let (px, py) = origin;
    let plot_w = (style.panel_width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
    let plot_h = (style.panel_height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
    let left = px + MARGIN_LEFT;
    let top = py + MARGIN_TOP;
    let bottom = top + plot_h;
    let y_of = |v: f64| bottom - (v.clamp(0.0, y_max) / y_max) * plot_h;

    let program = &grid.programs[program_index];
    let num_sizes = grid.data_sizes.len().max(1);
    let num_bars = grid.opt_levels.len().max(1);
    let slot_w = plot_w / num_sizes as f64;
    let group_w = slot_w * style.group_width;
    let bar_w = group_w / num_bars as f64;

    writeln!(svg, "<g class=\"panel\">")?;

    // y axis with integer ticks
    writeln!(
        svg,
        "<line x1=\"{left:.1}\" y1=\"{top:.1}\" x2=\"{left:.1}\" y2=\"{bottom:.1}\" stroke=\"black\" stroke-width=\"0.8\"/>"
    )?;
    let tick_step = (y_max / 5.0).ceil().max(1.0);
    let mut tick = 0.0;
    while tick <= y_max {
        let y = y_of(tick);
        writeln!(
            svg,
            "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"black\" stroke-width=\"0.8\"/>",
            left - 3.0,
            left + 3.0
        )?;
        writeln!(
            svg,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"{}\">{tick}</text>",
            left - 5.0,
            y + style.tick_font_size / 3.0,
            style.tick_font_size
        )?;
        tick += tick_step;
    }
    let label_x = px + style.label_font_size + 2.0;
    let label_y = top + plot_h / 2.0;
    writeln!(
        svg,
        "<text x=\"{label_x:.1}\" y=\"{label_y:.1}\" text-anchor=\"middle\" font-size=\"{}\" transform=\"rotate(-90 {label_x:.1} {label_y:.1})\">{}</text>",
        style.label_font_size,
        xml_escape(&style.y_label)
    )?;

    if style.reference_line {
        let y = y_of(1.0);
        writeln!(
            svg,
            "<line class=\"reference\" x1=\"{left:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#777\" stroke-width=\"2\" stroke-dasharray=\"6,4\"/>",
            left + plot_w
        )?;
    }

    for (di, data_size) in grid.data_sizes.iter().enumerate() {
        let slot_center = left + (di as f64 + 0.5) * slot_w;
        let ri = grid.row_index(program_index, di);
        for oi in 0..grid.opt_levels.len() {
            let ci = grid.column_index(oi, source_index);
            let value = grid.cell(ri, ci).value.unwrap_or(0.0);
            let x = slot_center - group_w / 2.0 + oi as f64 * bar_w;
            let y = y_of(value);
            writeln!(
                svg,
                "<rect class=\"bar\" x=\"{x:.2}\" y=\"{y:.2}\" width=\"{bar_w:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"black\" stroke-width=\"0.35\"/>",
                bottom - y,
                bar_color(style, oi)
            )?;
        }
        writeln!(
            svg,
            "<text x=\"{slot_center:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"{}\">{}</text>",
            bottom + style.tick_font_size + 4.0,
            style.tick_font_size,
            xml_escape(config.data_size_label(data_size))
        )?;
    }

    writeln!(
        svg,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"{}\">{}</text>",
        left + plot_w / 2.0,
        bottom + style.tick_font_size + style.label_font_size + 10.0,
        style.label_font_size,
        xml_escape(program)
    )?;

    // legend of optimization levels, in one line above the plot area
    let legend_y = py + MARGIN_TOP / 2.0;
    let mut legend_x = left;
    for (oi, opt_level) in grid.opt_levels.iter().enumerate() {
        let size = style.legend_font_size;
        writeln!(
            svg,
            "<rect x=\"{legend_x:.1}\" y=\"{:.1}\" width=\"{size}\" height=\"{size}\" fill=\"{}\"/>",
            legend_y - size,
            bar_color(style, oi)
        )?;
        writeln!(
            svg,
            "<text x=\"{:.1}\" y=\"{legend_y:.1}\" font-size=\"{size}\">{}</text>",
            legend_x + size + 2.0,
            xml_escape(opt_level)
        )?;
        legend_x += size * (opt_level.chars().count() as f64 * 0.6 + 3.0);
    }

    writeln!(svg, "</g>")
}

fn write_document(
    svg: &mut String,
    grid: &Grid,
    config: &ReportConfig,
    source_index: usize,
    (rows, cols): (usize, usize),
    y_max: f64,
) -> std::fmt::Result {
    let style = &config.chart;
    let width = cols as f64 * style.panel_width;
    let height = rows as f64 * style.panel_height;
    writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" font-family=\"sans-serif\">"
    )?;
    writeln!(svg, "<rect width=\"{width}\" height=\"{height}\" fill=\"white\"/>")?;
    for p in 0..grid.programs.len().min(rows * cols) {
        let origin = (
            (p % cols) as f64 * style.panel_width,
            (p / cols) as f64 * style.panel_height,
        );
        write_panel(svg, grid, config, source_index, p, origin, y_max)?;
    }
    writeln!(svg, "</svg>")
}

/// The SVG document for the column source at `source_index`.
pub fn render_chart(grid: &Grid, config: &ReportConfig, source_index: usize) -> Result<String> {
    if grid.kind != GridKind::Speedup {
        bail!("charts are only drawn for speedup grids")
    }
    if source_index >= grid.column_sources.len() {
        bail!(
            "source index {source_index} out of range, grid has {} sources",
            grid.column_sources.len()
        )
    }
    let layout = panel_layout(grid.programs.len());
    let y_max = y_max(grid);

    let mut svg = String::new();
    write_document(&mut svg, grid, config, source_index, layout, y_max)
        .map_err(|e| anyhow!("formatting svg: {e}"))?;
    Ok(svg)
}

/// Write one chart per column source into `out_dir`, named
/// `<baseline>-<source>.svg`. Returns the paths written.
pub fn write_speedup_charts(grid: &Grid, config: &ReportConfig, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let baseline = grid
        .baseline
        .as_deref()
        .ok_or_else(|| anyhow!("charts need a speedup grid with a baseline"))?;
    let mut written = Vec::new();
    for (si, source) in grid.column_sources.iter().enumerate() {
        let svg = render_chart(grid, config, si)?;
        let path = out_dir.join(format!("{baseline}-{source}.svg"));
        std::fs::write(&path, svg).with_context(|| anyhow!("writing chart to {path:?}"))?;
        written.push(path);
    }
    Ok(written)
}
