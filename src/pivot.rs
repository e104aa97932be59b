//! Cross-tabulation of records into a two-dimensional grid.
//!
//! The four categorical dimensions are linearized pairwise: data rows
//! are `programs × data_sizes` (`row = program_index * size_count +
//! size_index`), value columns are `opt_levels × sources`
//! (`column = opt_index * group_size + source_index`). The grid is
//! always complete: a configuration that was not measured yields a
//! placeholder cell, never a hole.

use crate::{
    catalog::Catalog, ingest::Repository, record::Record, time_format::TimeFormat,
};

pub const PROGRAM_LABEL: &str = "Program";
pub const DATA_SIZE_LABEL: &str = "Data size";

/// The number of leading label columns (program, data size) and of
/// header rows (opt level, source).
pub const LABEL_COLUMNS: usize = 2;
pub const HEADER_ROWS: usize = 2;

/// Point lookup of the record for one configuration.
pub trait Lookup {
    /// Must return an empty record, not fail, for configurations that
    /// do not exist.
    fn lookup(&self, opt_level: &str, data_size: &str, source: &str) -> &Record;
}

impl Lookup for Repository {
    fn lookup(&self, opt_level: &str, data_size: &str, source: &str) -> &Record {
        Repository::lookup(self, opt_level, data_size, source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKind {
    /// Cells are execution times
    Time,
    /// Cells are ratios baseline time / target time
    Speedup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Pre-formatted for display
    pub text: String,
    /// `None` only for missing times
    pub value: Option<f64>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeedupError {
    #[error("speedup requires timing at least two groups of programs, {found} found")]
    InsufficientSources { found: usize },
    #[error("timing results not found for baseline {baseline:?}")]
    BaselineNotFound { baseline: String },
    #[error("timing results not found for target {target:?} (other than the baseline)")]
    TargetNotFound { target: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub kind: GridKind,
    /// Set for speedup grids
    pub baseline: Option<String>,
    pub programs: Vec<String>,
    pub data_sizes: Vec<String>,
    pub opt_levels: Vec<String>,
    /// The sources within each column group
    pub column_sources: Vec<String>,
    /// `data_row_count()` rows of `value_column_count()` cells
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// Fill a grid by calling `cell` for every (program, data size,
    /// opt level, source) combination.
    fn build(
        kind: GridKind,
        baseline: Option<String>,
        catalog: &Catalog,
        column_sources: Vec<String>,
        mut cell: impl FnMut(&str, &str, &str, &str) -> Cell,
    ) -> Self {
        let mut grid = Grid {
            kind,
            baseline,
            programs: catalog.programs.clone(),
            data_sizes: catalog.data_sizes.clone(),
            opt_levels: catalog.opt_levels.clone(),
            column_sources,
            cells: Vec::new(),
        };
        let cols = grid.value_column_count();
        grid.cells = (0..grid.data_row_count())
            .map(|ri| {
                let (program, data_size) = grid.row_key(ri);
                (0..cols)
                    .map(|ci| {
                        let (opt_level, source) = grid.column_key(ci);
                        cell(program, data_size, opt_level, source)
                    })
                    .collect()
            })
            .collect();
        grid
    }

    pub fn column_group_size(&self) -> usize {
        self.column_sources.len()
    }

    pub fn value_column_count(&self) -> usize {
        self.opt_levels.len() * self.column_group_size()
    }

    pub fn data_row_count(&self) -> usize {
        self.programs.len() * self.data_sizes.len()
    }

    pub fn column_index(&self, opt_index: usize, source_index: usize) -> usize {
        opt_index * self.column_group_size() + source_index
    }

    pub fn row_index(&self, program_index: usize, size_index: usize) -> usize {
        program_index * self.data_sizes.len() + size_index
    }

    /// (opt level, source) of value column `ci`.
    pub fn column_key(&self, ci: usize) -> (&str, &str) {
        let group_size = self.column_group_size();
        let opt = &self.opt_levels[(ci / group_size) % self.opt_levels.len()];
        let source = &self.column_sources[ci % group_size];
        (opt, source)
    }

    /// (program, data size) of data row `ri`.
    pub fn row_key(&self, ri: usize) -> (&str, &str) {
        let size_count = self.data_sizes.len();
        (&self.programs[ri / size_count], &self.data_sizes[ri % size_count])
    }

    pub fn cell(&self, ri: usize, ci: usize) -> &Cell {
        &self.cells[ri][ci]
    }

    pub fn data_rows(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    /// The opt level row and the source row, each starting with the
    /// two label column headers.
    pub fn header_rows(&self) -> [Vec<String>; HEADER_ROWS] {
        let cols = self.value_column_count();
        let mut opts = vec![PROGRAM_LABEL.to_string(), DATA_SIZE_LABEL.to_string()];
        let mut sources = vec![String::new(), String::new()];
        for ci in 0..cols {
            let (opt, source) = self.column_key(ci);
            opts.push(opt.into());
            sources.push(source.into());
        }
        [opts, sources]
    }

    /// The two label cells of data row `ri`; the program is only
    /// shown on the first row of its block.
    pub fn row_labels(&self, ri: usize) -> [&str; LABEL_COLUMNS] {
        let (program, data_size) = self.row_key(ri);
        let first_of_block = ri % self.data_sizes.len() == 0;
        [if first_of_block { program } else { "" }, data_size]
    }

    /// All rows as display strings: the header rows, then the data
    /// rows with their labels.
    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = self.header_rows().into_iter().collect();
        for (ri, cells) in self.cells.iter().enumerate() {
            let mut row: Vec<String> = self.row_labels(ri).iter().map(|s| s.to_string()).collect();
            row.extend(cells.iter().map(|c| c.text.clone()));
            rows.push(row);
        }
        rows
    }

    /// True if all source labels are the same, i.e. the source header
    /// row carries no information.
    pub fn has_degenerate_source_row(&self) -> bool {
        self.column_sources.len() <= 1
    }

    /// The name used for sheets and titles.
    pub fn name(&self) -> String {
        match (&self.kind, &self.baseline) {
            (GridKind::Speedup, Some(baseline)) => format!("speedup over {baseline}"),
            _ => "time".into(),
        }
    }
}

/// The execution time of every program for every configuration.
/// Missing measurements show as the placeholder.
pub fn build_time_table(catalog: &Catalog, lookup: &impl Lookup, format: TimeFormat) -> Grid {
    Grid::build(
        GridKind::Time,
        None,
        catalog,
        catalog.sources.clone(),
        |program, data_size, opt_level, source| {
            let time = lookup.lookup(opt_level, data_size, source).time_for(program);
            Cell {
                text: format.time(time),
                value: time,
            }
        },
    )
}

/// `baseline_time / target_time`, or 0 where that is not defined.
pub fn speedup(baseline_time: Option<f64>, target_time: Option<f64>) -> f64 {
    match (baseline_time, target_time) {
        (Some(ts), Some(tp)) if tp > 0.0 => ts / tp,
        _ => 0.0,
    }
}

/// The speedup of every non-baseline source (or only `target`) over
/// `baseline`, per configuration. Fails without building anything if
/// the catalog has fewer than two sources or lacks the baseline or
/// target.
pub fn build_speedup_table(
    catalog: &Catalog,
    lookup: &impl Lookup,
    baseline: &str,
    target: Option<&str>,
    format: TimeFormat,
) -> Result<Grid, SpeedupError> {
    let found = catalog.sources.len();
    if found < 2 {
        return Err(SpeedupError::InsufficientSources { found });
    }
    if !catalog.sources.iter().any(|s| s == baseline) {
        return Err(SpeedupError::BaselineNotFound {
            baseline: baseline.into(),
        });
    }
    let column_sources: Vec<String> = catalog
        .sources
        .iter()
        .filter(|s| *s != baseline && target.map_or(true, |t| t == *s))
        .cloned()
        .collect();
    if let (Some(target), true) = (target, column_sources.is_empty()) {
        return Err(SpeedupError::TargetNotFound {
            target: target.into(),
        });
    }
    Ok(Grid::build(
        GridKind::Speedup,
        Some(baseline.into()),
        catalog,
        column_sources,
        |program, data_size, opt_level, source| {
            let ts = lookup.lookup(opt_level, data_size, baseline).time_for(program);
            let tp = lookup.lookup(opt_level, data_size, source).time_for(program);
            let value = speedup(ts, tp);
            Cell {
                text: format.ratio(value),
                value: Some(value),
            }
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::DimensionOrder,
        ingest::{parse_metadata_lines, parse_timing_lines},
    };

    fn record(opt: &str, size: &str, source: &str, timing: &str) -> Record {
        Record::new(
            parse_timing_lines(timing, "_time").unwrap(),
            Some(
                parse_metadata_lines(&format!(
                    "opt level: {opt}\ndata size: {size}\nsource: {source}"
                ))
                .unwrap(),
            ),
        )
    }

    fn repo() -> Repository {
        Repository::from_records(vec![
            record("O2", "SMALL", "original", "prog1_time 0.1 2.0\nprog2_time 0 3.0"),
            record("O2", "SMALL", "fission_manual", "prog1_time 0.05 1.0"),
            record("O3", "LARGE", "original", "prog1_time 0 8.0\nprog2_time 0 6.0"),
            record("O3", "LARGE", "fission_manual", "prog1_time 0 0.0\nprog2_time 0 2.0"),
            record("O3", "LARGE", "original_autopar", "prog2_time 0 4.0"),
        ])
    }

    fn fmt() -> TimeFormat {
        TimeFormat {
            millis: false,
            digits: 1,
        }
    }

    #[test]
    fn t_time_table_shape_and_order() {
        let repo = repo();
        let catalog = Catalog::derive(repo.records(), &DimensionOrder::default());
        let g = build_time_table(&catalog, &repo, fmt());
        let (p, d, o, s) = (2, 2, 2, 3);
        assert_eq!(g.data_row_count(), p * d);
        assert_eq!(g.value_column_count(), o * s);
        let rows = g.to_string_rows();
        assert_eq!(rows.len(), 2 + p * d);
        assert!(rows.iter().all(|r| r.len() == 2 + o * s));
        assert_eq!(
            rows[0],
            vec!["Program", "Data size", "O2", "O2", "O2", "O3", "O3", "O3"]
        );
        assert_eq!(
            rows[1],
            vec![
                "",
                "",
                "original",
                "original_autopar",
                "fission_manual",
                "original",
                "original_autopar",
                "fission_manual"
            ]
        );
        assert_eq!(
            rows[2],
            vec!["prog1", "SMALL", "2.0", "-", "1.0", "-", "-", "-"]
        );
        assert_eq!(rows[3], vec!["", "LARGE", "-", "-", "-", "8.0", "-", "0.0"]);
        assert_eq!(rows[4], vec!["prog2", "SMALL", "3.0", "-", "-", "-", "-", "-"]);
        assert_eq!(rows[5], vec!["", "LARGE", "-", "-", "-", "6.0", "4.0", "2.0"]);
    }

    #[test]
    fn t_index_arithmetic() {
        let repo = repo();
        let catalog = Catalog::derive(repo.records(), &DimensionOrder::default());
        let g = build_time_table(&catalog, &repo, fmt());
        for (oi, opt) in g.opt_levels.iter().enumerate() {
            for (si, source) in g.column_sources.iter().enumerate() {
                assert_eq!(g.column_key(g.column_index(oi, si)), (opt.as_str(), source.as_str()));
            }
        }
        for (pi, program) in g.programs.iter().enumerate() {
            for (di, size) in g.data_sizes.iter().enumerate() {
                assert_eq!(g.row_key(g.row_index(pi, di)), (program.as_str(), size.as_str()));
            }
        }
        let ri = g.row_index(1, 1);
        let ci = g.column_index(1, 1);
        assert_eq!(g.cell(ri, ci).value, Some(4.0));
    }

    #[test]
    fn t_speedup_law() {
        assert_eq!(speedup(Some(2.0), Some(1.0)), 2.0);
        assert_eq!(speedup(Some(1.0), Some(4.0)), 0.25);
        assert_eq!(speedup(Some(2.0), Some(0.0)), 0.0);
        assert_eq!(speedup(None, Some(1.0)), 0.0);
        assert_eq!(speedup(Some(1.0), None), 0.0);
        assert_eq!(speedup(None, None), 0.0);
    }

    #[test]
    fn t_speedup_table() {
        let repo = repo();
        let catalog = Catalog::derive(repo.records(), &DimensionOrder::default());
        let g = build_speedup_table(&catalog, &repo, "original", None, fmt()).unwrap();
        assert_eq!(g.value_column_count(), 2 * (3 - 1));
        assert_eq!(g.column_sources, vec!["original_autopar", "fission_manual"]);
        let rows = g.to_string_rows();
        assert_eq!(rows[0], vec!["Program", "Data size", "O2", "O2", "O3", "O3"]);
        // prog1/SMALL: 2.0 / 1.0 under (O2, fission_manual)
        assert_eq!(rows[2], vec!["prog1", "SMALL", "0.0", "2.0", "0.0", "0.0"]);
        // zero target time gives 0
        assert_eq!(rows[3], vec!["", "LARGE", "0.0", "0.0", "0.0", "0.0"]);
        assert_eq!(rows[5], vec!["", "LARGE", "0.0", "0.0", "1.5", "3.0"]);
        assert_eq!(g.name(), "speedup over original");
    }

    #[test]
    fn t_speedup_target() {
        let repo = repo();
        let catalog = Catalog::derive(repo.records(), &DimensionOrder::default());
        let g = build_speedup_table(&catalog, &repo, "original", Some("fission_manual"), fmt())
            .unwrap();
        assert_eq!(g.column_sources, vec!["fission_manual"]);
        assert_eq!(g.value_column_count(), 2);
        assert!(g.has_degenerate_source_row());
        assert_eq!(
            build_speedup_table(&catalog, &repo, "original", Some("original"), fmt()),
            Err(SpeedupError::TargetNotFound {
                target: "original".into()
            })
        );
    }

    #[test]
    fn t_speedup_preconditions() {
        let repo = Repository::from_records(vec![record(
            "O2",
            "SMALL",
            "original",
            "prog1_time 0 1.0",
        )]);
        let catalog = Catalog::derive(repo.records(), &DimensionOrder::default());
        assert_eq!(
            build_speedup_table(&catalog, &repo, "original", None, fmt()),
            Err(SpeedupError::InsufficientSources { found: 1 })
        );
        let repo = self::repo();
        let catalog = Catalog::derive(repo.records(), &DimensionOrder::default());
        assert_eq!(
            build_speedup_table(&catalog, &repo, "seq", None, fmt()),
            Err(SpeedupError::BaselineNotFound {
                baseline: "seq".into()
            })
        );
    }

    #[test]
    fn t_speedup_does_not_change_inputs() {
        let repo = repo();
        let catalog = Catalog::derive(repo.records(), &DimensionOrder::default());
        let before = catalog.clone();
        let a = build_speedup_table(&catalog, &repo, "original", None, fmt()).unwrap();
        let _ = build_speedup_table(&catalog, &repo, "fission_manual", None, fmt()).unwrap();
        let b = build_speedup_table(&catalog, &repo, "original", None, fmt()).unwrap();
        assert_eq!(a, b);
        assert_eq!(catalog, before);
    }

    #[test]
    fn t_empty_catalog() {
        let repo = Repository::from_records(vec![]);
        let catalog = Catalog::derive(repo.records(), &DimensionOrder::default());
        let g = build_time_table(&catalog, &repo, fmt());
        assert_eq!(g.to_string_rows().len(), 2);
        assert_eq!(g.to_string_rows()[0], vec!["Program", "Data size"]);
    }
}
