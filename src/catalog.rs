//! The distinct values of each categorical dimension of a record
//! set, in table order.

use std::collections::BTreeSet;

use crate::{
    config::ReportConfig,
    rank::{CaseSensitivity, RankTable},
    record::Record,
};

/// The orderings used by `Catalog::derive`.
#[derive(Debug, Clone)]
pub struct DimensionOrder {
    pub data_sizes: RankTable,
    pub sources: RankTable,
}

impl DimensionOrder {
    /// Data sizes are matched ignoring ASCII case, sources exactly.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            data_sizes: RankTable::new(
                config.data_size_order.clone(),
                CaseSensitivity::Insensitive,
                config.unknown_rank,
            ),
            sources: RankTable::new(
                config.source_order.clone(),
                CaseSensitivity::Sensitive,
                config.unknown_rank,
            ),
        }
    }
}

impl Default for DimensionOrder {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

/// Every program appears in some record's samples, every other value
/// as a (non-missing) field of some record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Lexical
    pub programs: Vec<String>,
    /// By the data size rank table
    pub data_sizes: Vec<String>,
    /// Lexical
    pub opt_levels: Vec<String>,
    /// By the source rank table
    pub sources: Vec<String>,
}

impl Catalog {
    pub fn derive<'r>(records: impl IntoIterator<Item = &'r Record>, order: &DimensionOrder) -> Self {
        let mut programs = BTreeSet::new();
        let mut data_sizes = BTreeSet::new();
        let mut opt_levels = BTreeSet::new();
        let mut sources = BTreeSet::new();
        for record in records {
            programs.extend(record.programs());
            data_sizes.extend(record.data_size());
            opt_levels.extend(record.opt_level());
            sources.extend(record.source());
        }

        let owned = |set: BTreeSet<&str>| -> Vec<String> {
            set.into_iter().map(str::to_string).collect()
        };
        let mut data_sizes = owned(data_sizes);
        order.data_sizes.sort(&mut data_sizes);
        let mut sources = owned(sources);
        order.sources.sort(&mut sources);

        Self {
            programs: owned(programs),
            data_sizes,
            opt_levels: owned(opt_levels),
            sources,
        }
    }

    /// Keep only the programs in `allowed`, in the existing order.
    pub fn retain_programs(&mut self, allowed: &[String]) {
        self.programs.retain(|p| allowed.contains(p));
    }

    /// The column groups of a pivot grid: `opt_levels × sources`.
    pub fn column_count(&self) -> usize {
        self.opt_levels.len() * self.sources.len()
    }

    /// The data rows of a pivot grid: `programs × data_sizes`.
    pub fn row_count(&self) -> usize {
        self.programs.len() * self.data_sizes.len()
    }
}
