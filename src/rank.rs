//! Explicit orderings for categorical dimensions whose natural order
//! is not lexical (data sizes, source variants).

use std::cmp::Ordering;

use crate::config::UnknownRank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    /// ASCII case is ignored when looking up a value
    Insensitive,
}

/// A fixed list of known values, in rank order.
///
/// With `UnknownRank::SecondPosition`, a value that is not in the
/// list gets rank 1, i.e. it sorts *equal to the second known value*,
/// not after all of them. Existing reports were laid out with this
/// rule, so it is the default.
#[derive(Debug, Clone)]
pub struct RankTable {
    known: Vec<String>,
    case: CaseSensitivity,
    unknown: UnknownRank,
}

impl RankTable {
    pub fn new(known: Vec<String>, case: CaseSensitivity, unknown: UnknownRank) -> Self {
        Self {
            known,
            case,
            unknown,
        }
    }

    fn position(&self, value: &str) -> Option<usize> {
        self.known.iter().position(|k| match self.case {
            CaseSensitivity::Sensitive => k == value,
            CaseSensitivity::Insensitive => k.eq_ignore_ascii_case(value),
        })
    }

    pub fn rank(&self, value: &str) -> usize {
        self.position(value).unwrap_or(match self.unknown {
            UnknownRank::SecondPosition => 1,
            UnknownRank::Last => self.known.len(),
        })
    }

    /// Total order: by rank, then lexically (so that values of equal
    /// rank still come out in a reproducible order).
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.rank(a).cmp(&self.rank(b)).then_with(|| a.cmp(b))
    }

    pub fn sort<S: AsRef<str>>(&self, values: &mut [S]) {
        values.sort_by(|a, b| self.compare(a.as_ref(), b.as_ref()));
    }
}
