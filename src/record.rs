//! One benchmark run: the per-program timings from a timing file
//! plus the categorical metadata from its companion metadata file.

use std::collections::BTreeMap;

use kstring::KString;

/// One line of a timing file.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The per-run identifier with the timing suffix stripped
    pub program: KString,
    pub variance: f64,
    /// In seconds
    pub time: f64,
}

/// The recognized keys of a metadata file, in the spelling used in
/// the files.
pub const KEY_COMPILER: &str = "compiler";
pub const KEY_OPT_LEVEL: &str = "opt level";
pub const KEY_DATA_SIZE: &str = "data size";
pub const KEY_SOURCE: &str = "source";

/// The contents of a metadata file. Keys outside the recognized set
/// are kept in `other` but are not used for anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub compiler: Option<KString>,
    pub opt_level: Option<KString>,
    pub data_size: Option<KString>,
    pub source: Option<KString>,
    pub other: BTreeMap<KString, KString>,
}

impl Metadata {
    /// Returns the slot for a recognized key, `None` for any other
    /// key. Matching is case-sensitive.
    pub fn recognized_slot(&mut self, key: &str) -> Option<&mut Option<KString>> {
        match key {
            KEY_COMPILER => Some(&mut self.compiler),
            KEY_OPT_LEVEL => Some(&mut self.opt_level),
            KEY_DATA_SIZE => Some(&mut self.data_size),
            KEY_SOURCE => Some(&mut self.source),
            _ => None,
        }
    }
}

/// Immutable after ingestion. A `Record` built from a timing file
/// without a metadata file has all categorical fields `None` and can
/// never be returned by a lookup for a concrete key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    samples: Vec<Sample>,
    metadata: Metadata,
}

impl Record {
    /// `samples` must not mention a program twice (checked by the
    /// parser).
    pub fn new(samples: Vec<Sample>, metadata: Option<Metadata>) -> Self {
        Self {
            samples,
            metadata: metadata.unwrap_or_default(),
        }
    }

    /// The sentinel returned for lookups that match nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.metadata == Metadata::default()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn programs(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|s| s.program.as_str())
    }

    pub fn compiler(&self) -> Option<&str> {
        self.metadata.compiler.as_deref()
    }

    pub fn opt_level(&self) -> Option<&str> {
        self.metadata.opt_level.as_deref()
    }

    pub fn data_size(&self) -> Option<&str> {
        self.metadata.data_size.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.source.as_deref()
    }

    /// Whether this record is the run for the given key. Records
    /// without metadata never match.
    pub fn matches(&self, opt_level: &str, data_size: &str, source: &str) -> bool {
        self.opt_level() == Some(opt_level)
            && self.data_size() == Some(data_size)
            && self.source() == Some(source)
    }

    /// The time recorded for `program`, if it was benchmarked in this
    /// run.
    pub fn time_for(&self, program: &str) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.program.as_str() == program)
            .map(|s| s.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(program: &str, variance: f64, time: f64) -> Sample {
        Sample {
            program: KString::from_ref(program),
            variance,
            time,
        }
    }

    #[test]
    fn t_time_for() {
        let r = Record::new(vec![sample("foo", 0.01, 1.234)], None);
        assert_eq!(r.time_for("foo"), Some(1.234));
        assert_eq!(r.time_for("bar"), None);
        assert_eq!(r.time_for("fo"), None);
    }

    #[test]
    fn t_without_metadata_never_matches() {
        let r = Record::new(vec![sample("foo", 0.0, 1.0)], None);
        assert_eq!(r.source(), None);
        assert_eq!(r.opt_level(), None);
        assert_eq!(r.data_size(), None);
        assert_eq!(r.compiler(), None);
        assert!(!r.matches("", "", ""));
        assert!(!r.is_empty());
    }

    #[test]
    fn t_matches() {
        let mut m = Metadata::default();
        *m.recognized_slot(KEY_OPT_LEVEL).unwrap() = Some("O2".into());
        *m.recognized_slot(KEY_DATA_SIZE).unwrap() = Some("SMALL".into());
        *m.recognized_slot(KEY_SOURCE).unwrap() = Some("original".into());
        assert!(m.recognized_slot("Source").is_none());
        let r = Record::new(vec![], Some(m));
        assert!(r.matches("O2", "SMALL", "original"));
        assert!(!r.matches("O3", "SMALL", "original"));
        assert!(!r.matches("O2", "SMALL", "fission_manual"));
    }

    #[test]
    fn t_empty() {
        let e = Record::empty();
        assert!(e.is_empty());
        assert!(e.samples().is_empty());
        assert_eq!(e.time_for("anything"), None);
    }
}
