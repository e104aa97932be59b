//! Reading a results directory into `Record`s.
//!
//! A results directory is flat and holds two kinds of files: timing
//! files with lines `<program>_time <variance> <time>`, and metadata
//! files (their name contains the metadata marker, "model" by
//! default) with lines `<key>: <value>`. Each timing file is paired
//! with at most one metadata file by file name, see `pair_files`.

use std::{
    collections::{hash_map::Entry, HashMap},
    fmt::Display,
    path::{Path, PathBuf},
};

use kstring::KString;
use walkdir::WalkDir;

use crate::{
    config::ReportConfig,
    debug, info,
    record::{Metadata, Record, Sample},
    warn,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    WrongTokenCount { found: usize },
    NotANumber { field: &'static str, token: String },
    DuplicateProgram { program: String },
    EmptyMetadataKey,
    DuplicateMetadataKey { key: String },
}

impl Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorKind::WrongTokenCount { found } => {
                write!(f, "expected 3 whitespace-separated fields, got {found}")
            }
            ParseErrorKind::NotANumber { field, token } => {
                write!(f, "{field} field is not a number: {token:?}")
            }
            ParseErrorKind::DuplicateProgram { program } => {
                write!(f, "program {program:?} is listed more than once")
            }
            ParseErrorKind::EmptyMetadataKey => write!(f, "empty key before ':'"),
            ParseErrorKind::DuplicateMetadataKey { key } => {
                write!(f, "key {key:?} is given more than once")
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path:?}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        /// 1-based
        line: usize,
        reason: ParseErrorKind,
    },
}

/// Line-level parse failure, before the file path is known.
type LineError = (usize, ParseErrorKind);

/// Parse the contents of a timing file. Blank lines are skipped,
/// every other line must have exactly 3 fields.
pub fn parse_timing_lines(content: &str, timing_suffix: &str) -> Result<Vec<Sample>, LineError> {
    let mut samples: Vec<Sample> = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let linenum = i + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let &[id, variance, time] = tokens.as_slice() else {
            if tokens.is_empty() {
                continue;
            }
            return Err((
                linenum,
                ParseErrorKind::WrongTokenCount {
                    found: tokens.len(),
                },
            ));
        };
        let number = |field: &'static str, token: &str| -> Result<f64, LineError> {
            token.parse().map_err(|_| {
                (
                    linenum,
                    ParseErrorKind::NotANumber {
                        field,
                        token: token.to_string(),
                    },
                )
            })
        };
        let variance = number("variance", variance)?;
        let time = number("time", time)?;
        let program = id.strip_suffix(timing_suffix).unwrap_or(id);
        if samples.iter().any(|s| s.program.as_str() == program) {
            return Err((
                linenum,
                ParseErrorKind::DuplicateProgram {
                    program: program.to_string(),
                },
            ));
        }
        samples.push(Sample {
            program: KString::from_ref(program),
            variance,
            time,
        });
    }
    Ok(samples)
}

/// Parse the contents of a metadata file into the fixed metadata
/// shape. Lines without a colon are ignored; key and value are split
/// at the first colon and trimmed.
pub fn parse_metadata_lines(content: &str) -> Result<Metadata, LineError> {
    let mut metadata = Metadata::default();
    for (i, line) in content.lines().enumerate() {
        let linenum = i + 1;
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            return Err((linenum, ParseErrorKind::EmptyMetadataKey));
        }
        if let Some(slot) = metadata.recognized_slot(key) {
            if slot.is_some() {
                return Err((
                    linenum,
                    ParseErrorKind::DuplicateMetadataKey {
                        key: key.to_string(),
                    },
                ));
            }
            *slot = Some(KString::from_ref(value));
        } else {
            metadata
                .other
                .insert(KString::from_ref(key), KString::from_ref(value));
        }
    }
    Ok(metadata)
}

/// The file name without its last extension (".hidden" stays as is).
fn stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(i) => &file_name[..i],
    }
}

/// Pair each timing file with its metadata file. For a timing file
/// with stem S, the metadata file is the shortest name starting with
/// S (the first in the given order among equally short ones), so that
/// `x_model` is chosen over `x_autopar_model` for `x`; failing that,
/// the one with the longest stem that is a prefix of S. Pure, so it
/// works on any name lists.
pub fn pair_files<'n>(
    timing_files: &[&'n str],
    metadata_files: &[&'n str],
) -> Vec<(&'n str, Option<&'n str>)> {
    timing_files
        .iter()
        .map(|timing| {
            let timing_stem = stem(timing);
            let found = metadata_files
                .iter()
                .filter(|m| m.starts_with(timing_stem))
                .min_by_key(|m| m.len())
                .or_else(|| {
                    metadata_files
                        .iter()
                        .filter(|m| timing_stem.starts_with(stem(m)))
                        // max_by_key returns the last maximum, thus rev
                        .rev()
                        .max_by_key(|m| stem(m).len())
                });
            (*timing, found.copied())
        })
        .collect()
}

/// Split a directory listing into (timing files, metadata files).
pub fn split_file_names<'n>(
    file_names: &[&'n str],
    metadata_marker: &str,
) -> (Vec<&'n str>, Vec<&'n str>) {
    file_names
        .iter()
        .partition(|name| !name.contains(metadata_marker))
}

/// The regular files in `dir` (not recursive), sorted by name.
/// Symlinks to regular files count as regular files.
fn list_file_names(dir: &Path) -> Result<Vec<String>, IngestError> {
    let io_error = |source| IngestError::Io {
        path: dir.to_owned(),
        source,
    };
    if !std::fs::metadata(dir).map_err(io_error)?.is_dir() {
        return Err(io_error(std::io::Error::new(
            std::io::ErrorKind::Other,
            "not a directory",
        )));
    }
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            io_error(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk")),
            )
        })?;
        if !entry.path().is_file() {
            debug!("skipping {:?}, not a file", entry.path());
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => warn!("ignoring file with non-UTF-8 name {:?}", entry.path()),
        }
    }
    Ok(names)
}

fn read_lossy(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_owned(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn with_path<T>(path: &Path, r: Result<T, LineError>) -> Result<T, IngestError> {
    r.map_err(|(line, reason)| IngestError::Parse {
        path: path.to_owned(),
        line,
        reason,
    })
}

/// Key of a record for point lookups.
type Triple = (KString, KString, KString);

/// All records of one results directory.
#[derive(Debug, Default)]
pub struct Repository {
    records: Vec<Record>,
    /// Index into `records` of the first record for each triple
    by_triple: HashMap<Triple, usize>,
    empty: Record,
}

impl Repository {
    /// Read all timing files in `dir` together with their metadata
    /// files. If `source_filter` is given, records whose source is not
    /// in it (including records without metadata) are dropped. Any
    /// malformed line fails the whole ingestion.
    pub fn ingest(
        dir: &Path,
        config: &ReportConfig,
        source_filter: Option<&[String]>,
    ) -> Result<Self, IngestError> {
        let names = list_file_names(dir)?;
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let (timing_files, metadata_files) = split_file_names(&names, &config.metadata_marker);

        let mut records = Vec::new();
        for (timing_file, metadata_file) in pair_files(&timing_files, &metadata_files) {
            debug!("pairing {timing_file:?} with {metadata_file:?}");
            let timing_path = dir.join(timing_file);
            info!("reading {timing_path:?}");
            let samples = with_path(
                &timing_path,
                parse_timing_lines(&read_lossy(&timing_path)?, &config.timing_suffix),
            )?;
            let metadata = if let Some(metadata_file) = metadata_file {
                let metadata_path = dir.join(metadata_file);
                Some(with_path(
                    &metadata_path,
                    parse_metadata_lines(&read_lossy(&metadata_path)?),
                )?)
            } else {
                warn!("no metadata file for {timing_path:?}");
                None
            };
            let record = Record::new(samples, metadata);
            if let Some(allowed) = source_filter {
                let keep = record
                    .source()
                    .map_or(false, |s| allowed.iter().any(|a| a == s));
                if !keep {
                    debug!("dropping {timing_file:?}, source {:?}", record.source());
                    continue;
                }
            }
            records.push(record);
        }
        Ok(Self::from_records(records))
    }

    /// Build the lookup index. Where several records share an
    /// (opt level, data size, source) triple, the first one wins.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut by_triple = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            let (Some(opt), Some(size), Some(source)) =
                (record.opt_level(), record.data_size(), record.source())
            else {
                continue;
            };
            let key = (
                KString::from_ref(opt),
                KString::from_ref(size),
                KString::from_ref(source),
            );
            match by_triple.entry(key) {
                Entry::Occupied(e) => {
                    warn!("duplicate results for {:?}, using the first one", e.key());
                }
                Entry::Vacant(e) => {
                    e.insert(i);
                }
            }
        }
        Self {
            records,
            by_triple,
            empty: Record::empty(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record for the given triple, or the empty sentinel record.
    pub fn lookup(&self, opt_level: &str, data_size: &str, source: &str) -> &Record {
        let key = (
            KString::from_ref(opt_level),
            KString::from_ref(data_size),
            KString::from_ref(source),
        );
        self.by_triple
            .get(&key)
            .map(|i| &self.records[*i])
            .unwrap_or(&self.empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_parse_timing_lines() {
        let s = parse_timing_lines("prog1_time 0.1 2.0\n\n  prog2_time\t0.05   1e-3  \n", "_time")
            .unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].program.as_str(), "prog1");
        assert_eq!(s[0].variance, 0.1);
        assert_eq!(s[0].time, 2.0);
        assert_eq!(s[1].program.as_str(), "prog2");
        assert_eq!(s[1].time, 0.001);
    }

    #[test]
    fn t_parse_timing_lines_without_suffix() {
        let s = parse_timing_lines("bicg 0 1.5", "_time").unwrap();
        assert_eq!(s[0].program.as_str(), "bicg");
    }

    #[test]
    fn t_parse_timing_errors() {
        assert_eq!(
            parse_timing_lines("prog1_time notanumber 2.0", "_time"),
            Err((
                1,
                ParseErrorKind::NotANumber {
                    field: "variance",
                    token: "notanumber".into()
                }
            ))
        );
        assert_eq!(
            parse_timing_lines("a_time 0 1\nb_time 0 1 extra", "_time"),
            Err((2, ParseErrorKind::WrongTokenCount { found: 4 }))
        );
        assert_eq!(
            parse_timing_lines("a_time 0", "_time"),
            Err((1, ParseErrorKind::WrongTokenCount { found: 2 }))
        );
        assert_eq!(
            parse_timing_lines("a_time 0 1\na_time 0 2", "_time"),
            Err((
                2,
                ParseErrorKind::DuplicateProgram {
                    program: "a".into()
                }
            ))
        );
    }

    #[test]
    fn t_parse_metadata_lines() {
        let m = parse_metadata_lines(
            "compiler: gcc 12.2\nopt level : O2\ndata size:SMALL\n\
             source: original\nnote: a: b\nno colon here\n",
        )
        .unwrap();
        assert_eq!(m.compiler.as_deref(), Some("gcc 12.2"));
        assert_eq!(m.opt_level.as_deref(), Some("O2"));
        assert_eq!(m.data_size.as_deref(), Some("SMALL"));
        assert_eq!(m.source.as_deref(), Some("original"));
        assert_eq!(m.other.get("note").map(|v| v.as_str()), Some("a: b"));
        assert_eq!(m.other.len(), 1);
    }

    #[test]
    fn t_parse_metadata_case_sensitive_keys() {
        let m = parse_metadata_lines("Source: original").unwrap();
        assert_eq!(m.source, None);
        assert_eq!(m.other.len(), 1);
    }

    #[test]
    fn t_parse_metadata_errors() {
        assert_eq!(
            parse_metadata_lines("source: a\n: b"),
            Err((2, ParseErrorKind::EmptyMetadataKey))
        );
        assert_eq!(
            parse_metadata_lines("source: a\nsource: b"),
            Err((
                2,
                ParseErrorKind::DuplicateMetadataKey {
                    key: "source".into()
                }
            ))
        );
    }

    #[test]
    fn t_stem() {
        assert_eq!(stem("a_time.txt"), "a_time");
        assert_eq!(stem("a.b.model"), "a.b");
        assert_eq!(stem("a_time"), "a_time");
        assert_eq!(stem(".hidden"), ".hidden");
    }

    #[test]
    fn t_split_file_names() {
        let (t, m) = split_file_names(&["a_time", "a.model", "b_model.txt", "b.txt"], "model");
        assert_eq!(t, vec!["a_time", "b.txt"]);
        assert_eq!(m, vec!["a.model", "b_model.txt"]);
    }

    #[test]
    fn t_pair_files() {
        let timing = ["O2_SMALL_original.txt", "a_time", "ab_time", "zzz_time"];
        let metadata = ["O2_SMALL_original_model.txt", "a.model", "ab.model"];
        assert_eq!(
            pair_files(&timing, &metadata),
            vec![
                (
                    "O2_SMALL_original.txt",
                    Some("O2_SMALL_original_model.txt")
                ),
                ("a_time", Some("a.model")),
                ("ab_time", Some("ab.model")),
                ("zzz_time", None),
            ]
        );
    }

    #[test]
    fn t_pair_files_prefix_collision() {
        let timing = ["O2_SMALL_original", "O2_SMALL_original_autopar"];
        let metadata = ["O2_SMALL_original_autopar_model", "O2_SMALL_original_model"];
        assert_eq!(
            pair_files(&timing, &metadata),
            vec![
                ("O2_SMALL_original", Some("O2_SMALL_original_model")),
                (
                    "O2_SMALL_original_autopar",
                    Some("O2_SMALL_original_autopar_model")
                ),
            ]
        );
    }

    #[test]
    fn t_pair_files_first_match_wins() {
        let timing = ["run.txt"];
        let metadata = ["run_model_1.txt", "run_model_2.txt"];
        assert_eq!(
            pair_files(&timing, &metadata),
            vec![("run.txt", Some("run_model_1.txt"))]
        );
    }

    fn record(opt: &str, size: &str, source: &str, time: f64) -> Record {
        let metadata = parse_metadata_lines(&format!(
            "opt level: {opt}\ndata size: {size}\nsource: {source}"
        ))
        .unwrap();
        let samples = parse_timing_lines(&format!("p_time 0 {time}"), "_time").unwrap();
        Record::new(samples, Some(metadata))
    }

    #[test]
    fn t_lookup() {
        let repo = Repository::from_records(vec![
            record("O2", "SMALL", "original", 2.0),
            record("O2", "SMALL", "fission_manual", 1.0),
            record("O2", "SMALL", "original", 3.0),
            Record::new(
                parse_timing_lines("p_time 0 5", "_time").unwrap(),
                None,
            ),
        ]);
        for r in repo.records().iter().take(2) {
            let found = repo.lookup(
                r.opt_level().unwrap(),
                r.data_size().unwrap(),
                r.source().unwrap(),
            );
            assert_eq!(found.samples(), r.samples());
        }
        // first one wins
        assert_eq!(
            repo.lookup("O2", "SMALL", "original").time_for("p"),
            Some(2.0)
        );
        let missing = repo.lookup("O3", "SMALL", "original");
        assert!(missing.is_empty());
        assert_eq!(missing.source(), None);
    }
}
