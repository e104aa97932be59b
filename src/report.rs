//! The `report` operation: ingest a results directory, build the time
//! or speedup grid, and hand it to the selected renderer.

use std::{
    fs::File,
    io::{BufWriter, IsTerminal, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use strum_macros::EnumString;

use crate::{
    catalog::{Catalog, DimensionOrder},
    config::ReportConfig,
    diagnostic, info,
    ingest::Repository,
    pivot::{build_speedup_table, build_time_table, Grid, SpeedupError},
    tables::{
        chart::write_speedup_charts,
        excel_table_view::excel_file_write,
        table_view::TableView,
        terminal_table::{write_terminal, ColorOpt},
        text_table::{write_markdown, write_tex},
    },
    time_format::TimeFormat,
};

#[derive(Debug, EnumString, PartialEq, Eq, Clone, Copy)]
#[strum(serialize_all = "kebab_case")]
pub enum ReportKind {
    /// Execution times
    Time,
    /// Baseline time divided by target time
    Speedup,
}

#[derive(Debug, EnumString, PartialEq, Eq, Clone, Copy)]
#[strum(serialize_all = "kebab_case")]
pub enum OutputFormat {
    Md,
    Tex,
    /// SVG bar charts; always a speedup report
    Plot,
    /// Padded table on stdout
    Term,
    /// Tab separated on stdout
    Tsv,
    Xlsx,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ReportOpts {
    /// Directory with the timing and metadata files (default:
    /// `results_dir` from the config)
    #[clap(long)]
    pub dir: Option<PathBuf>,

    /// Which report to produce (time, speedup)
    #[clap(long, default_value = "time")]
    pub data: ReportKind,

    /// Output format (md, tex, plot, term, tsv, xlsx). `plot` implies
    /// `--data speedup`.
    #[clap(long, default_value = "md")]
    pub fmt: OutputFormat,

    /// The source that speedups are relative to
    #[clap(long, default_value = "original")]
    pub ss: String,

    /// Only show the speedup of this source (default: all sources
    /// other than the baseline)
    #[clap(long)]
    pub st: Option<String>,

    /// Show times in milliseconds instead of seconds
    #[clap(long)]
    pub millis: bool,

    /// Number of digits after the decimal point (values are
    /// truncated)
    #[clap(long, default_value = "10", value_parser = clap::value_parser!(u8).range(0..=15))]
    pub digits: u8,

    /// Only read results with this source (can be given multiple
    /// times)
    #[clap(long = "dir-filter", alias = "dir_filter")]
    pub dir_filter: Vec<String>,

    /// Only show these programs (can be given multiple times)
    #[clap(long = "prog-filter", alias = "prog_filter")]
    pub prog_filter: Vec<String>,

    /// Directory to write output files to; created if missing
    #[clap(long, default_value = ".")]
    pub out: PathBuf,

    /// Whether to use ANSI codes for `--fmt term` (auto, always,
    /// never)
    #[clap(long, default_value = "auto")]
    pub color: ColorOpt,
}

impl Default for ReportOpts {
    fn default() -> Self {
        Self {
            dir: None,
            data: ReportKind::Time,
            fmt: OutputFormat::Md,
            ss: "original".into(),
            st: None,
            millis: false,
            digits: 10,
            dir_filter: Vec::new(),
            prog_filter: Vec::new(),
            out: ".".into(),
            color: ColorOpt::Auto,
        }
    }
}

impl ReportOpts {
    pub fn time_format(&self) -> TimeFormat {
        TimeFormat {
            millis: self.millis,
            digits: self.digits.into(),
        }
    }

    /// `plot` only exists for speedups.
    pub fn effective_kind(&self) -> ReportKind {
        if self.fmt == OutputFormat::Plot {
            ReportKind::Speedup
        } else {
            self.data
        }
    }
}

#[derive(Debug)]
pub enum ReportOutcome {
    /// Files written, in order
    Written(Vec<PathBuf>),
    /// The table went to the given writer
    Printed,
    /// The speedup report does not apply to this data; a diagnostic
    /// was printed and nothing written
    NotProduced(SpeedupError),
}

/// File stem of a time report: the sources in table order.
pub fn time_report_stem(catalog: &Catalog) -> String {
    if catalog.sources.is_empty() {
        "time".into()
    } else {
        catalog.sources.join("-").to_lowercase()
    }
}

/// File stem of a speedup report.
pub fn speedup_report_stem(baseline: &str, target: Option<&str>) -> String {
    format!("{baseline}-{}", target.unwrap_or("all"))
}

fn write_file(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let file = File::create(path).with_context(|| anyhow!("creating {path:?}"))?;
    let mut out = BufWriter::new(file);
    write(&mut out)?;
    out.flush().with_context(|| anyhow!("writing {path:?}"))?;
    info!("wrote {path:?}");
    Ok(())
}

fn create_out_dir(out: &Path) -> Result<()> {
    std::fs::create_dir_all(out).with_context(|| anyhow!("creating output directory {out:?}"))
}

fn render(
    grid: &Grid,
    stem: &str,
    opts: &ReportOpts,
    config: &ReportConfig,
    stdout: &mut impl Write,
) -> Result<ReportOutcome> {
    let file_path = |extension: &str| opts.out.join(format!("{stem}.{extension}"));
    let written = match opts.fmt {
        OutputFormat::Term | OutputFormat::Tsv => {
            let color = opts.color.want_color(std::io::stdout().is_terminal());
            write_terminal(grid, opts.fmt == OutputFormat::Tsv, color, stdout)?;
            return Ok(ReportOutcome::Printed);
        }
        OutputFormat::Md => {
            create_out_dir(&opts.out)?;
            let path = file_path("md");
            write_file(&path, |out| write_markdown(grid, out))?;
            vec![path]
        }
        OutputFormat::Tex => {
            create_out_dir(&opts.out)?;
            let path = file_path("tex");
            write_file(&path, |out| write_tex(grid, out))?;
            vec![path]
        }
        OutputFormat::Xlsx => {
            create_out_dir(&opts.out)?;
            let path = file_path("xlsx");
            excel_file_write([grid as &dyn TableView], &path)?;
            info!("wrote {path:?}");
            vec![path]
        }
        OutputFormat::Plot => {
            create_out_dir(&opts.out)?;
            let written = write_speedup_charts(grid, config, &opts.out)?;
            for path in &written {
                info!("wrote {path:?}");
            }
            written
        }
    };
    Ok(ReportOutcome::Written(written))
}

/// Run one report. A speedup report that does not apply to the data
/// is not an error: the reason is printed to stderr and
/// `ReportOutcome::NotProduced` returned.
pub fn run_report(
    opts: &ReportOpts,
    config: &ReportConfig,
    stdout: &mut impl Write,
) -> Result<ReportOutcome> {
    let dir = opts.dir.as_deref().unwrap_or(&config.results_dir);
    let source_filter = (!opts.dir_filter.is_empty()).then_some(opts.dir_filter.as_slice());
    let repository = Repository::ingest(dir, config, source_filter)?;
    info!("{} records read from {dir:?}", repository.records().len());

    let mut catalog = Catalog::derive(repository.records(), &DimensionOrder::from_config(config));
    if !opts.prog_filter.is_empty() {
        catalog.retain_programs(&opts.prog_filter);
    }

    let format = opts.time_format();
    match opts.effective_kind() {
        ReportKind::Time => {
            let grid = build_time_table(&catalog, &repository, format);
            render(&grid, &time_report_stem(&catalog), opts, config, stdout)
        }
        ReportKind::Speedup => {
            let target = opts.st.as_deref();
            match build_speedup_table(&catalog, &repository, &opts.ss, target, format) {
                Ok(grid) => render(
                    &grid,
                    &speedup_report_stem(&opts.ss, target),
                    opts,
                    config,
                    stdout,
                ),
                Err(e) => {
                    diagnostic!("{e} in {dir:?}");
                    Ok(ReportOutcome::NotProduced(e))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ingest::IngestError;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    /// Two sources of one program at one configuration.
    fn results_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a_time", "p_time 0.1 2.0\n");
        write(
            dir.path(),
            "a.model",
            "source: original\nopt level: O2\ndata size: SMALL\n",
        );
        write(dir.path(), "b_time", "p_time 0.1 1.0\n");
        write(
            dir.path(),
            "b.model",
            "source: fission_manual\nopt level: O2\ndata size: SMALL\n",
        );
        dir
    }

    fn opts(dir: &Path, out: &Path) -> ReportOpts {
        ReportOpts {
            dir: Some(dir.into()),
            out: out.into(),
            digits: 1,
            color: ColorOpt::Never,
            ..ReportOpts::default()
        }
    }

    #[test]
    fn t_parse_options() {
        assert_eq!("speedup".parse::<ReportKind>().unwrap(), ReportKind::Speedup);
        assert_eq!("xlsx".parse::<OutputFormat>().unwrap(), OutputFormat::Xlsx);
        assert!("pdf".parse::<OutputFormat>().is_err());
        let o = ReportOpts {
            fmt: OutputFormat::Plot,
            ..ReportOpts::default()
        };
        assert_eq!(o.effective_kind(), ReportKind::Speedup);
    }

    #[test]
    fn t_stems() {
        assert_eq!(speedup_report_stem("original", None), "original-all");
        assert_eq!(
            speedup_report_stem("original", Some("fission_manual")),
            "original-fission_manual"
        );
        let catalog = Catalog {
            programs: vec![],
            data_sizes: vec![],
            opt_levels: vec![],
            sources: vec!["original".into(), "Fission_Manual".into()],
        };
        assert_eq!(time_report_stem(&catalog), "original-fission_manual");
    }

    #[test]
    fn t_time_report_markdown() {
        let dir = results_dir();
        let out = tempfile::tempdir().unwrap();
        let out_dir = out.path().join("reports");
        let outcome = run_report(
            &opts(dir.path(), &out_dir),
            &ReportConfig::default(),
            &mut Vec::new(),
        )
        .unwrap();
        let path = out_dir.join("original-fission_manual.md");
        let ReportOutcome::Written(written) = outcome else {
            panic!("expected files to be written")
        };
        assert_eq!(written, vec![path.clone()]);
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("| p       | SMALL     | 2.0      | 1.0            |"));
    }

    #[test]
    fn t_speedup_report_tsv() {
        let dir = results_dir();
        let out = tempfile::tempdir().unwrap();
        let o = ReportOpts {
            data: ReportKind::Speedup,
            fmt: OutputFormat::Tsv,
            ..opts(dir.path(), out.path())
        };
        let mut stdout = Vec::new();
        let outcome = run_report(&o, &ReportConfig::default(), &mut stdout).unwrap();
        assert!(matches!(outcome, ReportOutcome::Printed));
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "Program\tData size\tO2\np\tSMALL\t2.0\n"
        );
    }

    #[test]
    fn t_single_source_produces_nothing() {
        let dir = results_dir();
        let out = tempfile::tempdir().unwrap();
        let out_dir = out.path().join("never");
        let o = ReportOpts {
            data: ReportKind::Speedup,
            dir_filter: vec!["original".into()],
            ..opts(dir.path(), &out_dir)
        };
        let outcome = run_report(&o, &ReportConfig::default(), &mut Vec::new()).unwrap();
        let ReportOutcome::NotProduced(e) = outcome else {
            panic!("expected no output")
        };
        assert_eq!(e, SpeedupError::InsufficientSources { found: 1 });
        assert!(!out_dir.exists());
    }

    #[test]
    fn t_missing_baseline_produces_nothing() {
        let dir = results_dir();
        let out = tempfile::tempdir().unwrap();
        let o = ReportOpts {
            fmt: OutputFormat::Plot,
            ss: "original_autopar".into(),
            ..opts(dir.path(), out.path())
        };
        let outcome = run_report(&o, &ReportConfig::default(), &mut Vec::new()).unwrap();
        assert!(matches!(
            outcome,
            ReportOutcome::NotProduced(SpeedupError::BaselineNotFound { .. })
        ));
    }

    #[test]
    fn t_plot() {
        let dir = results_dir();
        let out = tempfile::tempdir().unwrap();
        let o = ReportOpts {
            fmt: OutputFormat::Plot,
            ..opts(dir.path(), out.path())
        };
        let outcome = run_report(&o, &ReportConfig::default(), &mut Vec::new()).unwrap();
        let ReportOutcome::Written(written) = outcome else {
            panic!("expected files to be written")
        };
        assert_eq!(written, vec![out.path().join("original-fission_manual.svg")]);
    }

    #[test]
    fn t_missing_dir_is_an_error() {
        let out = tempfile::tempdir().unwrap();
        let missing = out.path().join("does-not-exist");
        let err = run_report(
            &opts(&missing, out.path()),
            &ReportConfig::default(),
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::Io { .. })
        ));
    }
}
