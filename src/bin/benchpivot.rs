use std::{io::stdout, path::PathBuf};

use anyhow::Result;
use clap::Parser;

use benchpivot::{
    config::ReportConfig,
    config_file::{save_config_file, supported_formats, LoadConfigFile},
    report::{run_report, ReportOpts},
    utillib::{
        get_terminal_width::get_terminal_width,
        logging::{set_log_level, LogLevelOpt},
    },
};

#[derive(clap::Parser, Debug)]
#[command(
    next_line_help = true,
    term_width = get_terminal_width(4),
    bin_name = "benchpivot",
)]
/// Pivot tables and charts of benchmark timings.
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    /// Override the path to the config file (default: the paths
    /// `./benchpivot.*` where a single one exists where the `*` is
    /// the suffix for one of the supported config file formats (run
    /// `config-formats` to get the list), and if those are missing,
    /// use compiled-in default config values)
    #[clap(long)]
    config: Option<PathBuf>,

    /// The subcommand to run. Use `--help` after the sub-command to
    /// get a list of the allowed options there.
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Show the supported config format types.
    ConfigFormats,

    /// Re-encode the config (serialization type determined by file
    /// extension) and save at the given path.
    ConfigSave { output_path: PathBuf },

    /// Build a time or speedup table from a results directory.
    Report {
        #[clap(flatten)]
        opts: ReportOpts,
    },

    /// Show the version of this program.
    Version,
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        config,
        subcommand,
    } = Opts::parse();

    set_log_level(log_level.try_into()?);

    // Have to handle these before attempting to read the config
    match &subcommand {
        SubCommand::ConfigFormats => {
            println!(
                "These configuration file extensions / formats are supported:\n\n  {}\n",
                supported_formats().join("\n  ")
            );
            return Ok(());
        }
        SubCommand::Version => {
            println!("benchpivot {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => (),
    }

    let config = ReportConfig::load_config(config.as_ref())?;

    match subcommand {
        SubCommand::ConfigFormats | SubCommand::Version => unreachable!("already dispatched above"),
        SubCommand::ConfigSave { output_path } => save_config_file(&output_path, &config),
        SubCommand::Report { opts } => {
            let mut out = stdout().lock();
            // A report that does not apply to the data is not a
            // failure; `run_report` has already explained why.
            run_report(&opts, &config, &mut out)?;
            Ok(())
        }
    }
}
