// gmerge - diff two sheets and reconcile the changes into a third
//
// Diff positions and columns on the command line are 0-based; target
// document rows (`locate`, `apply`) are 1-based.

mod apply;
mod context;
mod exit_codes;
mod logging;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gridmerge_config::RowMatching;
use gridmerge_engine::Side;

use exit_codes::{EXIT_IO, EXIT_PATTERN, EXIT_PROFILE, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "gmerge")]
#[command(about = "Diff two sheets and copy the differences into a target sheet")]
#[command(version)]
struct Cli {
    /// Merge profile (TOML) supplying files and diff options
    #[arg(long, global = true, value_name = "FILE.toml")]
    profile: Option<PathBuf>,

    /// Settings file to use instead of the per-user one
    #[arg(long, global = true, value_name = "FILE.json")]
    settings: Option<PathBuf>,

    /// Log debug output to stderr (otherwise GMERGE_LOG, default warn)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that runs a diff.
#[derive(Args, Debug, Clone, Default)]
pub struct DiffOptions {
    /// Row index (0-based) of the left column-header row
    #[arg(long, value_name = "N")]
    pub left_header: Option<usize>,

    /// Row index (0-based) of the right column-header row
    #[arg(long, value_name = "N")]
    pub right_header: Option<usize>,

    /// Column (0-based) excluded from row comparison. Repeatable.
    #[arg(long = "ignore-col", value_name = "N")]
    pub ignore_col: Vec<usize>,

    /// Row matching: key (first cell) or full (every cell)
    #[arg(long = "match", value_name = "MODE")]
    pub row_matching: Option<RowMatching>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show which rows and cells differ
    #[command(after_help = "\
Examples:
  gmerge diff base.csv branch.csv
  gmerge diff base.csv branch.csv --left-header 0 --right-header 0 --json
  gmerge diff base.csv branch.csv --match full --ignore-col 3
  gmerge --profile items.toml diff")]
    Diff {
        left: Option<PathBuf>,
        right: Option<PathBuf>,

        #[command(flatten)]
        options: DiffOptions,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,

        /// Include unchanged rows
        #[arg(long)]
        all: bool,
    },

    /// Print change-log lines for the differences
    #[command(after_help = "\
Examples:
  gmerge log base.csv branch.csv --left-header 0 --right-header 0
  gmerge log base.csv branch.csv --rows 10..20")]
    Log {
        left: Option<PathBuf>,
        right: Option<PathBuf>,

        #[command(flatten)]
        options: DiffOptions,

        /// Diff positions to log, as START..END (end exclusive)
        #[arg(long, value_name = "A..B")]
        rows: Option<String>,
    },

    /// List diff cells whose text matches a pattern, in scan order
    #[command(after_help = "\
Examples:
  gmerge find base.csv branch.csv sword
  gmerge find base.csv branch.csv '^item_\\d+$' --regex --side right
  gmerge --profile items.toml find sword --diff-only --reverse")]
    Find {
        /// [LEFT RIGHT] PATTERN; the files may come from --profile
        #[arg(required = true, num_args = 1..=3, value_name = "ARGS")]
        args: Vec<String>,

        #[command(flatten)]
        options: DiffOptions,

        /// Whole-cell match
        #[arg(long)]
        exact: bool,

        #[arg(long)]
        case_sensitive: bool,

        /// Treat PATTERN as a regular expression
        #[arg(long)]
        regex: bool,

        /// Skip rows that are unchanged
        #[arg(long)]
        diff_only: bool,

        /// Report matches last to first
        #[arg(long)]
        reverse: bool,

        /// Which side's cell text to search
        #[arg(long, value_enum, default_value = "left")]
        side: SideArg,
    },

    /// Find a key row (and optionally a column) in a target file
    #[command(after_help = "\
Examples:
  gmerge locate release.csv 1042
  gmerge locate release.csv 1042 --suggest 980 --column price")]
    Locate {
        target: PathBuf,

        /// Row key (first-column text)
        key: String,

        /// Column header text to locate as well
        #[arg(long, value_name = "HEADER")]
        column: Option<String>,

        /// Row (1-based) where the search starts
        #[arg(long, value_name = "N", default_value_t = 1)]
        suggest: usize,
    },

    /// Copy every changed row of one side into a target file
    #[command(after_help = "\
Examples:
  gmerge apply base.csv branch.csv release.csv --from right
  gmerge apply base.csv branch.csv release.csv --replace --dry-run
  gmerge --profile items.toml apply --replace")]
    Apply {
        left: Option<PathBuf>,
        right: Option<PathBuf>,
        target: Option<PathBuf>,

        #[command(flatten)]
        options: DiffOptions,

        /// Side whose rows are copied
        #[arg(long, value_enum, default_value = "right")]
        from: SideArg,

        /// Overwrite rows whose key is found instead of inserting
        #[arg(long)]
        replace: bool,

        /// Report what would be written without saving the target
        #[arg(long)]
        dry_run: bool,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = context::RunContext::load(cli.settings, cli.profile).and_then(|mut ctx| {
        match cli.command {
            Commands::Diff { left, right, options, json, all } => {
                report::cmd_diff(&ctx, left, right, &options, json, all)
            }
            Commands::Log { left, right, options, rows } => {
                report::cmd_log(&ctx, left, right, &options, rows.as_deref())
            }
            Commands::Find {
                args,
                options,
                exact,
                case_sensitive,
                regex,
                diff_only,
                reverse,
                side,
            } => {
                let query = report::FindQuery {
                    exact,
                    case_sensitive,
                    regex,
                    diff_only,
                    reverse,
                    side: side.into(),
                };
                report::cmd_find(&mut ctx, args, &options, query)
            }
            Commands::Locate { target, key, column, suggest } => {
                apply::cmd_locate(&ctx, target, &key, column.as_deref(), suggest)
            }
            Commands::Apply { left, right, target, options, from, replace, dry_run, json } => {
                let run = apply::ApplyRun { from: from.into(), replace, dry_run, json };
                apply::cmd_apply(&ctx, left, right, target, &options, run)
            }
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Command result: the exit code to report on success.
pub type CmdResult = Result<u8, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn profile(msg: impl Into<String>) -> Self {
        Self::new(EXIT_PROFILE, msg)
    }

    pub fn pattern(msg: impl Into<String>) -> Self {
        Self::new(EXIT_PATTERN, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<gridmerge_recon::ReconError> for CliError {
    fn from(err: gridmerge_recon::ReconError) -> Self {
        CliError::io(err.to_string())
    }
}
