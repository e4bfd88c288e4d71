//! Settings + profile resolution shared by every command.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use gridmerge_config::{MergeProfile, ProfileSide, RowMatching, Settings};
use gridmerge_engine::changelog::LogFormats;
use gridmerge_engine::progress::{Phase, ProgressEvent, ProgressSink};
use gridmerge_engine::{diff_sheets_with_progress, CompareMode, DiffConfig, Row, SheetDiff};
use gridmerge_io::ReadOptions;
use gridmerge_recon::LocatorLimits;
use log::{debug, info, warn};

use crate::{CliError, DiffOptions};

pub struct RunContext {
    /// Settings as stored on disk; search history is saved back from here.
    settings: Settings,
    settings_path: PathBuf,
    /// Settings with the profile's overrides folded in.
    effective: Settings,
    profile: Option<MergeProfile>,
}

/// The two sides of a diff as read from disk.
pub struct Sides {
    pub left_path: PathBuf,
    pub right_path: PathBuf,
    pub left: Vec<Row>,
    pub right: Vec<Row>,
}

impl RunContext {
    pub fn load(settings_path: Option<PathBuf>, profile_path: Option<PathBuf>) -> Result<Self, CliError> {
        let settings_path = settings_path.unwrap_or_else(Settings::config_path);
        let settings = Settings::load_from(&settings_path).map_err(CliError::profile)?;

        let profile = match profile_path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::io(format!("{}: no such profile", path.display())));
                }
                let profile = MergeProfile::load(&path).map_err(CliError::profile)?;
                info!("using profile '{}'", profile.name);
                Some(profile)
            }
            None => None,
        };

        let effective = match &profile {
            Some(p) => p.apply_to(&settings),
            None => settings.clone(),
        };

        Ok(Self { settings, settings_path, effective, profile })
    }

    pub fn settings(&self) -> &Settings {
        &self.effective
    }

    /// Record a search query in the stored settings and write them back.
    pub fn remember_search(&mut self, query: &str) {
        self.settings.push_search(query);
        self.effective.search_history = self.settings.search_history.clone();
        if let Err(e) = self.settings.save_to(&self.settings_path) {
            warn!("could not save search history: {}", e);
        }
    }

    pub fn locator_limits(&self) -> LocatorLimits {
        LocatorLimits {
            blank_row_limit: self.effective.blank_row_limit,
            blank_column_limit: self.effective.blank_column_limit,
            max_search_steps: self.effective.max_search_steps,
        }
    }

    pub fn log_formats(&self) -> LogFormats {
        LogFormats {
            modified: self.effective.modified_format.clone(),
            added: self.effective.added_format.clone(),
            removed: self.effective.removed_format.clone(),
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            blank_column_limit: self.effective.blank_column_limit,
            ..ReadOptions::default()
        }
    }

    /// A path given on the command line, else the profile's.
    pub fn resolve_path(
        &self,
        given: Option<PathBuf>,
        role: &str,
        from_profile: impl Fn(&MergeProfile) -> Option<&ProfileSide>,
    ) -> Result<PathBuf, CliError> {
        if let Some(path) = given {
            return Ok(path);
        }
        self.profile
            .as_ref()
            .and_then(|p| from_profile(p))
            .map(|side| side.file.clone())
            .ok_or_else(|| {
                CliError::args(format!("missing {} file", role))
                    .with_hint("pass it on the command line or use --profile")
            })
    }

    pub fn read_sides(&self, left: Option<PathBuf>, right: Option<PathBuf>) -> Result<Sides, CliError> {
        let left_path = self.resolve_path(left, "left", |p| Some(&p.left))?;
        let right_path = self.resolve_path(right, "right", |p| Some(&p.right))?;

        let progress = LogProgress;
        progress.report(ProgressEvent::Phase(Phase::ReadingFiles));
        let options = self.read_options();
        let left = gridmerge_io::read_rows(&left_path, &options).map_err(CliError::io)?;
        let right = gridmerge_io::read_rows(&right_path, &options).map_err(CliError::io)?;

        Ok(Sides { left_path, right_path, left, right })
    }

    /// Header rows, ignored columns and matching for one diff. The command
    /// line wins over the profile, the profile over per-file settings.
    pub fn diff_config(&self, sides: &Sides, options: &DiffOptions) -> Result<DiffConfig, CliError> {
        let left_setting = self.file_setting(&sides.left_path)?;
        let right_setting = self.file_setting(&sides.right_path)?;

        let left_header = options
            .left_header
            .or_else(|| self.profile.as_ref().and_then(|p| p.left.header_row))
            .or_else(|| left_setting.as_ref().and_then(|s| s.column_header_index));
        let right_header = options
            .right_header
            .or_else(|| self.profile.as_ref().and_then(|p| p.right.header_row))
            .or_else(|| right_setting.as_ref().and_then(|s| s.column_header_index));

        let mut ignored: BTreeSet<usize> = options.ignore_col.iter().copied().collect();
        if let Some(profile) = &self.profile {
            ignored.extend(profile.ignored_columns.iter().copied());
        }
        for setting in left_setting.iter().chain(right_setting.iter()) {
            ignored.extend(setting.ignored_columns.iter().copied());
        }

        let matching = options.row_matching.unwrap_or(self.effective.row_matching);
        let config = DiffConfig {
            left_header_index: left_header,
            right_header_index: right_header,
            trim_leading_blank_rows: self.effective.skip_first_blank_rows,
            trim_leading_blank_columns: self.effective.skip_first_blank_columns,
            trim_trailing_blank_rows: self.effective.trim_last_blank_rows,
            trim_trailing_blank_columns: self.effective.trim_last_blank_columns,
            ignored_columns: ignored,
            row_matching: compare_mode(matching),
        };
        debug!("diff config: {:?}", config);
        Ok(config)
    }

    pub fn run_diff(&self, sides: &Sides, options: &DiffOptions) -> Result<SheetDiff, CliError> {
        let config = self.diff_config(sides, options)?;
        Ok(diff_sheets_with_progress(&sides.left, &sides.right, &config, &LogProgress))
    }

    fn file_setting(&self, path: &Path) -> Result<Option<gridmerge_config::FileSetting>, CliError> {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };
        self.effective
            .file_setting(name, 0, "", true)
            .map(|s| s.cloned())
            .map_err(CliError::profile)
    }
}

pub fn compare_mode(matching: RowMatching) -> CompareMode {
    match matching {
        RowMatching::Key => CompareMode::KeyOnly,
        RowMatching::Full => CompareMode::Full,
    }
}

/// Progress sink that forwards phases and size warnings to the log.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase(phase) => info!("{}", phase.label()),
            ProgressEvent::SizeWarning { left_rows, right_rows } => {
                eprintln!(
                    "note: large input ({} / {} rows); the diff may take a while",
                    left_rows, right_rows
                );
            }
        }
    }
}
