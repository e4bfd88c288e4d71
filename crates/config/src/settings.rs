// Application settings
// Loaded from ~/.config/gridmerge/settings.json

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::file_setting::{find_file_setting, FileSetting};

/// Most-recent-first search queries kept in `search.history`.
pub const SEARCH_HISTORY_LIMIT: usize = 10;

/// How rows of the two sides are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowMatching {
    /// First cell only
    #[default]
    Key,
    /// Every cell
    Full,
}

impl std::str::FromStr for RowMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "key" => Ok(RowMatching::Key),
            "full" => Ok(RowMatching::Full),
            other => Err(format!("unknown row matching '{}' (expected key or full)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Diff
    #[serde(rename = "diff.skipFirstBlankRows")]
    pub skip_first_blank_rows: bool,

    #[serde(rename = "diff.skipFirstBlankColumns")]
    pub skip_first_blank_columns: bool,

    #[serde(rename = "diff.trimLastBlankRows")]
    pub trim_last_blank_rows: bool,

    #[serde(rename = "diff.trimLastBlankColumns")]
    pub trim_last_blank_columns: bool,

    #[serde(rename = "diff.rowMatching")]
    pub row_matching: RowMatching,

    // Locator
    #[serde(rename = "locator.blankRowLimit")]
    pub blank_row_limit: usize,

    #[serde(rename = "locator.blankColumnLimit")]
    pub blank_column_limit: usize,

    #[serde(rename = "locator.maxSearchSteps")]
    pub max_search_steps: usize,

    // Change log
    #[serde(rename = "log.modifiedFormat")]
    pub modified_format: String,

    #[serde(rename = "log.addedFormat")]
    pub added_format: String,

    #[serde(rename = "log.removedFormat")]
    pub removed_format: String,

    // Search
    #[serde(rename = "search.history")]
    pub search_history: Vec<String>,

    // UI
    #[serde(rename = "ui.notifyEqual")]
    pub notify_equal: bool,

    #[serde(rename = "ui.focusFirstDiff")]
    pub focus_first_diff: bool,

    #[serde(rename = "fileSettings")]
    pub file_settings: Vec<FileSetting>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            skip_first_blank_rows: false,
            skip_first_blank_columns: false,
            trim_last_blank_rows: true,
            trim_last_blank_columns: true,
            row_matching: RowMatching::Key,
            blank_row_limit: 50,
            blank_column_limit: 10,
            max_search_steps: 100,
            modified_format: "${ROW} / ${COL}: ${LEFT} -> ${RIGHT}".to_string(),
            added_format: "${ROW}: row added".to_string(),
            removed_format: "${ROW}: row removed".to_string(),
            search_history: Vec::new(),
            notify_equal: true,
            focus_first_diff: true,
            file_settings: Vec::new(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gridmerge")
            .join("settings.json")
    }

    /// Load from the default location, falling back to defaults on any error.
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// A missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("error reading {}: {}", path.display(), e))?;
        Self::from_json(&contents).map_err(|e| format!("error parsing {}: {}", path.display(), e))
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Record a search query: moved to the front, duplicates dropped, capped.
    pub fn push_search(&mut self, query: &str) {
        if query.is_empty() {
            return;
        }
        self.search_history.retain(|q| q != query);
        self.search_history.insert(0, query.to_string());
        self.search_history.truncate(SEARCH_HISTORY_LIMIT);
    }

    pub fn file_setting(
        &self,
        file_name: &str,
        sheet_index: usize,
        sheet_name: &str,
        startup: bool,
    ) -> Result<Option<&FileSetting>, String> {
        find_file_setting(&self.file_settings, file_name, sheet_index, sheet_name, startup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dotted_keys_with_defaults() {
        let json = r#"{
            // comment lines are skipped
            "diff.rowMatching": "full",
            "locator.blankRowLimit": 5,
            "fileSettings": [{ "name": "items", "columnHeaderIndex": 2, "ignoredColumns": [3] }]
        }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.row_matching, RowMatching::Full);
        assert_eq!(settings.blank_row_limit, 5);
        assert_eq!(settings.blank_column_limit, 10);
        assert_eq!(settings.max_search_steps, 100);
        assert_eq!(settings.file_settings[0].column_header_index, Some(2));
        assert_eq!(settings.file_settings[0].ignored_columns, vec![3]);
    }

    #[test]
    fn test_search_history_is_mru_and_capped() {
        let mut settings = Settings::default();
        for i in 0..12 {
            settings.push_search(&format!("q{}", i));
        }
        assert_eq!(settings.search_history.len(), SEARCH_HISTORY_LIMIT);
        assert_eq!(settings.search_history[0], "q11");
        assert_eq!(settings.search_history[9], "q2");

        settings.push_search("q5");
        assert_eq!(settings.search_history[0], "q5");
        assert_eq!(settings.search_history.len(), SEARCH_HISTORY_LIMIT);
        assert_eq!(settings.search_history.iter().filter(|q| *q == "q5").count(), 1);

        settings.push_search("");
        assert_eq!(settings.search_history[0], "q5");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = Settings::default();
        settings.push_search("hero");
        settings.trim_last_blank_rows = false;
        settings.save_to(&path).unwrap();

        let back = Settings::load_from(&path).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_missing_file_is_default_malformed_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("none.json");
        assert_eq!(Settings::load_from(&missing).unwrap(), Settings::default());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(Settings::load_from(&bad).unwrap_err().contains("error parsing"));
    }

    #[test]
    fn test_row_matching_from_str() {
        assert_eq!("KEY".parse::<RowMatching>().unwrap(), RowMatching::Key);
        assert_eq!("full".parse::<RowMatching>().unwrap(), RowMatching::Full);
        assert!("fuzzy".parse::<RowMatching>().is_err());
    }
}
