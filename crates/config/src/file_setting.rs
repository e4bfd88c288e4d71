// Per-file settings, matched against a file name

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileSetting {
    /// File name pattern: a regex, an exact name, or a substring.
    pub name: String,
    pub use_regex: bool,
    pub exact_match: bool,
    pub sheet_name: String,
    pub sheet_index: usize,
    /// `Row::index` of the column-header row.
    pub column_header_index: Option<usize>,
    pub is_startup_sheet: bool,
    pub ignored_columns: Vec<usize>,
}

impl FileSetting {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Whether this setting applies to `file_name` (a bare name, no directory).
    pub fn matches(&self, file_name: &str) -> Result<bool, String> {
        if self.use_regex {
            let regex = Regex::new(&self.name)
                .map_err(|e| format!("file setting '{}': invalid regex: {}", self.name, e))?;
            Ok(regex.is_match(file_name))
        } else if self.exact_match {
            Ok(self.name == file_name)
        } else {
            Ok(file_name.contains(&self.name))
        }
    }
}

/// Pick the setting for one file.
///
/// At startup the setting flagged `is_startup_sheet` wins, else the first match.
/// Otherwise a setting naming `sheet_name` wins over one naming `sheet_index`.
pub fn find_file_setting<'a>(
    settings: &'a [FileSetting],
    file_name: &str,
    sheet_index: usize,
    sheet_name: &str,
    startup: bool,
) -> Result<Option<&'a FileSetting>, String> {
    let mut matched = Vec::new();
    for setting in settings {
        if setting.matches(file_name)? {
            matched.push(setting);
        }
    }

    if startup {
        return Ok(matched
            .iter()
            .find(|s| s.is_startup_sheet)
            .or_else(|| matched.first())
            .copied());
    }

    Ok(matched
        .iter()
        .find(|s| s.sheet_name == sheet_name)
        .or_else(|| matched.iter().find(|s| s.sheet_index == sheet_index))
        .copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting(name: &str, sheet: &str, index: usize) -> FileSetting {
        FileSetting {
            name: name.to_string(),
            sheet_name: sheet.to_string(),
            sheet_index: index,
            ..Default::default()
        }
    }

    #[test]
    fn test_substring_exact_and_regex() {
        let loose = FileSetting::new("items");
        assert!(loose.matches("game_items_v2.csv").unwrap());

        let exact = FileSetting { exact_match: true, ..FileSetting::new("items.csv") };
        assert!(exact.matches("items.csv").unwrap());
        assert!(!exact.matches("old_items.csv").unwrap());

        let pattern = FileSetting { use_regex: true, ..FileSetting::new(r"^items_\d+\.csv$") };
        assert!(pattern.matches("items_12.csv").unwrap());
        assert!(!pattern.matches("items_x.csv").unwrap());
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let bad = FileSetting { use_regex: true, ..FileSetting::new("items(") };
        let err = find_file_setting(&[bad], "items.csv", 0, "", false).unwrap_err();
        assert!(err.contains("invalid regex"));
    }

    #[test]
    fn test_startup_prefers_flagged_setting() {
        let first = setting("items", "a", 0);
        let flagged = FileSetting { is_startup_sheet: true, ..setting("items", "b", 1) };
        let all = [first.clone(), flagged.clone()];

        let found = find_file_setting(&all, "items.csv", 0, "", true).unwrap();
        assert_eq!(found, Some(&flagged));

        let found = find_file_setting(&all[..1], "items.csv", 0, "", true).unwrap();
        assert_eq!(found, Some(&first));
    }

    #[test]
    fn test_sheet_name_wins_over_index() {
        let by_index = setting("items", "other", 2);
        let by_name = setting("items", "main", 5);
        let all = [by_index.clone(), by_name.clone()];

        assert_eq!(find_file_setting(&all, "items.csv", 2, "main", false).unwrap(), Some(&by_name));
        assert_eq!(find_file_setting(&all, "items.csv", 2, "x", false).unwrap(), Some(&by_index));
        assert_eq!(find_file_setting(&all, "items.csv", 9, "x", false).unwrap(), None);
        assert_eq!(find_file_setting(&all, "units.csv", 2, "main", false).unwrap(), None);
    }
}
