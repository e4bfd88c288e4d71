// Merge profiles: a named left/right/target trio with its diff options
//
// ```toml
// name = "items"
// ignored_columns = [4]
// row_matching = "full"
//
// [left]
// file = "base/items.csv"
// header_row = 0
//
// [right]
// file = "branch/items.csv"
//
// [target]
// file = "release/items.csv"
//
// [locator]
// blank_row_limit = 20
// ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::{RowMatching, Settings};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSide {
    pub file: PathBuf,
    /// `Row::index` of the column-header row.
    #[serde(default)]
    pub header_row: Option<usize>,
}

/// Locator thresholds that replace the settings values when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorOverrides {
    pub blank_row_limit: Option<usize>,
    pub blank_column_limit: Option<usize>,
    pub max_search_steps: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeProfile {
    pub name: String,
    pub left: ProfileSide,
    pub right: ProfileSide,
    #[serde(default)]
    pub target: Option<ProfileSide>,
    #[serde(default)]
    pub ignored_columns: Vec<usize>,
    #[serde(default)]
    pub row_matching: Option<RowMatching>,
    #[serde(default)]
    pub locator: LocatorOverrides,
}

impl MergeProfile {
    pub fn from_toml(input: &str) -> Result<Self, String> {
        let profile: MergeProfile =
            toml::from_str(input).map_err(|e| format!("invalid profile: {}", e))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Read a profile file. Relative file paths are resolved against the
    /// profile's own directory.
    pub fn load(path: &Path) -> Result<Self, String> {
        let input = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let mut profile = Self::from_toml(&input)?;
        if let Some(base) = path.parent() {
            profile.left.file = base.join(&profile.left.file);
            profile.right.file = base.join(&profile.right.file);
            if let Some(target) = profile.target.as_mut() {
                target.file = base.join(&target.file);
            }
        }
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("profile name must not be empty".into());
        }

        let mut files = vec![("left", &self.left.file), ("right", &self.right.file)];
        if let Some(target) = &self.target {
            files.push(("target", &target.file));
        }

        for (role, file) in &files {
            if file.as_os_str().is_empty() {
                return Err(format!("profile '{}': {} file must not be empty", self.name, role));
            }
        }

        for (i, (role, file)) in files.iter().enumerate() {
            if let Some((other, _)) = files[..i].iter().find(|(_, f)| f == file) {
                return Err(format!(
                    "profile '{}': {} and {} name the same file {}",
                    self.name,
                    other,
                    role,
                    file.display()
                ));
            }
        }

        Ok(())
    }

    /// Fold the profile's overrides into a copy of `settings`.
    pub fn apply_to(&self, settings: &Settings) -> Settings {
        let mut merged = settings.clone();
        if let Some(matching) = self.row_matching {
            merged.row_matching = matching;
        }
        if let Some(limit) = self.locator.blank_row_limit {
            merged.blank_row_limit = limit;
        }
        if let Some(limit) = self.locator.blank_column_limit {
            merged.blank_column_limit = limit;
        }
        if let Some(steps) = self.locator.max_search_steps {
            merged.max_search_steps = steps;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PROFILE: &str = r#"
name = "items"
ignored_columns = [4]
row_matching = "full"

[left]
file = "base/items.csv"
header_row = 0

[right]
file = "branch/items.csv"

[target]
file = "release/items.csv"

[locator]
blank_row_limit = 20
"#;

    #[test]
    fn test_parse_profile() {
        let profile = MergeProfile::from_toml(PROFILE).unwrap();
        assert_eq!(profile.name, "items");
        assert_eq!(profile.left.header_row, Some(0));
        assert_eq!(profile.right.header_row, None);
        assert_eq!(profile.ignored_columns, vec![4]);
        assert_eq!(profile.row_matching, Some(RowMatching::Full));
        assert_eq!(profile.locator.blank_row_limit, Some(20));
        assert_eq!(profile.locator.max_search_steps, None);
    }

    #[test]
    fn test_overrides_apply_to_settings() {
        let profile = MergeProfile::from_toml(PROFILE).unwrap();
        let merged = profile.apply_to(&Settings::default());
        assert_eq!(merged.row_matching, RowMatching::Full);
        assert_eq!(merged.blank_row_limit, 20);
        assert_eq!(merged.blank_column_limit, 10);
        assert_eq!(merged.max_search_steps, 100);
    }

    #[test]
    fn test_empty_name_rejected() {
        let input = PROFILE.replace("name = \"items\"", "name = \"  \"");
        assert!(MergeProfile::from_toml(&input).unwrap_err().contains("name"));
    }

    #[test]
    fn test_duplicate_files_rejected() {
        let input = PROFILE.replace("release/items.csv", "base/items.csv");
        let err = MergeProfile::from_toml(&input).unwrap_err();
        assert!(err.contains("left and target"), "{}", err);
    }

    #[test]
    fn test_target_is_optional() {
        let input = "name = \"n\"\n[left]\nfile = \"a.csv\"\n[right]\nfile = \"b.csv\"\n";
        let profile = MergeProfile::from_toml(input).unwrap();
        assert!(profile.target.is_none());
        assert!(profile.ignored_columns.is_empty());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let input = "name = \"n\"\ncolour = 1\n[left]\nfile = \"a\"\n[right]\nfile = \"b\"\n";
        assert!(MergeProfile::from_toml(input).is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.toml");
        fs::write(&path, PROFILE).unwrap();
        let profile = MergeProfile::load(&path).unwrap();
        assert_eq!(profile.left.file, dir.path().join("base/items.csv"));
        assert_eq!(profile.target.unwrap().file, dir.path().join("release/items.csv"));
    }
}
