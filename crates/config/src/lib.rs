// Configuration loading

pub mod file_setting;
pub mod profile;
pub mod settings;

pub use file_setting::{find_file_setting, FileSetting};
pub use profile::{LocatorOverrides, MergeProfile, ProfileSide};
pub use settings::{RowMatching, Settings, SEARCH_HISTORY_LIMIT};
