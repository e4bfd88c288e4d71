//! CLI Exit Code Registry
//!
//! Single source of truth for `gmerge` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                        |
//! |------|------------------------------------------------|
//! | 0    | Success, no differences                        |
//! | 1    | Differences found (`diff`, `log`)              |
//! | 2    | Usage error (bad arguments)                    |
//! | 3    | IO error (unreadable or unwritable file)       |
//! | 4    | Invalid search pattern (`find`)                |
//! | 5    | Target key not found (`locate`)                |
//! | 6    | Invalid settings or merge profile              |

/// Success - command completed, nothing differs.
pub const EXIT_SUCCESS: u8 = 0;

/// Like `diff(1)`, exit 1 means "files differ."
pub const EXIT_DIFFS: u8 = 1;

/// Usage error - bad arguments, out-of-range options.
pub const EXIT_USAGE: u8 = 2;

/// A file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Empty or uncompilable search pattern.
pub const EXIT_PATTERN: u8 = 4;

/// `locate` found neither the key nor a nearby row.
pub const EXIT_NOT_FOUND: u8 = 5;

/// Settings JSON or merge profile TOML failed to parse or validate.
pub const EXIT_PROFILE: u8 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_DIFFS, EXIT_USAGE, EXIT_IO, EXIT_PATTERN, EXIT_NOT_FOUND, EXIT_PROFILE];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
