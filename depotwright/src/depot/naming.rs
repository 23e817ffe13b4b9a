//! Depot directory naming.
//!
//! Depot directories are named after the depot with an optional version
//! suffix: `Skyrim Content`, `Skyrim Content.2`, `Skyrim Content.v3` and
//! `Skyrim Content.V3` all belong to the depot `Skyrim Content`. A missing or
//! malformed suffix means "unversioned", represented as `-1`.

use regex::Regex;
use std::sync::OnceLock;

/// Version assigned to directories without a usable suffix.
pub const UNVERSIONED: i32 = -1;

/// Pattern for a name ending in a version suffix.
///
/// - Group 1: everything before the last `.`
/// - Group 2: the version digits, after an optional `v`/`V`
fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)^(.+)\.[vV]?([0-9]+)$").unwrap())
}

/// Split `name` into base name and version.
///
/// Returns `(name, UNVERSIONED)` when there is no valid suffix, including
/// suffixes that do not fit an `i32`.
pub fn split_version(name: &str) -> (&str, i32) {
    suffix_pattern()
        .captures(name)
        .and_then(|captures| {
            let base = captures.get(1)?.as_str();
            let version = captures.get(2)?.as_str().parse::<i32>().ok()?;
            Some((base, version))
        })
        .unwrap_or((name, UNVERSIONED))
}

/// Version number encoded in a directory name, or `-1`.
///
/// # Examples
///
/// ```
/// use depotwright::depot::parse_version;
///
/// assert_eq!(parse_version("Skyrim Content.17"), 17);
/// assert_eq!(parse_version("Skyrim Content.v4"), 4);
/// assert_eq!(parse_version("Skyrim Content"), -1);
/// assert_eq!(parse_version("Skyrim Content.beta"), -1);
/// ```
pub fn parse_version(name: &str) -> i32 {
    split_version(name).1
}

/// Strip version suffixes from a directory name.
///
/// Suffixes are stripped until none remains, so the function is idempotent:
/// `trim_version("x.1.2")` is `"x"`.
pub fn trim_version(name: &str) -> &str {
    let mut current = name;
    loop {
        let (base, version) = split_version(current);
        if version == UNVERSIONED {
            return current;
        }
        current = base;
    }
}

/// Match a directory name against a depot base name.
///
/// Returns the directory's version when it is the base name itself
/// (`Some(-1)`) or the base name followed by exactly one version suffix.
/// Comparison ignores case. Matching against the base name, rather than
/// trimming the directory name, keeps depots whose base name itself ends in
/// `.<digits>` (for example `Ripper_2.0`) addressable.
pub fn match_depot_dir(dir_name: &str, base_name: &str) -> Option<i32> {
    let dir = dir_name.to_lowercase();
    let base = base_name.to_lowercase();

    if dir == base {
        return Some(UNVERSIONED);
    }

    let suffix = dir.strip_prefix(&base)?;
    let digits = suffix.strip_prefix('.')?;
    let digits = digits.strip_prefix('v').unwrap_or(digits);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i32>().ok()
}
