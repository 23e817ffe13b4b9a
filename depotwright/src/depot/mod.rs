//! Depot discovery and validation.
//!
//! - [`naming`] parses version suffixes of depot directory names
//! - [`DepotProber`] finds depot directories below the configured roots
//! - [`DepotChecker`] decides which depots and applications are installable

mod checker;
mod listing;
mod naming;
mod prober;

pub use checker::{CheckError, DepotChecker};
pub use listing::{list_files, relative_to, subdirectories, ListedFile};
pub use naming::{match_depot_dir, parse_version, split_version, trim_version, UNVERSIONED};
pub use prober::{DepotProber, ProbeError, ProbeReport, DEFAULT_FIXES_DIR, DEFAULT_MAX_DEPTH};
