//! Install orchestration.
//!
//! - [`InstallOptions`] validated user choices for one run
//! - [`InstallService`] the single worker thread that runs installs
//! - [`copy`] file and folder copying with the replace and backup modes
//! - [`CancelFlag`] and [`ProgressThrottle`] for cooperative cancellation and
//!   percentage events

pub mod copy;

mod cancel;
mod error;
mod options;
mod progress;
mod service;

pub use cancel::CancelFlag;
pub use copy::{
    backup_path, copy_directory, copy_file, CopyError, CopyStatus, DirectoryCopy,
    ExistingFilePolicy, BACKUP_SUFFIX, COPY_BUFFER_SIZE,
};
pub use error::{InstallError, InstallResult};
pub use options::InstallOptions;
pub use progress::ProgressThrottle;
pub use service::{
    InstallEvent, InstallHandle, InstallOutcome, InstallReport, InstallService, ScriptRun,
};
