//! The install worker.
//!
//! One dedicated thread runs installs one at a time: resolve the files of the
//! application, copy them to the destination, then run its install script.
//! Callers talk to it only through [`InstallService::submit`], the progress
//! and completion events of the returned [`InstallHandle`], and the handle's
//! cancellation flag.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::{Application, Catalog};
use crate::files_map::FilesMapCache;
use crate::host::Host;
use crate::script::{Script, ScriptContext, ScriptSummary, Variables};

use super::copy::{copy_file, CopyError, CopyStatus, ExistingFilePolicy};
use super::{CancelFlag, InstallError, InstallOptions, InstallResult, ProgressThrottle};

/// What a successful install did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub application: String,
    /// `<destination>/<application install dir>`.
    pub install_dir: PathBuf,
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub script: ScriptRun,
}

/// What happened to the application's install script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptRun {
    /// Script execution was turned off for the run.
    Disabled,
    /// The application declares no install script.
    NotDeclared,
    /// The declared script was not among the installed files.
    Missing(PathBuf),
    Ran(ScriptSummary),
}

impl ScriptRun {
    pub fn summary(&self) -> Option<&ScriptSummary> {
        match self {
            Self::Ran(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Terminal state of an install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Succeeded(InstallReport),
    Cancelled,
    Failed {
        message: String,
        /// Technical detail of the error, for logs and bug reports.
        detail: String,
    },
}

impl InstallOutcome {
    fn from_error(error: &InstallError) -> Self {
        Self::Failed {
            message: error.to_string(),
            detail: format!("{:?}", error),
        }
    }
}

/// Events sent by the worker for one run; `Finished` is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    /// Percentage of bytes copied, non-decreasing.
    Progress(u8),
    Finished(InstallOutcome),
}

struct Job {
    options: InstallOptions,
    cancel: CancelFlag,
    events: Sender<InstallEvent>,
}

/// Caller side of a submitted install.
pub struct InstallHandle {
    cancel: CancelFlag,
    events: Receiver<InstallEvent>,
}

impl InstallHandle {
    /// Requests cancellation of the run.
    pub fn cancel(&self) {
        self.cancel.request();
    }

    /// The run's cancellation flag, e.g. for a signal handler.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Blocks until the run finishes, forwarding progress to `on_progress`.
    pub fn wait(self, mut on_progress: impl FnMut(u8)) -> InstallOutcome {
        for event in self.events.iter() {
            match event {
                InstallEvent::Progress(percent) => on_progress(percent),
                InstallEvent::Finished(outcome) => return outcome,
            }
        }
        InstallOutcome::from_error(&InstallError::WorkerStopped)
    }

    /// Next event if one is pending.
    pub fn try_event(&self) -> Option<InstallEvent> {
        self.events.try_recv().ok()
    }
}

/// Runs installs on a single background thread.
pub struct InstallService {
    catalog: Arc<Catalog>,
    cache: Arc<Mutex<FilesMapCache>>,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl InstallService {
    /// Starts the worker for a probed and checked catalog.
    pub fn start(catalog: Arc<Catalog>, host: Host) -> Self {
        let cache = Arc::new(Mutex::new(FilesMapCache::new()));
        let (jobs, queue) = mpsc::channel::<Job>();

        let worker = {
            let catalog = Arc::clone(&catalog);
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for job in queue {
                    let outcome = run_job(&catalog, &host, &cache, &job);
                    // The caller may have dropped its handle
                    let _ = job.events.send(InstallEvent::Finished(outcome));
                }
                debug!("Install worker stopped");
            })
        };

        Self {
            catalog,
            cache,
            jobs: Some(jobs),
            worker: Some(worker),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Queues an install. Unknown and non-installable applications are
    /// rejected here, before any work starts.
    pub fn submit(&self, options: InstallOptions) -> InstallResult<InstallHandle> {
        let app = self.installable_application(&options)?;
        info!(
            application = app.name(),
            destination = %options.destination().display(),
            language = %options.culture(),
            "Install submitted"
        );

        let (events, receiver) = mpsc::channel();
        let cancel = CancelFlag::new();
        let job = Job {
            options,
            cancel: cancel.clone(),
            events,
        };
        self.jobs
            .as_ref()
            .ok_or(InstallError::WorkerStopped)?
            .send(job)
            .map_err(|_| InstallError::WorkerStopped)?;

        Ok(InstallHandle {
            cancel,
            events: receiver,
        })
    }

    /// Bytes an install with `options` would copy.
    ///
    /// `None` when the application is unknown, not installable, or has no
    /// files for the requested language and kinds.
    pub fn files_size(&self, options: &InstallOptions) -> InstallResult<Option<u64>> {
        let Ok(app) = self.installable_application(options) else {
            return Ok(None);
        };

        let map = self.cache.lock().get_or_build(app)?;
        let culture = options.culture();
        if map.query(options.file_types(), &culture).is_empty() {
            return Ok(None);
        }
        Ok(Some(map.files_size(options.file_types(), &culture)?))
    }

    fn installable_application(&self, options: &InstallOptions) -> InstallResult<&Application> {
        let app = self
            .catalog
            .lookup(options.application())
            .ok_or_else(|| InstallError::UnknownApplication(options.application().to_string()))?;
        if !app.check_state().is_installable() {
            return Err(InstallError::NotInstallable(app.name().to_string()));
        }
        Ok(app)
    }
}

impl Drop for InstallService {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            worker.join().ok();
        }
    }
}

fn run_job(catalog: &Catalog, host: &Host, cache: &Mutex<FilesMapCache>, job: &Job) -> InstallOutcome {
    match install(catalog, host, cache, job) {
        Ok(Some(report)) => {
            info!(
                application = %report.application,
                files = report.files_copied,
                bytes = report.bytes_copied,
                "Install finished"
            );
            InstallOutcome::Succeeded(report)
        }
        Ok(None) => {
            info!(application = job.options.application(), "Install cancelled");
            InstallOutcome::Cancelled
        }
        Err(e) => {
            warn!(application = job.options.application(), error = %e, "Install failed");
            InstallOutcome::from_error(&e)
        }
    }
}

/// Runs one install. `Ok(None)` means it stopped on cancellation.
fn install(
    catalog: &Catalog,
    host: &Host,
    cache: &Mutex<FilesMapCache>,
    job: &Job,
) -> InstallResult<Option<InstallReport>> {
    let options = &job.options;
    let cancel = &job.cancel;
    let app = catalog
        .lookup(options.application())
        .ok_or_else(|| InstallError::UnknownApplication(options.application().to_string()))?;
    let culture = options.culture();

    let map = cache.lock().get_or_build(app)?;
    let files = map.query(options.file_types(), &culture);
    let install_dir = options.destination().join(app.install_dir());

    let mut total_bytes = 0u64;
    for file in &files {
        let metadata = fs::metadata(&file.source_path).map_err(|source| CopyError::Io {
            path: file.source_path.clone(),
            source,
        })?;
        total_bytes += metadata.len();
    }
    info!(
        application = app.name(),
        install_dir = %install_dir.display(),
        files = files.len(),
        bytes = total_bytes,
        "Copying files"
    );

    let mut throttle = ProgressThrottle::new(total_bytes);
    let report_progress = |percent: Option<u8>| {
        if let Some(percent) = percent {
            let _ = job.events.send(InstallEvent::Progress(percent));
        }
    };
    report_progress(throttle.emit());

    // Depot paths already start with the install dir, e.g. `common/<game>/...`
    let mut files_copied = 0;
    for file in &files {
        let destination = destination_path(options.destination(), &file.relative_path);
        let policy = if file.kind.is_fix() {
            ExistingFilePolicy::Backup
        } else {
            ExistingFilePolicy::Replace
        };
        debug!(
            file = %file.relative_path,
            depot = file.depot_id,
            kind = ?file.kind,
            version = file.version,
            "Copying file"
        );

        let status = copy_file(&file.source_path, &destination, policy, cancel, &mut |bytes| {
            report_progress(throttle.advance(bytes))
        })?;
        if status == CopyStatus::Cancelled {
            return Ok(None);
        }
        files_copied += 1;
    }
    report_progress(throttle.emit());

    let script = match app.install_script() {
        _ if !options.run_script() => ScriptRun::Disabled,
        None => ScriptRun::NotDeclared,
        Some(name) => {
            let path = install_dir.join(name);
            if !path.is_file() {
                warn!(script = %path.display(), "Install script not found, skipping");
                ScriptRun::Missing(path)
            } else {
                let variables = Variables::new(host.environment.as_ref(), &install_dir);
                let parsed = Script::load(&path, &variables)?;
                let context = ScriptContext {
                    application_id: app.id(),
                    culture,
                    host,
                    cancel,
                };
                let summary = parsed.execute(&context)?;
                if summary.cancelled {
                    return Ok(None);
                }
                ScriptRun::Ran(summary)
            }
        }
    };

    if cancel.is_requested() {
        return Ok(None);
    }

    Ok(Some(InstallReport {
        application: app.name().to_string(),
        install_dir,
        files_copied,
        bytes_copied: throttle.copied_bytes(),
        script,
    }))
}

/// Joins a `/`-separated relative path onto `root`.
fn destination_path(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_path() {
        let root = Path::new("/games");
        assert_eq!(
            destination_path(root, "common/Game/data/maps/a.map"),
            root.join("common").join("Game").join("data").join("maps").join("a.map")
        );
        assert_eq!(destination_path(root, "/common//Game/"), root.join("common").join("Game"));
    }

    #[test]
    fn test_script_run_summary() {
        assert_eq!(ScriptRun::Disabled.summary(), None);
        assert_eq!(ScriptRun::Missing(PathBuf::from("/games/x.vdf")).summary(), None);
        let summary = ScriptSummary::default();
        assert_eq!(ScriptRun::Ran(summary.clone()).summary(), Some(&summary));
    }

    #[test]
    fn test_failed_outcome_has_detail() {
        let outcome = InstallOutcome::from_error(&InstallError::WorkerStopped);
        match outcome {
            InstallOutcome::Failed { message, detail } => {
                assert_eq!(message, "install worker is not running");
                assert_eq!(detail, "WorkerStopped");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
