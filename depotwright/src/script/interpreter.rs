//! Execution of `InstallScript` commands.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::catalog::Culture;
use crate::host::{Host, RegistryValue, RegistryView};
use crate::installer::{copy_directory, CancelFlag, ExistingFilePolicy};

use super::tree::ScriptNode;
use super::ScriptError;

/// How often a running setup process is polled.
pub const PROCESS_POLL_INTERVAL: Duration = Duration::from_millis(200);

const INSTALL_SCRIPT: &str = "InstallScript";
const REGISTRY: &str = "Registry";
const RUN_PROCESS: &str = "Run Process";
const COPY_FOLDERS: &str = "Copy Folders";

/// Everything a script run needs besides the script itself.
pub struct ScriptContext<'a> {
    pub application_id: u32,
    /// Selects language-keyed registry values by English name.
    pub culture: Culture,
    pub host: &'a Host,
    pub cancel: &'a CancelFlag,
}

/// Effects of one script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub registry_values: usize,
    pub processes_run: usize,
    /// Processes not started because their marker was already set.
    pub processes_skipped: usize,
    pub folders_copied: usize,
    /// Execution stopped early on a cancellation request.
    pub cancelled: bool,
}

/// Walks a parsed script and applies its commands.
pub(crate) struct Interpreter<'a> {
    script_name: &'a str,
    context: &'a ScriptContext<'a>,
    summary: ScriptSummary,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(script_name: &'a str, context: &'a ScriptContext<'a>) -> Self {
        Self {
            script_name,
            context,
            summary: ScriptSummary::default(),
        }
    }

    pub(crate) fn run(mut self, root: &ScriptNode) -> Result<ScriptSummary, ScriptError> {
        for script in root
            .children()
            .iter()
            .filter(|node| node.name().eq_ignore_ascii_case(INSTALL_SCRIPT))
        {
            self.execute_install_script(script)?;
            if self.summary.cancelled {
                break;
            }
        }

        info!(
            script = self.script_name,
            registry_values = self.summary.registry_values,
            processes_run = self.summary.processes_run,
            processes_skipped = self.summary.processes_skipped,
            folders_copied = self.summary.folders_copied,
            cancelled = self.summary.cancelled,
            "Install script finished"
        );
        Ok(self.summary)
    }

    fn stop_requested(&mut self) -> bool {
        if self.context.cancel.is_requested() {
            self.summary.cancelled = true;
        }
        self.summary.cancelled
    }

    fn execute_install_script(&mut self, node: &ScriptNode) -> Result<(), ScriptError> {
        for command in node.children() {
            if self.stop_requested() {
                break;
            }

            let name = command.name();
            if name.eq_ignore_ascii_case(REGISTRY) {
                self.execute_registry(command)?;
            } else if name.eq_ignore_ascii_case(RUN_PROCESS) {
                self.execute_run_process(command)?;
            } else if name.eq_ignore_ascii_case(COPY_FOLDERS) {
                self.execute_copy_folders(command)?;
            } else {
                debug!(command = name, "Ignoring unsupported script command");
            }
        }
        Ok(())
    }

    fn execute_registry(&mut self, node: &ScriptNode) -> Result<(), ScriptError> {
        let registry = &self.context.host.registry;

        for key_node in node.children() {
            let key = registry.create_key(key_node.name(), RegistryView::Registry32)?;

            for kind_node in key_node.children() {
                let kind = kind_node.name();

                for value_node in kind_node.children() {
                    let Some(first) = value_node.first() else {
                        continue;
                    };

                    // A nested value is keyed by language name
                    let entry = if first.has_children() {
                        if value_node
                            .name()
                            .eq_ignore_ascii_case(self.context.culture.english_name())
                        {
                            first
                        } else {
                            continue;
                        }
                    } else {
                        value_node
                    };

                    let Some(data) = entry.value() else {
                        continue;
                    };
                    let value = if kind.eq_ignore_ascii_case("string") {
                        RegistryValue::String(data.to_string())
                    } else if kind.eq_ignore_ascii_case("dword") {
                        match data.trim().parse::<i32>() {
                            Ok(number) => RegistryValue::DWord(number as u32),
                            Err(_) => {
                                warn!(key = %key, name = entry.name(), data, "Skipping non-numeric dword value");
                                continue;
                            }
                        }
                    } else {
                        debug!(kind, "Skipping registry value of unsupported kind");
                        continue;
                    };

                    registry.set_value(&key, entry.name(), value)?;
                    self.summary.registry_values += 1;
                }
            }
        }
        Ok(())
    }

    fn execute_run_process(&mut self, node: &ScriptNode) -> Result<(), ScriptError> {
        let host = self.context.host;

        for entry in node.children() {
            if self.stop_requested() {
                return Ok(());
            }

            let mut marker_key = format!(
                "HKEY_LOCAL_MACHINE\\Software\\Valve\\Steam\\Apps\\{}",
                self.context.application_id
            );
            let mut image = None;
            let mut command_line = None;
            let mut no_cleanup = true;
            let mut ignore_exit_code = false;

            for option in entry.children() {
                let Some(value) = option.value() else {
                    continue;
                };
                let name = option.name();
                if name.eq_ignore_ascii_case("HasRunKey") {
                    marker_key = value.to_string();
                } else if name.eq_ignore_ascii_case("process 1") {
                    image = Some(value);
                } else if name.eq_ignore_ascii_case("command 1") {
                    command_line = Some(value);
                } else if name.eq_ignore_ascii_case("NoCleanUp") {
                    no_cleanup = parse_bool(name, value)?;
                } else if name.eq_ignore_ascii_case("IgnoreExitCode") {
                    ignore_exit_code = parse_bool(name, value)?;
                }
            }

            let Some(image) = image.filter(|image| !image.is_empty()) else {
                warn!(entry = entry.name(), "Run Process entry without a process image");
                continue;
            };
            if marker_key.is_empty() {
                continue;
            }

            let key = host
                .registry
                .create_key(&marker_key, RegistryView::Registry32)?;
            // Only a missing value or a DWORD other than 1 lets the process run
            let already_ran = match host.registry.get_value(&key, entry.name())? {
                None => false,
                Some(RegistryValue::DWord(value)) => value == 1,
                Some(RegistryValue::String(_)) => true,
            };
            if already_ran {
                debug!(entry = entry.name(), key = %key, "Process already ran");
                self.summary.processes_skipped += 1;
                continue;
            }

            let image = host_path(image);
            let args = command_line.filter(|line| !line.is_empty());
            info!(image = %image.display(), args, no_cleanup, "Running setup process");
            let mut process = host.processes.start(&image, args)?;

            let io_error = |source| ScriptError::Io {
                path: image.clone(),
                source,
            };
            let exited = loop {
                if process.wait_timeout(PROCESS_POLL_INTERVAL).map_err(io_error)? {
                    break true;
                }
                if self.context.cancel.is_requested() {
                    break false;
                }
            };

            if !exited {
                warn!(image = %image.display(), "Killing setup process on cancellation");
                process.kill().map_err(io_error)?;
                self.summary.cancelled = true;
                return Ok(());
            }

            let exit_code = process.exit_code().unwrap_or(-1);
            if exit_code != 0 && !ignore_exit_code {
                self.context.cancel.request();
                return Err(ScriptError::ProcessFailed {
                    process: image,
                    exit_code,
                    script: self.script_name.to_string(),
                });
            }

            host.registry
                .set_value(&key, entry.name(), RegistryValue::DWord(1))?;
            self.summary.processes_run += 1;
        }
        Ok(())
    }

    fn execute_copy_folders(&mut self, node: &ScriptNode) -> Result<(), ScriptError> {
        for entry in node.children() {
            if self.stop_requested() {
                return Ok(());
            }

            let source = entry.child("SrcFolder 1").and_then(ScriptNode::value);
            let destination = entry.child("DstFolder 1").and_then(ScriptNode::value);
            let (Some(source), Some(destination)) = (source, destination) else {
                warn!(entry = entry.name(), "Copy Folders entry without source or destination");
                continue;
            };
            if source.is_empty() || destination.is_empty() {
                continue;
            }

            let (source, destination) = (host_path(source), host_path(destination));
            debug!(source = %source.display(), destination = %destination.display(), "Copying folder");
            let copied = copy_directory(
                &source,
                &destination,
                ExistingFilePolicy::Replace,
                self.context.cancel,
            )?;

            if copied.cancelled {
                self.summary.cancelled = true;
                return Ok(());
            }
            self.summary.folders_copied += 1;
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ScriptError> {
    match value.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(ScriptError::InvalidBoolean {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Script paths are written with `\`; use the host separator instead.
fn host_path(value: &str) -> PathBuf {
    PathBuf::from(value.replace('\\', std::path::MAIN_SEPARATOR_STR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("NoCleanUp", "1").unwrap());
        assert!(!parse_bool("NoCleanUp", " 0 ").unwrap());
        assert!(matches!(
            parse_bool("IgnoreExitCode", "yes"),
            Err(ScriptError::InvalidBoolean { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_host_path_separators() {
        assert_eq!(host_path("C:\\Games\\x.exe"), PathBuf::from("C:/Games/x.exe"));
        assert_eq!(host_path("/already/ok"), PathBuf::from("/already/ok"));
    }
}
