//! JSON catalog files.
//!
//! A catalog file carries the same information as the built-in table, so new
//! applications can be described without rebuilding:
//!
//! ```json
//! {
//!   "applications": [
//!     {
//!       "id": 9200,
//!       "name": "RAGE",
//!       "install_dir": "RAGE",
//!       "install_script": "installscript.vdf",
//!       "depots": [
//!         { "id": 9201, "name": "RAGEDepot", "base_name": "RAGEDepot",
//!           "optional": false, "cultures": ["invariant"] }
//!       ],
//!       "shared_files": [
//!         { "path": "common/rage/base/english.streamed", "source": 9202, "clients": [9208] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::culture::Culture;
use super::model::{Application, CheckRule, Depot, SharedFile};
use super::CatalogError;

/// Root of a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub applications: Vec<ApplicationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationEntry {
    pub id: u32,
    pub name: String,
    /// Folder name under `common/`.
    pub install_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_script: Option<String>,
    pub depots: Vec<DepotEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_files: Vec<SharedFileEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_rule: Option<CheckRuleEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepotEntry {
    pub id: u32,
    pub name: String,
    pub base_name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub cultures: Vec<Culture>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedFileEntry {
    pub path: String,
    pub source: u32,
    pub clients: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRuleEntry {
    RequireFiles { depots: Vec<u32>, files: Vec<String> },
}

impl CatalogFile {
    /// Convert into applications, validating depot references.
    pub fn into_applications(self) -> Result<Vec<Application>, CatalogError> {
        let mut seen = HashSet::new();
        let mut apps = Vec::with_capacity(self.applications.len());

        for entry in self.applications {
            if !seen.insert(entry.id) {
                return Err(CatalogError::DuplicateApplication(entry.id));
            }
            apps.push(entry.into_application()?);
        }

        Ok(apps)
    }

    /// Describe existing applications, e.g. to export the built-in table.
    pub fn from_applications(apps: &[Application]) -> Self {
        let applications = apps
            .iter()
            .map(|app| ApplicationEntry {
                id: app.id(),
                name: app.name().to_string(),
                install_dir: app
                    .install_dir()
                    .strip_prefix("common/")
                    .unwrap_or(app.install_dir())
                    .to_string(),
                install_script: app.install_script().map(str::to_string),
                depots: app
                    .depots()
                    .iter()
                    .map(|depot| DepotEntry {
                        id: depot.id(),
                        name: depot.name().to_string(),
                        base_name: depot.base_name().to_string(),
                        optional: depot.is_optional(),
                        cultures: depot.cultures().to_vec(),
                    })
                    .collect(),
                shared_files: app
                    .shared_files()
                    .iter()
                    .map(|shared| SharedFileEntry {
                        path: shared.relative_path().to_string(),
                        source: shared.source(),
                        clients: shared.clients().to_vec(),
                    })
                    .collect(),
                check_rule: match app.check_rule() {
                    CheckRule::Default => None,
                    CheckRule::RequireFiles { depots, files } => {
                        Some(CheckRuleEntry::RequireFiles {
                            depots: depots.clone(),
                            files: files.clone(),
                        })
                    }
                },
                custom: app.custom().cloned(),
            })
            .collect();

        Self { applications }
    }
}

impl ApplicationEntry {
    fn into_application(self) -> Result<Application, CatalogError> {
        let application = self.id;
        let mut app = Application::new(self.id, self.name, &self.install_dir, self.install_script);

        let mut depot_ids = HashSet::new();
        for depot in self.depots {
            if !depot_ids.insert(depot.id) {
                return Err(CatalogError::DuplicateDepot {
                    application,
                    depot: depot.id,
                });
            }
            app = app.with_depot(Depot::new(
                depot.id,
                depot.name,
                depot.base_name,
                depot.optional,
                depot.cultures,
            ));
        }

        let check_depot = |depot: u32| {
            if depot_ids.contains(&depot) {
                Ok(())
            } else {
                Err(CatalogError::UnknownDepot { application, depot })
            }
        };

        for shared in self.shared_files {
            check_depot(shared.source)?;
            for client in &shared.clients {
                check_depot(*client)?;
            }
            app = app.with_shared_file(SharedFile::new(shared.path, shared.source, shared.clients));
        }

        if let Some(CheckRuleEntry::RequireFiles { depots, files }) = self.check_rule {
            for depot in &depots {
                check_depot(*depot)?;
            }
            app = app.with_check_rule(CheckRule::RequireFiles { depots, files });
        }

        if let Some(custom) = self.custom {
            app = app.with_custom(custom);
        }

        Ok(app)
    }
}
