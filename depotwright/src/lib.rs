//! Depotwright - offline installer for depot-based game backups
//!
//! This library finds depot directories of known applications on local or
//! removable media, decides which of them can be installed, resolves the
//! files to copy for a language (base content, newer versions and fix
//! overlays), copies them into a destination library, and runs the
//! application's install script.
//!
//! The usual flow:
//!
//! 1. Build a [`catalog::Catalog`] (built-in or from JSON).
//! 2. Probe depot roots with [`depot::DepotProber`].
//! 3. Evaluate installability with [`depot::DepotChecker`].
//! 4. Start an [`installer::InstallService`] and submit
//!    [`installer::InstallOptions`].

pub mod catalog;
pub mod config;
pub mod depot;
pub mod files_map;
pub mod host;
pub mod installer;
pub mod logging;
pub mod script;
