//! Install scripts.
//!
//! An install script is a brace-structured key/value file that describes
//! what to do after the files are copied: registry values to write, setup
//! processes to run once, and folders to copy. Parsing happens in two steps,
//! [`tokenize`] then tree construction, with placeholder substitution applied
//! to every value. [`Script::execute`] then applies the `InstallScript`
//! commands through the [`Host`](crate::host::Host) collaborators.
//!
//! ```text
//! "InstallScript"
//! {
//!     "Registry"
//!     {
//!         "HKEY_LOCAL_MACHINE\\Software\\Game"
//!         {
//!             "string" { "InstallPath" "%INSTALLDIR%" }
//!         }
//!     }
//! }
//! ```

mod error;
mod interpreter;
mod substitute;
mod token;
mod tree;

use std::path::Path;

use tracing::debug;

pub use error::ScriptError;
pub use interpreter::{ScriptContext, ScriptSummary, PROCESS_POLL_INTERVAL};
pub use substitute::{unescape, Variables};
pub use token::{tokenize, Token, TokenKind};
pub use tree::ScriptNode;

/// A parsed install script.
#[derive(Debug, Clone)]
pub struct Script {
    file_name: String,
    root: ScriptNode,
}

impl Script {
    /// Parses `source`. `file_name` is used in syntax errors and as the name
    /// of the root node.
    pub fn parse(file_name: &str, source: &str, variables: &Variables) -> Result<Self, ScriptError> {
        let tokens = tokenize(file_name, source)?;
        let root = tree::build_tree(file_name, file_name, &tokens, variables)?;
        debug!(file = file_name, tokens = tokens.len(), "Parsed install script");

        Ok(Self {
            file_name: file_name.to_string(),
            root,
        })
    }

    /// Reads and parses the script at `path`.
    pub fn load(path: &Path, variables: &Variables) -> Result<Self, ScriptError> {
        let bytes = std::fs::read(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Older scripts are not always valid UTF-8
        let source = String::from_utf8_lossy(&bytes);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::parse(&file_name, &source, variables)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Root node; its children are the top-level keys of the file.
    pub fn root(&self) -> &ScriptNode {
        &self.root
    }

    /// Runs every `InstallScript` block of the file.
    pub fn execute(&self, context: &ScriptContext<'_>) -> Result<ScriptSummary, ScriptError> {
        interpreter::Interpreter::new(&self.file_name, context).run(&self.root)
    }
}
