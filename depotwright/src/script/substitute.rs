//! Placeholder substitution and escape handling for script values.

use std::path::Path;

use crate::host::{HostEnvironment, SpecialFolder};

/// Placeholders recognized in script values.
const PLACEHOLDERS: &[&str] = &[
    "%ALLUSERSPROFILE%",
    "%CDKEY%",
    "%INSTALLDIR%",
    "%SYSTEMROOT%",
    "%TEMP%",
    "%USERPROFILE%",
    "%USER_MYDOCS%",
    "%WINDIR%",
];

/// Values of the placeholders for one script run.
#[derive(Debug, Clone)]
pub struct Variables {
    /// Replacement per entry of `PLACEHOLDERS`; `None` leaves it literal.
    values: Vec<Option<String>>,
}

impl Variables {
    /// Resolves placeholders against `environment` and the install directory.
    pub fn new(environment: &dyn HostEnvironment, install_dir: &Path) -> Self {
        let folder = |folder: SpecialFolder| {
            environment
                .special_folder(folder)
                .map(|path| path.to_string_lossy().into_owned())
        };

        let values = PLACEHOLDERS
            .iter()
            .map(|placeholder| match *placeholder {
                "%ALLUSERSPROFILE%" => folder(SpecialFolder::CommonDocuments),
                "%INSTALLDIR%" => Some(install_dir.to_string_lossy().into_owned()),
                "%SYSTEMROOT%" | "%WINDIR%" => folder(SpecialFolder::Windows),
                "%TEMP%" => folder(SpecialFolder::Temp),
                "%USERPROFILE%" => folder(SpecialFolder::UserProfile),
                "%USER_MYDOCS%" => folder(SpecialFolder::MyDocuments),
                // %CDKEY% has no source
                _ => None,
            })
            .collect();

        Self { values }
    }

    /// Replaces placeholders in `raw`, then resolves backslash escapes.
    pub fn expand(&self, raw: &str) -> String {
        unescape(&self.substitute(raw))
    }

    /// Replaces placeholders left to right, ignoring case. Inserted text is
    /// not scanned again.
    pub fn substitute(&self, raw: &str) -> String {
        // ASCII lowercasing keeps byte offsets aligned with `raw`
        let lower = raw.to_ascii_lowercase();
        let mut result = String::with_capacity(raw.len());
        let mut cursor = 0;

        while cursor < raw.len() {
            let found = PLACEHOLDERS
                .iter()
                .enumerate()
                .filter_map(|(index, placeholder)| {
                    lower[cursor..]
                        .find(&placeholder.to_ascii_lowercase())
                        .map(|offset| (cursor + offset, index))
                })
                .min();

            let Some((start, index)) = found else { break };
            let end = start + PLACEHOLDERS[index].len();
            result.push_str(&raw[cursor..start]);
            match &self.values[index] {
                Some(value) => result.push_str(value),
                None => result.push_str(&raw[start..end]),
            }
            cursor = end;
        }

        result.push_str(&raw[cursor..]);
        result
    }
}

/// Resolves `\a \b \f \n \r \t \v \' \" \\`. Unknown escapes and a trailing
/// backslash are kept as written.
pub fn unescape(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        let escaped = match chars.peek() {
            Some('a') => '\x07',
            Some('b') => '\x08',
            Some('f') => '\x0c',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('v') => '\x0b',
            Some('\'') => '\'',
            Some('"') => '"',
            Some('\\') => '\\',
            _ => {
                result.push(c);
                continue;
            }
        };
        chars.next();
        result.push(escaped);
    }

    result
}
