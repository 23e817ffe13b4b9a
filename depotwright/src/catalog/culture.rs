//! Languages known to the catalog.
//!
//! Depots declare which languages they carry. A [`Culture`] is a small,
//! copyable record with the ISO-639 code, the English name (used to select
//! language-keyed values in install scripts) and the native name shown to
//! users next to the English one.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A language a depot can be localized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Culture {
    code: &'static str,
    english_name: &'static str,
    native_name: &'static str,
}

/// Every culture the catalog can refer to, invariant first.
const KNOWN_CULTURES: &[Culture] = &[
    Culture::INVARIANT,
    Culture::new("en", "English", "English"),
    Culture::new("fr", "French", "français"),
    Culture::new("it", "Italian", "italiano"),
    Culture::new("de", "German", "Deutsch"),
    Culture::new("es", "Spanish", "español"),
    Culture::new("ru", "Russian", "русский"),
    Culture::new("ja", "Japanese", "日本語"),
    Culture::new("cs", "Czech", "čeština"),
    Culture::new("pl", "Polish", "polski"),
];

impl Culture {
    /// Language-neutral culture: content that applies to every language.
    pub const INVARIANT: Culture = Culture::new("", "Invariant Language", "Invariant Language");

    const fn new(code: &'static str, english_name: &'static str, native_name: &'static str) -> Self {
        Self {
            code,
            english_name,
            native_name,
        }
    }

    /// ISO-639 two-letter code (empty for the invariant culture).
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// English name, e.g. `German`.
    pub fn english_name(&self) -> &'static str {
        self.english_name
    }

    /// Name in the language itself, e.g. `Deutsch`.
    pub fn native_name(&self) -> &'static str {
        self.native_name
    }

    /// Whether this is the language-neutral culture.
    pub fn is_invariant(&self) -> bool {
        self.code.is_empty()
    }

    /// User-facing label: `German (Deutsch)`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.english_name, self.native_name)
    }

    /// All cultures known to the catalog, invariant first.
    pub fn all() -> &'static [Culture] {
        KNOWN_CULTURES
    }

    /// Look up a culture by code, English name or display name.
    ///
    /// Matching is case-insensitive. The invariant culture is found by the
    /// code `invariant` or by its English name.
    pub fn find(text: &str) -> Option<Culture> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("invariant") {
            return Some(Culture::INVARIANT);
        }
        if text.is_empty() {
            return None;
        }

        KNOWN_CULTURES.iter().copied().find(|culture| {
            (!culture.code.is_empty() && culture.code.eq_ignore_ascii_case(text))
                || culture.english_name.eq_ignore_ascii_case(text)
                || culture.display_name().to_lowercase() == text.to_lowercase()
        })
    }
}

impl fmt::Display for Culture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invariant() {
            write!(f, "invariant")
        } else {
            write!(f, "{}", self.code)
        }
    }
}

impl Serialize for Culture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Culture {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Culture::find(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown culture '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_code() {
        let culture = Culture::find("de").unwrap();
        assert_eq!(culture.english_name(), "German");
        assert_eq!(culture.native_name(), "Deutsch");
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(Culture::find("RU").unwrap().code(), "ru");
        assert_eq!(Culture::find("polish").unwrap().code(), "pl");
    }

    #[test]
    fn test_find_by_display_name() {
        let culture = Culture::find("French (français)").unwrap();
        assert_eq!(culture.code(), "fr");
    }

    #[test]
    fn test_find_invariant() {
        assert!(Culture::find("invariant").unwrap().is_invariant());
        assert!(Culture::find("Invariant Language").unwrap().is_invariant());
    }

    #[test]
    fn test_find_unknown() {
        assert!(Culture::find("klingon").is_none());
        assert!(Culture::find("").is_none());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Culture::find("en").unwrap().display_name(), "English (English)");
    }

    #[test]
    fn test_serde_uses_code() {
        let json = serde_json::to_string(&Culture::find("it").unwrap()).unwrap();
        assert_eq!(json, "\"it\"");
        let back: Culture = serde_json::from_str(&json).unwrap();
        assert_eq!(back.english_name(), "Italian");
        let invariant: Culture = serde_json::from_str("\"invariant\"").unwrap();
        assert!(invariant.is_invariant());
    }
}
