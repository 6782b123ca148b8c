//! Languages supported by the multilingual model.

use serde::Serialize;

use crate::error::{Error, Result};

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

impl Language {
    const fn new(code: &'static str, name: &'static str) -> Self {
        Self { code, name }
    }

    /// Dropdown label, e.g. `English (en)`.
    pub fn choice_label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

static SUPPORTED_LANGUAGES: [Language; 23] = [
    Language::new("ar", "Arabic"),
    Language::new("da", "Danish"),
    Language::new("de", "German"),
    Language::new("el", "Greek"),
    Language::new("en", "English"),
    Language::new("es", "Spanish"),
    Language::new("fi", "Finnish"),
    Language::new("fr", "French"),
    Language::new("he", "Hebrew"),
    Language::new("hi", "Hindi"),
    Language::new("it", "Italian"),
    Language::new("ja", "Japanese"),
    Language::new("ko", "Korean"),
    Language::new("ms", "Malay"),
    Language::new("nl", "Dutch"),
    Language::new("no", "Norwegian"),
    Language::new("pl", "Polish"),
    Language::new("pt", "Portuguese"),
    Language::new("ru", "Russian"),
    Language::new("sv", "Swedish"),
    Language::new("sw", "Swahili"),
    Language::new("tr", "Turkish"),
    Language::new("zh", "Chinese"),
];

pub fn supported_languages() -> &'static [Language] {
    &SUPPORTED_LANGUAGES
}

pub fn lookup(code: &str) -> Option<Language> {
    let code = code.trim();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| lang.code.eq_ignore_ascii_case(code))
        .copied()
}

pub fn resolve(code: &str) -> Result<Language> {
    lookup(code).ok_or_else(|| Error::UnsupportedLanguage(code.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_twenty_three_unique_codes() {
        let mut codes: Vec<_> = supported_languages().iter().map(|l| l.code).collect();
        assert_eq!(codes.len(), 23);
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 23);
    }

    #[test]
    fn lookup_is_case_insensitive_and_trims() {
        assert_eq!(lookup(" HI ").map(|l| l.name), Some("Hindi"));
        assert_eq!(lookup("zh").map(|l| l.name), Some("Chinese"));
        assert!(lookup("xx").is_none());
    }

    #[test]
    fn resolve_reports_unknown_code() {
        let err = resolve("klingon").unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage(code) if code == "klingon"));
    }

    #[test]
    fn choice_label_matches_dropdown_format() {
        assert_eq!(resolve(DEFAULT_LANGUAGE).unwrap().choice_label(), "English (en)");
    }
}
