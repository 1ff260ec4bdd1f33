//! The fixed catalog of App Store locales this tool populates.

use crate::truncate::KEYWORD_LIMIT;

/// A locale the sync run attempts to populate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLocale {
    /// App Store locale code (e.g. "fr-FR").
    pub code: &'static str,
    /// Language name handed to the translation provider.
    pub display_name: &'static str,
    /// Keyword budget for this locale.
    pub keyword_limit: usize,
}

/// Every locale the store accepts that this tool targets, in the order runs
/// iterate them.
const TARGET_LOCALES: &[(&str, &str)] = &[
    ("it", "Italian"),
    ("fi", "Finnish"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sv", "Swedish"),
    ("sk", "Slovak"),
    ("ms", "Malay"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("ar-SA", "Arabic"),
    ("ca", "Catalan"),
    ("zh-Hans", "Chinese (Simplified)"),
    ("zh-Hant", "Chinese (Traditional)"),
    ("hr", "Croatian"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("nl-NL", "Dutch"),
    ("en-AU", "English (Australia)"),
    ("en-CA", "English (Canada)"),
    ("en-GB", "English (U.K.)"),
    ("fr-FR", "French"),
    ("fr-CA", "French (Canada)"),
    ("de-DE", "German"),
    ("el", "Greek"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("pt-BR", "Portuguese (Brazil)"),
    ("pt-PT", "Portuguese (Portugal)"),
    ("es-MX", "Spanish (Mexico)"),
    ("es-ES", "Spanish (Spain)"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
];

/// Builds the default catalog.
///
/// The returned table is immutable for a run and is handed to the engine as
/// configuration; iteration order is the table's order, not sorted.
pub fn default_catalog() -> Vec<TargetLocale> {
    TARGET_LOCALES
        .iter()
        .map(|&(code, display_name)| TargetLocale {
            code,
            display_name,
            keyword_limit: KEYWORD_LIMIT,
        })
        .collect()
}
