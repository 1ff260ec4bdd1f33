//! Locale-code to language-name resolution.

/// Base language codes mapped to the names the translation provider is
/// prompted with.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("ms", "Malay"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sv", "Swedish"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
];

/// Looks up the language name for a locale code, if the base code is known.
///
/// Region and script subtags ("fr-FR", "zh-Hans", "de_DE") are stripped
/// before the lookup.
pub fn lookup_language_name(locale: &str) -> Option<&'static str> {
    let base = locale.split(['-', '_']).next().unwrap_or(locale);
    LANGUAGE_NAMES
        .iter()
        .find(|(code, _)| *code == base)
        .map(|(_, name)| *name)
}

/// Resolves a locale code to a language name, defaulting to "English" for
/// unknown base codes.
pub fn language_name_for(locale: &str) -> &'static str {
    lookup_language_name(locale).unwrap_or("English")
}
