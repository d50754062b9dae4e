pub const DEFAULT_LANGUAGE: &str = "en-US";

const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("turkish", "tr-TR"),
    ("türkçe", "tr-TR"),
    ("turkce", "tr-TR"),
    ("tr", "tr-TR"),
    ("english", "en-US"),
    ("en", "en-US"),
    ("spanish", "es-ES"),
    ("español", "es-ES"),
    ("espanol", "es-ES"),
    ("es", "es-ES"),
    ("german", "de-DE"),
    ("deutsch", "de-DE"),
    ("de", "de-DE"),
    ("french", "fr-FR"),
    ("français", "fr-FR"),
    ("francais", "fr-FR"),
    ("fr", "fr-FR"),
];

/// Maps a language name or code to a canonical `xx-XX` code.
///
/// Codes already in canonical form pass through untouched, known names (English and native,
/// any case) are looked up, and everything else falls back to [`DEFAULT_LANGUAGE`]. The
/// output is always canonical, so the function is idempotent.
pub fn normalize_language(input: &str) -> String {
    let trimmed = input.trim();
    if is_canonical_code(trimmed) {
        return trimmed.to_owned();
    }

    let lowered = trimmed.to_lowercase();
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, code)| (*code).to_owned())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_owned())
}

/// `^[a-z]{2}-[A-Z]{2}$`
pub fn is_canonical_code(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 5
        && bytes[0].is_ascii_lowercase()
        && bytes[1].is_ascii_lowercase()
        && bytes[2] == b'-'
        && bytes[3].is_ascii_uppercase()
        && bytes[4].is_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::{is_canonical_code, normalize_language};

    #[test]
    fn english_names_map_case_insensitively() {
        assert_eq!(normalize_language("Turkish"), "tr-TR");
        assert_eq!(normalize_language("ENGLISH"), "en-US");
        assert_eq!(normalize_language("spanish"), "es-ES");
        assert_eq!(normalize_language("German"), "de-DE");
        assert_eq!(normalize_language(" French "), "fr-FR");
    }

    #[test]
    fn native_names_are_aliases() {
        assert_eq!(normalize_language("Türkçe"), "tr-TR");
        assert_eq!(normalize_language("Deutsch"), "de-DE");
        assert_eq!(normalize_language("Español"), "es-ES");
        assert_eq!(normalize_language("Français"), "fr-FR");
    }

    #[test]
    fn canonical_codes_pass_through() {
        assert_eq!(normalize_language("pt-BR"), "pt-BR");
        assert_eq!(normalize_language("tr-TR"), "tr-TR");
    }

    #[test]
    fn unknown_or_malformed_input_defaults_to_english() {
        for input in ["", "Klingon", "EN-us", "en_US", "eng-USA", "🙂"] {
            assert_eq!(normalize_language(input), "en-US", "input {input:?}");
        }
    }

    #[test]
    fn normalizing_twice_equals_normalizing_once() {
        for input in
            ["Turkish", "türkçe", "pt-BR", "xx", "", "Deutsch", "en-US", "FRENCH", "de_DE", "  es  "]
        {
            let once = normalize_language(input);
            assert!(is_canonical_code(&once), "{once} should be canonical");
            assert_eq!(normalize_language(&once), once, "input {input:?}");
        }
    }
}
