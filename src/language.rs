use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

static CYRILLIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Cyrillic}").expect("cyrillic class"));
static LATIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Latin}").expect("latin class"));

/// Pair used when no candidate languages are configured.
pub const FALLBACK_DIRECTION: (&str, &str) = ("en", "ru");

/// Candidate languages plus optional detection overrides, immutable after load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Ordered language codes, native language first.
    pub codes: Vec<String>,
    /// Code -> regex matching a single character of that language's script.
    pub patterns: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageDirection {
    pub source: String,
    pub target: String,
}

impl LanguageDirection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Script class for codes without an override; anything unknown counts Latin letters.
fn builtin_pattern(code: &str) -> Regex {
    match code {
        "ru" | "uk" | "be" | "bg" | "sr" | "mk" | "kk" => CYRILLIC.clone(),
        _ => LATIN.clone(),
    }
}

/// Picks the translation direction by counting script characters per candidate.
///
/// Patterns are compiled once; a malformed override falls back to the built-in
/// class for that code instead of failing.
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    candidates: Vec<(String, Regex)>,
}

impl LanguageDetector {
    pub fn new(config: &LanguageConfig) -> Self {
        let candidates = config
            .codes
            .iter()
            .map(|code| code.trim().to_lowercase())
            .map(|code| {
                let custom = config
                    .patterns
                    .get(&code)
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty());
                let regex = match custom {
                    Some(pattern) => Regex::new(pattern).unwrap_or_else(|e| {
                        warn!(
                            "Detection pattern for {:?} does not compile ({}); using built-in",
                            code, e
                        );
                        builtin_pattern(&code)
                    }),
                    None => builtin_pattern(&code),
                };
                (code, regex)
            })
            .collect();
        Self { candidates }
    }

    pub fn resolve(&self, text: &str) -> LanguageDirection {
        let Some((first, _)) = self.candidates.first() else {
            return LanguageDirection::new(FALLBACK_DIRECTION.0, FALLBACK_DIRECTION.1);
        };

        // Seeded below any real count so the first candidate wins all ties.
        let mut best = first.as_str();
        let mut best_count: i64 = -1;
        for (code, regex) in &self.candidates {
            let count = regex.find_iter(text).count() as i64;
            if count > best_count {
                best_count = count;
                best = code.as_str();
            }
        }

        let target = self
            .candidates
            .iter()
            .map(|(code, _)| code.as_str())
            .find(|code| *code != best)
            .unwrap_or(if best == "en" { "ru" } else { "en" });

        LanguageDirection::new(best, target)
    }
}

/// One-off resolution without keeping the compiled detector around.
pub fn resolve(text: &str, config: &LanguageConfig) -> LanguageDirection {
    LanguageDetector::new(config).resolve(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(codes: &[&str]) -> LanguageConfig {
        LanguageConfig {
            codes: codes.iter().map(|c| c.to_string()).collect(),
            patterns: HashMap::new(),
        }
    }

    fn dir(s: &str, t: &str) -> LanguageDirection {
        LanguageDirection::new(s, t)
    }

    #[test]
    fn cyrillic_text_goes_to_english() {
        assert_eq!(resolve("Привет мир", &config(&["en", "ru"])), dir("ru", "en"));
    }

    #[test]
    fn latin_text_goes_to_russian() {
        assert_eq!(resolve("Hello world", &config(&["ru", "en"])), dir("en", "ru"));
    }

    #[test]
    fn all_zero_counts_pick_first_candidate() {
        assert_eq!(resolve("12345 !?", &config(&["en", "ru"])), dir("en", "ru"));
        assert_eq!(resolve("", &config(&["ru", "en"])), dir("ru", "en"));
    }

    #[test]
    fn equal_counts_pick_first_candidate() {
        assert_eq!(resolve("ab вг", &config(&["ru", "en"])), dir("ru", "en"));
        assert_eq!(resolve("ab вг", &config(&["en", "ru"])), dir("en", "ru"));
    }

    #[test]
    fn majority_script_wins_in_mixed_text() {
        assert_eq!(
            resolve("Запусти docker контейнер сейчас", &config(&["en", "ru"])),
            dir("ru", "en")
        );
    }

    #[test]
    fn empty_candidate_list_falls_back() {
        assert_eq!(resolve("Привет", &config(&[])), dir("en", "ru"));
    }

    #[test]
    fn single_language_gets_complementary_target() {
        assert_eq!(resolve("hello", &config(&["en"])), dir("en", "ru"));
        assert_eq!(resolve("hallo", &config(&["de"])), dir("de", "en"));
        assert_eq!(resolve("hello", &config(&["en", "en"])), dir("en", "ru"));
    }

    #[test]
    fn codes_are_normalised_to_lowercase() {
        assert_eq!(resolve("Привет", &config(&["EN", " Ru "])), dir("ru", "en"));
    }

    #[test]
    fn override_pattern_is_used() {
        let mut cfg = config(&["en", "de"]);
        cfg.patterns.insert("de".to_string(), "[äöüßÄÖÜ]".to_string());
        // Latin counts every letter, so German only wins on umlaut-heavy text.
        assert_eq!(resolve("Straße", &cfg), dir("en", "de"));
        let mut cfg = config(&["de", "en"]);
        cfg.patterns.insert("en".to_string(), "[w]".to_string());
        assert_eq!(resolve("über öl", &cfg), dir("de", "en"));
    }

    #[test]
    fn blank_override_uses_builtin() {
        let mut cfg = config(&["en", "ru"]);
        cfg.patterns.insert("ru".to_string(), "   ".to_string());
        assert_eq!(resolve("Привет", &cfg), dir("ru", "en"));
    }

    #[test]
    fn malformed_override_degrades_to_builtin() {
        let mut cfg = config(&["en", "ru"]);
        cfg.patterns.insert("ru".to_string(), "[unclosed".to_string());
        assert_eq!(resolve("Привет мир", &cfg), dir("ru", "en"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let cfg = config(&["en", "ru", "uk"]);
        let detector = LanguageDetector::new(&cfg);
        let first = detector.resolve("Доброго ранку, world");
        for _ in 0..10 {
            assert_eq!(detector.resolve("Доброго ранку, world"), first);
        }
    }

    #[test]
    fn unknown_code_defaults_to_latin() {
        assert_eq!(resolve("bonjour", &config(&["ru", "fr"])), dir("fr", "ru"));
    }
}
