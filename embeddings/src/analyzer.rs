//! Text analysis: lowercasing, tokenization, stop words and word n-grams.

use std::collections::HashSet;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// Configuration for turning text into terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Lowercase text before tokenizing.
    pub lowercase: bool,

    /// Regular expression matching a token. When unset, a token is a run of
    /// two or more word characters: alphanumerics, `_` and combining marks.
    pub token_pattern: Option<String>,

    /// Inclusive range of word n-gram sizes.
    pub ngram_range: (usize, usize),

    /// Tokens removed before n-grams are built.
    pub stop_words: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            token_pattern: None,
            ngram_range: (1, 1),
            stop_words: Vec::new(),
        }
    }
}

/// Compiled form of [`AnalyzerConfig`].
#[derive(Debug, Clone)]
pub struct Analyzer {
    lowercase: bool,
    pattern: Option<Regex>,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
}

impl Analyzer {
    /// Compile an analyzer, validating the configuration.
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let (min_n, max_n) = config.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(EmbeddingError::InvalidConfig(format!(
                "ngram_range ({min_n}, {max_n}) must satisfy 1 <= min_n <= max_n"
            )));
        }

        let pattern = config
            .token_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| EmbeddingError::InvalidConfig(format!("token_pattern: {e}")))?;

        let stop_words = config
            .stop_words
            .iter()
            .map(|w| {
                if config.lowercase {
                    w.to_lowercase()
                } else {
                    w.clone()
                }
            })
            .collect();

        Ok(Self {
            lowercase: config.lowercase,
            pattern,
            ngram_range: config.ngram_range,
            stop_words,
        })
    }

    /// Split text into terms (tokens and n-grams).
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let tokens: Vec<String> = self
            .tokenize(&text)
            .into_iter()
            .filter(|t| !self.stop_words.contains(t))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        if (min_n, max_n) == (1, 1) {
            return tokens;
        }

        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n == 1 {
                terms.extend(tokens.iter().cloned());
                continue;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        match &self.pattern {
            Some(re) => re.find_iter(text).map(|m| m.as_str().to_string()).collect(),
            None => text
                .split(|c: char| !is_word_char(c))
                .filter(|t| t.chars().count() >= 2)
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Alphanumerics, `_` and the common combining diacritic blocks, so that
/// decomposed accents stay inside their word.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
        || c == '_'
        || matches!(
            c,
            '\u{0300}'..='\u{036F}'
                | '\u{1AB0}'..='\u{1AFF}'
                | '\u{1DC0}'..='\u{1DFF}'
                | '\u{20D0}'..='\u{20FF}'
                | '\u{FE20}'..='\u{FE2F}'
        )
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            lowercase: true,
            pattern: None,
            ngram_range: (1, 1),
            stop_words: HashSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_tokenization() {
        let analyzer = Analyzer::default();
        assert_eq!(
            analyzer.analyze("What's your name, QnA_Bot?"),
            vec!["what", "your", "name", "qna_bot"]
        );
    }

    #[test]
    fn test_single_characters_are_dropped() {
        let analyzer = Analyzer::default();
        assert!(analyzer.analyze("a b ? !").is_empty());
    }

    #[test]
    fn test_unicode_words() {
        let analyzer = Analyzer::default();
        assert_eq!(analyzer.analyze("Café déjà vu"), vec!["café", "déjà", "vu"]);
    }

    #[test]
    fn test_combining_marks_stay_in_word() {
        let analyzer = Analyzer::default();
        assert_eq!(
            analyzer.analyze("Cafe\u{0301} noir"),
            vec!["cafe\u{0301}", "noir"]
        );
    }

    #[test]
    fn test_case_preserved_when_disabled() {
        let analyzer = Analyzer::new(&AnalyzerConfig {
            lowercase: false,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(analyzer.analyze("Who ARE you"), vec!["Who", "ARE", "you"]);
    }

    #[test]
    fn test_stop_words() {
        let analyzer = Analyzer::new(&AnalyzerConfig {
            stop_words: vec!["Are".to_string()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(analyzer.analyze("who are you"), vec!["who", "you"]);
    }

    #[test]
    fn test_ngrams() {
        let analyzer = Analyzer::new(&AnalyzerConfig {
            ngram_range: (1, 2),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            analyzer.analyze("who are you"),
            vec!["who", "are", "you", "who are", "are you"]
        );
    }

    #[test]
    fn test_custom_token_pattern() {
        let analyzer = Analyzer::new(&AnalyzerConfig {
            token_pattern: Some(r"[a-z]+".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(analyzer.analyze("I am 42"), vec!["i", "am"]);
    }

    #[test]
    fn test_invalid_config() {
        let bad_range = Analyzer::new(&AnalyzerConfig {
            ngram_range: (2, 1),
            ..Default::default()
        });
        assert!(bad_range.unwrap_err().is_configuration());

        let bad_pattern = Analyzer::new(&AnalyzerConfig {
            token_pattern: Some("(".to_string()),
            ..Default::default()
        });
        assert!(bad_pattern.unwrap_err().is_configuration());
    }
}
