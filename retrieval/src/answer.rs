//! Turning a best match into an answer.

use qnabot_kb::{KnowledgeBase, KnowledgeBaseError};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The answer to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Chosen answer text.
    pub text: String,

    /// Score of the best matching paraphrase.
    pub score: f32,

    /// Entry the best matching paraphrase belongs to.
    pub entry: usize,

    /// Whether the score fell below the threshold and a fallback answer was
    /// chosen instead of one of the entry's answers.
    pub fallback: bool,
}

/// Picks an answer for a match, falling back when the score is too low.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSelector {
    min_score: f32,
}

impl AnswerSelector {
    pub fn new(min_score: f32) -> Self {
        Self { min_score }
    }

    /// Threshold below which the fallback answers are used.
    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    /// Whether `score` is high enough to answer from the matched entry.
    pub fn is_confident(&self, score: f32) -> bool {
        score >= self.min_score
    }

    /// Draw one answer uniformly from the matched entry, or from the fallback
    /// answers when `score` is below the threshold.
    pub fn select<R: Rng + ?Sized>(
        &self,
        kb: &KnowledgeBase,
        entry: usize,
        score: f32,
        rng: &mut R,
    ) -> Result<Answer> {
        let fallback = !self.is_confident(score);

        let (candidates, field) = if fallback {
            (kb.fallback_answers.as_slice(), "idk_answers".to_string())
        } else {
            let answers = kb
                .entry(entry)
                .map(|e| e.answers.as_slice())
                .unwrap_or_default();
            (answers, format!("qna[{entry}].a"))
        };

        let text = candidates
            .choose(rng)
            .cloned()
            .ok_or_else(|| KnowledgeBaseError::Schema(format!("{field} must not be empty")))?;

        Ok(Answer {
            text,
            score,
            entry,
            fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builder("answers")
            .entry(["Who are you?"], ["I am QnA Bot!"])
            .entry(["Hi"], ["Hello!", "Hi there!", "Hey!"])
            .fallback_answer("I don't understand")
            .build()
            .unwrap()
    }

    #[test]
    fn test_score_at_threshold_answers_from_entry() {
        let selector = AnswerSelector::new(0.4);
        let mut rng = StdRng::seed_from_u64(0);

        let answer = selector.select(&kb(), 0, 0.4, &mut rng).unwrap();
        assert_eq!(
            answer,
            Answer {
                text: "I am QnA Bot!".to_string(),
                score: 0.4,
                entry: 0,
                fallback: false,
            }
        );
    }

    #[test]
    fn test_score_below_threshold_falls_back() {
        let selector = AnswerSelector::new(0.4);
        let mut rng = StdRng::seed_from_u64(0);

        let answer = selector.select(&kb(), 0, 0.399, &mut rng).unwrap();
        assert_eq!(answer.text, "I don't understand");
        assert_eq!(answer.entry, 0);
        assert!(answer.fallback);
    }

    #[test]
    fn test_negative_cosine_falls_back() {
        let selector = AnswerSelector::new(0.0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(selector.select(&kb(), 1, -0.2, &mut rng).unwrap().fallback);
    }

    #[test]
    fn test_answers_come_from_matched_entry() {
        let kb = kb();
        let selector = AnswerSelector::new(0.25);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            let answer = selector.select(&kb, 1, 0.9, &mut rng).unwrap();
            assert!(kb.entries[1].answers.contains(&answer.text));
        }
    }

    #[test]
    fn test_same_seed_same_choices() {
        let kb = kb();
        let selector = AnswerSelector::new(0.25);
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..10)
                .map(|_| selector.select(&kb, 1, 1.0, &mut rng).unwrap().text)
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(11), draw(11));
    }

    #[test]
    fn test_unknown_entry_is_schema_error() {
        let selector = AnswerSelector::new(0.25);
        let mut rng = StdRng::seed_from_u64(0);
        let err = selector.select(&kb(), 9, 1.0, &mut rng).unwrap_err();
        assert!(err.is_schema());
    }
}
