//! Flattened view of the knowledge base questions.

use qnabot_kb::KnowledgeBase;

/// Every paraphrase of every entry, flattened in entry-major order, with the
/// entry each row belongs to.
///
/// Row `i` of the reference matrix embeds `flat_questions()[i]`, which
/// belongs to entry `flat_to_entry()[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceIndex {
    flat_questions: Vec<String>,
    flat_to_entry: Vec<usize>,
}

impl ReferenceIndex {
    /// Flatten the questions of `kb`.
    pub fn build(kb: &KnowledgeBase) -> Self {
        let (flat_questions, flat_to_entry): (Vec<String>, Vec<usize>) = kb
            .entries
            .iter()
            .enumerate()
            .flat_map(|(id, entry)| entry.questions.iter().map(move |q| (q.clone(), id)))
            .unzip();

        Self {
            flat_questions,
            flat_to_entry,
        }
    }

    /// Paraphrases in row order.
    pub fn flat_questions(&self) -> &[String] {
        &self.flat_questions
    }

    /// Entry id of each row.
    pub fn flat_to_entry(&self) -> &[usize] {
        &self.flat_to_entry
    }

    pub fn len(&self) -> usize {
        self.flat_questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat_questions.is_empty()
    }

    /// Entry id of `row`.
    pub fn entry_of(&self, row: usize) -> Option<usize> {
        self.flat_to_entry.get(row).copied()
    }

    /// Paraphrase at `row`.
    pub fn question(&self, row: usize) -> Option<&str> {
        self.flat_questions.get(row).map(String::as_str)
    }

    /// Borrowed paraphrases, ready to feed to an embedding model.
    pub fn corpus(&self) -> Vec<&str> {
        self.flat_questions.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builder("index")
            .entry(["Who are you?", "What's your name?"], ["I am QnA Bot!"])
            .entry(["Hi"], ["Hello!"])
            .entry(["Bye", "See you", "Later"], ["Goodbye!"])
            .fallback_answer("I don't understand")
            .build()
            .unwrap()
    }

    #[test]
    fn test_entry_major_order() {
        let index = ReferenceIndex::build(&kb());

        assert_eq!(index.len(), 6);
        assert_eq!(
            index.flat_questions(),
            ["Who are you?", "What's your name?", "Hi", "Bye", "See you", "Later"]
        );
        assert_eq!(index.flat_to_entry(), [0, 0, 1, 2, 2, 2]);
    }

    #[test]
    fn test_row_lookup() {
        let index = ReferenceIndex::build(&kb());

        assert_eq!(index.entry_of(2), Some(1));
        assert_eq!(index.question(4), Some("See you"));
        assert_eq!(index.entry_of(6), None);
    }

    #[test]
    fn test_length_matches_question_count() {
        let kb = kb();
        let index = ReferenceIndex::build(&kb);
        assert_eq!(index.len(), kb.question_count());
        assert!(index.flat_to_entry().windows(2).all(|w| w[0] <= w[1]));
    }
}
