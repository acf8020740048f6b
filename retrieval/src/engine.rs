//! The QnA bot retrieval engine.

use std::sync::{Arc, Mutex, PoisonError};

use qnabot_embeddings::{
    EmbeddingMatrix, EmbeddingModel, ModelKind, SimilarityMetric, SparseEmbedding, TextEmbedder,
    argmax, find_top_k,
};
use qnabot_kb::{KnowledgeBase, KnowledgeBaseError, KnowledgeBaseSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::answer::{Answer, AnswerSelector};
use crate::config::BotConfig;
use crate::error::{Result, RetrievalError};
use crate::index::ReferenceIndex;

/// A knowledge base paraphrase ranked against a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedQuestion {
    /// Entry the paraphrase belongs to.
    pub entry: usize,

    /// Row of the paraphrase in the reference matrix.
    pub row: usize,

    /// The paraphrase itself.
    pub question: String,

    /// Similarity score.
    pub score: f32,
}

/// Everything built by a successful fit.
#[derive(Debug)]
struct FittedModel {
    kb: Arc<KnowledgeBase>,
    index: ReferenceIndex,
    model: EmbeddingModel,
    references: EmbeddingMatrix,
}

#[derive(Debug)]
enum FitState {
    Unfitted,
    Fitted(Box<FittedModel>),
}

/// Question answering over a knowledge base.
///
/// `fit` embeds every paraphrase of the knowledge base. Queries are embedded
/// with the same model, scored against every paraphrase, and answered from
/// the entry of the best match, or from the fallback answers when the best
/// score is below the configured minimum.
///
/// ```rust,ignore
/// use qnabot_retrieval::{BotConfig, QnaBot};
///
/// let mut bot = QnaBot::new(BotConfig::default())?;
/// bot.fit(qnabot_kb::default_knowledge_base()?)?;
/// println!("{}", bot.answer_text("Who are you?")?);
/// ```
#[derive(Debug)]
pub struct QnaBot {
    config: BotConfig,
    model_kind: ModelKind,
    metric: SimilarityMetric,
    selector: AnswerSelector,
    rng: Mutex<StdRng>,
    state: FitState,
}

impl QnaBot {
    /// Build an unfitted engine, validating the configuration.
    pub fn new(config: BotConfig) -> Result<Self> {
        config.validate()?;
        let model_kind = config.model_kind()?;
        let metric = config.metric()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        info!("Created QnA bot with model={model_kind} metric={metric}");
        Ok(Self {
            selector: AnswerSelector::new(config.min_score),
            config,
            model_kind,
            metric,
            rng: Mutex::new(rng),
            state: FitState::Unfitted,
        })
    }

    /// Embed the knowledge base and make the engine ready for queries.
    ///
    /// On failure the engine is left unfitted, even if it was fitted before.
    pub fn fit(&mut self, source: impl Into<KnowledgeBaseSource>) -> Result<()> {
        self.state = FitState::Unfitted;

        let source = source.into();
        let kb = source.load()?;
        let index = ReferenceIndex::build(&kb);

        let mut model = EmbeddingModel::new(self.model_kind, &self.config.vectorizer)?;
        let references = model.fit_transform(&index.corpus())?;

        info!(
            "Fitted QnA bot on '{}': {} entries, reference matrix {}x{}",
            kb.info.name,
            kb.len(),
            references.len(),
            references.dimension()
        );

        self.state = FitState::Fitted(Box::new(FittedModel {
            kb,
            index,
            model,
            references,
        }));
        Ok(())
    }

    /// Whether `fit` has succeeded.
    pub fn is_fitted(&self) -> bool {
        matches!(self.state, FitState::Fitted(_))
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn model_kind(&self) -> ModelKind {
        self.model_kind
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// The knowledge base snapshot the engine was fitted on.
    pub fn knowledge_base(&self) -> Option<&Arc<KnowledgeBase>> {
        match &self.state {
            FitState::Fitted(fitted) => Some(&fitted.kb),
            FitState::Unfitted => None,
        }
    }

    /// The flattened paraphrases the engine was fitted on.
    pub fn reference_index(&self) -> Option<&ReferenceIndex> {
        match &self.state {
            FitState::Fitted(fitted) => Some(&fitted.index),
            FitState::Unfitted => None,
        }
    }

    /// Entry id and score of the paraphrase most similar to `query`.
    ///
    /// On exact ties the earliest paraphrase wins.
    pub fn find_best_match(&self, query: &str) -> Result<(usize, f32)> {
        let fitted = self.fitted()?;
        let scores = self.score(fitted, query)?;

        let best = argmax(&scores).ok_or_else(no_questions)?;
        let entry = fitted.index.entry_of(best.row).ok_or_else(no_questions)?;

        debug!(
            "Best match for {query:?}: entry {entry} via {:?} (score {:.4})",
            fitted.index.question(best.row).unwrap_or_default(),
            best.score
        );
        Ok((entry, best.score))
    }

    /// The `k` paraphrases most similar to `query`, best first.
    pub fn rank(&self, query: &str, k: usize) -> Result<Vec<RankedQuestion>> {
        let fitted = self.fitted()?;
        let scores = self.score(fitted, query)?;

        find_top_k(&scores, k)
            .into_iter()
            .map(|result| {
                let entry = fitted.index.entry_of(result.row).ok_or_else(no_questions)?;
                Ok(RankedQuestion {
                    entry,
                    row: result.row,
                    question: fitted.index.question(result.row).unwrap_or_default().to_string(),
                    score: result.score,
                })
            })
            .collect()
    }

    /// Answer `query` using the engine's own random generator.
    ///
    /// Only the answer draw holds the shared RNG, so concurrent calls embed
    /// and score in parallel.
    pub fn answer(&self, query: &str) -> Result<Answer> {
        let fitted = self.fitted()?;
        let (entry, score) = self.find_best_match(query)?;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.selector.select(&fitted.kb, entry, score, &mut *rng)
    }

    /// Answer `query`, drawing from `rng`.
    pub fn answer_with_rng<R: Rng + ?Sized>(&self, query: &str, rng: &mut R) -> Result<Answer> {
        let fitted = self.fitted()?;
        let (entry, score) = self.find_best_match(query)?;
        self.selector.select(&fitted.kb, entry, score, rng)
    }

    /// Answer text only.
    pub fn answer_text(&self, query: &str) -> Result<String> {
        Ok(self.answer(query)?.text)
    }

    fn fitted(&self) -> Result<&FittedModel> {
        match &self.state {
            FitState::Fitted(fitted) => Ok(fitted),
            FitState::Unfitted => Err(RetrievalError::NotFitted),
        }
    }

    fn score(&self, fitted: &FittedModel, query: &str) -> Result<Vec<f32>> {
        let query_vector = fitted
            .model
            .transform(&[query])?
            .into_first_row()
            .unwrap_or_else(|| SparseEmbedding::zeros(fitted.references.dimension()));

        Ok(self.metric.scores(&query_vector, &fitted.references)?)
    }
}

fn no_questions() -> RetrievalError {
    KnowledgeBaseError::Schema("Knowledge base must have at least one question".to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builder("engine")
            .entry(["Who are you?", "What's your name?"], ["I am QnA Bot!"])
            .entry(["How old are you?"], ["I was just born."])
            .fallback_answer("I don't understand")
            .build()
            .unwrap()
    }

    fn fitted_bot(config: BotConfig) -> QnaBot {
        let mut bot = QnaBot::new(config).unwrap();
        bot.fit(kb()).unwrap();
        bot
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QnaBot>();
    }

    #[test]
    fn test_not_fitted() {
        let bot = QnaBot::new(BotConfig::default()).unwrap();
        assert!(!bot.is_fitted());
        assert!(bot.knowledge_base().is_none());
        assert!(bot.find_best_match("hi").unwrap_err().is_not_fitted());
        assert!(bot.answer("hi").unwrap_err().is_not_fitted());
        assert!(bot.rank("hi", 3).unwrap_err().is_not_fitted());
    }

    #[test]
    fn test_invalid_config_rejected_before_fit() {
        let err = QnaBot::new(BotConfig::new().with_metric("jaccard")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_exact_question_matches() {
        let bot = fitted_bot(BotConfig::default());

        let (entry, score) = bot.find_best_match("How old are you?").unwrap();
        assert_eq!(entry, 1);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_query_still_matches() {
        let bot = fitted_bot(BotConfig::default());

        let (entry, score) = bot.find_best_match("").unwrap();
        assert_eq!(entry, 0);
        assert_eq!(score, 0.0);
        assert!(bot.answer("").unwrap().fallback);
    }

    #[test]
    fn test_rank_orders_by_score() {
        let bot = fitted_bot(BotConfig::default());

        let ranked = bot.rank("what is your name", 2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].question, "What's your name?");
        assert_eq!(ranked[0].entry, 0);
        assert_eq!(ranked[0].row, 1);
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn test_answer_with_injected_rng() {
        let bot = fitted_bot(BotConfig::default());
        let mut rng = StdRng::seed_from_u64(1);

        let answer = bot.answer_with_rng("who are you", &mut rng).unwrap();
        assert_eq!(answer.text, "I am QnA Bot!");
        assert_eq!(answer.entry, 0);
        assert!(!answer.fallback);
    }

    #[test]
    fn test_scoring_does_not_wait_on_rng() {
        let unfitted = QnaBot::new(BotConfig::default()).unwrap();
        let _held = unfitted.rng.lock().unwrap();
        assert!(unfitted.answer("hi").unwrap_err().is_not_fitted());
    }

    #[test]
    fn test_concurrent_answers() {
        let bot = fitted_bot(BotConfig::new().with_seed(5));

        let answers: Vec<Answer> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| bot.answer("how old are you").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for answer in answers {
            assert_eq!(answer.text, "I was just born.");
            assert_eq!(answer.entry, 1);
        }
    }

    #[test]
    fn test_accessors_after_fit() {
        let bot = fitted_bot(BotConfig::new().with_model("count"));

        assert!(bot.is_fitted());
        assert_eq!(bot.model_kind(), ModelKind::Count);
        assert_eq!(bot.metric(), SimilarityMetric::Cosine);
        assert_eq!(bot.knowledge_base().unwrap().info.name, "engine");
        assert_eq!(bot.reference_index().unwrap().len(), 3);
    }
}
