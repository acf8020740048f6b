//! # qnabot
//!
//! Ask questions against a QnA Bot knowledge base from the command line.
//!
//! Usage:
//!   qnabot ask "Who are you?"                 # Bundled knowledge base
//!   qnabot ask "Who are you?" --kb kb.json    # Custom knowledge base
//!   qnabot chat --kb kb.json                  # Interactive session
//!   qnabot rank "hello" -k 3 --metric euclidean
//!   qnabot validate --kb kb.json

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qnabot_kb::{KnowledgeBase, KnowledgeBaseSource, SourceStrategy, default_knowledge_base};
use qnabot_retrieval::{BotConfig, QnaBot};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "qnabot", version, about = "Answer questions from a QnA knowledge base")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Bot config file (TOML). Defaults to <config dir>/qnabot/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Embedding model: tfidf, murmurhash or count
    #[arg(long, global = true)]
    model: Option<String>,

    /// Similarity metric: cosine, euclidean, manhattan or haversine
    #[arg(long, global = true)]
    metric: Option<String>,

    /// Scores below this get a fallback answer
    #[arg(long, global = true)]
    min_score: Option<f32>,

    /// Seed for answer selection
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Read the knowledge base file once and keep it in memory
    #[arg(long, global = true)]
    cache: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a single question
    Ask {
        question: String,

        /// Knowledge base file. Defaults to the bundled one
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Print the match score next to the answer
        #[arg(long)]
        show_score: bool,
    },

    /// Answer questions read from stdin until EOF, `exit` or `quit`
    Chat {
        /// Knowledge base file. Defaults to the bundled one
        #[arg(long)]
        kb: Option<PathBuf>,
    },

    /// Show the paraphrases closest to a question
    Rank {
        question: String,

        /// Knowledge base file. Defaults to the bundled one
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Number of paraphrases to show
        #[arg(short, default_value_t = 5)]
        k: usize,
    },

    /// Check a knowledge base file and print a summary
    Validate {
        /// Knowledge base file
        #[arg(long)]
        kb: PathBuf,
    },
}

impl Cli {
    /// Config file values, overridden by command line flags.
    fn bot_config(&self) -> Result<BotConfig> {
        let mut config = BotConfig::load_or_default(self.config.as_deref())
            .context("Failed to load bot config")?;

        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(metric) = &self.metric {
            config = config.with_metric(metric);
        }
        if let Some(min_score) = self.min_score {
            config = config.with_min_score(min_score);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }

    fn strategy(&self) -> SourceStrategy {
        if self.cache {
            SourceStrategy::Owned
        } else {
            SourceStrategy::ByReference
        }
    }

    fn source(&self, kb: Option<&Path>) -> Result<KnowledgeBaseSource> {
        match kb {
            Some(path) => KnowledgeBaseSource::from_path(path, self.strategy())
                .with_context(|| format!("Failed to open knowledge base {}", path.display())),
            None => Ok(KnowledgeBaseSource::owned(
                default_knowledge_base().context("Bundled knowledge base is invalid")?,
            )),
        }
    }

    fn fitted_bot(&self, kb: Option<&Path>) -> Result<(QnaBot, KnowledgeBaseSource)> {
        let source = self.source(kb)?;
        let mut bot = QnaBot::new(self.bot_config()?).context("Invalid bot config")?;
        bot.fit(source.clone())
            .context("Failed to fit the knowledge base")?;
        Ok((bot, source))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay clean
    let filter = if cli.verbose {
        "qnabot=debug,qnabot_retrieval=debug,qnabot_kb=debug,qnabot_embeddings=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Ask {
            question,
            kb,
            show_score,
        } => {
            let (bot, _) = cli.fitted_bot(kb.as_deref())?;
            let answer = bot.answer(question)?;
            if *show_score {
                writeln!(out, "{} ({:.4})", answer.text, answer.score)?;
            } else {
                writeln!(out, "{}", answer.text)?;
            }
        }
        Command::Chat { kb } => {
            let (mut bot, source) = cli.fitted_bot(kb.as_deref())?;
            chat(&mut bot, &source, io::stdin().lock(), &mut out)?;
        }
        Command::Rank { question, kb, k } => {
            let (bot, _) = cli.fitted_bot(kb.as_deref())?;
            for ranked in bot.rank(question, *k)? {
                writeln!(
                    out,
                    "{:.4}\t[{}] {}",
                    ranked.score, ranked.entry, ranked.question
                )?;
            }
        }
        Command::Validate { kb } => {
            let loaded = KnowledgeBase::load(kb)
                .with_context(|| format!("Invalid knowledge base {}", kb.display()))?;
            writeln!(out, "{}", summary(&loaded))?;
        }
    }

    Ok(())
}

/// Answer one question per input line.
///
/// `reload` re-fits the bot from `source`, which picks up file edits for
/// by-reference sources.
fn chat<R: BufRead, W: Write>(
    bot: &mut QnaBot,
    source: &KnowledgeBaseSource,
    input: R,
    out: &mut W,
) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line.context("Failed to read from stdin")?;
        let question = line.trim();

        match question {
            "exit" | "quit" => break,
            "" => {}
            "reload" => {
                bot.fit(source.clone())
                    .context("Failed to reload the knowledge base")?;
                writeln!(out, "Knowledge base reloaded")?;
            }
            _ => {
                let answer = bot.answer(question)?;
                debug!("Answered with score {:.4}", answer.score);
                writeln!(out, "{}", answer.text)?;
            }
        }

        write!(out, "> ")?;
        out.flush()?;
    }

    Ok(())
}

fn summary(kb: &KnowledgeBase) -> String {
    format!(
        "{}: {} entries, {} questions, {} fallback answers",
        kb.info.name,
        kb.len(),
        kb.question_count(),
        kb.fallback_answers.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn default_bot() -> (QnaBot, KnowledgeBaseSource) {
        let source = KnowledgeBaseSource::owned(default_knowledge_base().unwrap());
        let mut bot = QnaBot::new(BotConfig::new().with_seed(1)).unwrap();
        bot.fit(source.clone()).unwrap();
        (bot, source)
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "qnabot",
            "ask",
            "Who are you?",
            "--metric",
            "euclidean",
            "--min-score",
            "0.4",
            "--cache",
        ])
        .unwrap();

        assert_eq!(cli.metric.as_deref(), Some("euclidean"));
        assert_eq!(cli.min_score, Some(0.4));
        assert_eq!(cli.strategy(), SourceStrategy::Owned);
        assert!(matches!(cli.command, Command::Ask { ref question, .. } if question == "Who are you?"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        BotConfig::new()
            .with_model("count")
            .with_metric("manhattan")
            .save(&path)
            .unwrap();

        let cli = Cli::try_parse_from([
            "qnabot",
            "--config",
            path.to_str().unwrap(),
            "--metric",
            "cosine",
            "validate",
            "--kb",
            "kb.json",
        ])
        .unwrap();

        let config = cli.bot_config().unwrap();
        assert_eq!(config.model_name, "count");
        assert_eq!(config.similarity_metric, "cosine");
    }

    #[test]
    fn test_rank_default_k() {
        let cli = Cli::try_parse_from(["qnabot", "rank", "hello"]).unwrap();
        assert!(matches!(cli.command, Command::Rank { k: 5, kb: None, .. }));
    }

    #[test]
    fn test_chat_session() {
        let (mut bot, source) = default_bot();
        let input = "Who are you?\n\n   \nquit\nWho are you?\n".as_bytes();
        let mut out = Vec::new();

        chat(&mut bot, &source, input, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "> I am QnA Bot!\n> > > "
        );
    }

    #[test]
    fn test_chat_reload() {
        let (mut bot, source) = default_bot();
        let mut out = Vec::new();

        chat(&mut bot, &source, "reload\n".as_bytes(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "> Knowledge base reloaded\n> ");
        assert!(bot.is_fitted());
    }

    #[test]
    fn test_summary() {
        let kb = default_knowledge_base().unwrap();
        assert_eq!(
            summary(&kb),
            "QnA Bot default knowledge base: 7 entries, 23 questions, 3 fallback answers"
        );
    }
}
