//! Lexicon Sentiment Analysis
//!
//! VADER-style scoring tuned for political and economic commentary.
//! Handles boosters, negation, ALL-CAPS emphasis, "but" contrast and
//! exclamation marks.

use super::{ensure_text, SentimentClassifier, SentimentLabel};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Normalization constant from VADER
const ALPHA: f64 = 15.0;
/// Multiplier for a negated term (flips and dampens)
const NEGATION_SCALAR: f64 = -0.74;
/// Extra weight for a shouted term when the rest of the text is not shouted
const CAPS_EMPHASIS: f64 = 1.25;
/// Added per exclamation mark, in the direction of the raw sum
const EXCLAMATION_BOOST: f64 = 0.1;
const MAX_EXCLAMATIONS: usize = 4;
/// Words scanned before a term for boosters and negations
const MODIFIER_WINDOW: usize = 3;

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("good", 0.5),
    ("great", 0.7),
    ("greatest", 0.8),
    ("excellent", 0.8),
    ("amazing", 0.8),
    ("fantastic", 0.8),
    ("tremendous", 0.7),
    ("incredible", 0.7),
    ("wonderful", 0.7),
    ("beautiful", 0.6),
    ("best", 0.8),
    ("better", 0.5),
    ("well", 0.4),
    ("love", 0.6),
    ("happy", 0.6),
    ("proud", 0.5),
    ("win", 0.6),
    ("winning", 0.6),
    ("won", 0.5),
    ("success", 0.7),
    ("successful", 0.7),
    ("strong", 0.5),
    ("stronger", 0.5),
    ("boom", 0.5),
    ("booming", 0.7),
    ("growth", 0.4),
    ("gain", 0.5),
    ("gains", 0.5),
    ("profit", 0.6),
    ("profits", 0.6),
    ("rally", 0.5),
    ("surge", 0.5),
    ("soar", 0.5),
    ("soaring", 0.6),
    ("rise", 0.4),
    ("rising", 0.4),
    ("prosperity", 0.7),
    ("prosperous", 0.7),
    ("thriving", 0.6),
    ("safe", 0.4),
    ("positive", 0.5),
    ("opportunity", 0.5),
    ("opportunities", 0.5),
    ("thank", 0.4),
    ("thanks", 0.4),
    ("congratulations", 0.6),
    ("bullish", 0.7),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("bad", -0.5),
    ("terrible", -0.8),
    ("horrible", -0.8),
    ("awful", -0.7),
    ("worst", -0.8),
    ("worse", -0.6),
    ("disaster", -0.8),
    ("disastrous", -0.8),
    ("catastrophe", -0.8),
    ("crisis", -0.6),
    ("collapse", -0.7),
    ("crash", -0.7),
    ("crashing", -0.7),
    ("fail", -0.6),
    ("failed", -0.6),
    ("failing", -0.6),
    ("failure", -0.7),
    ("weak", -0.5),
    ("loser", -0.6),
    ("losers", -0.6),
    ("lose", -0.6),
    ("losing", -0.6),
    ("loss", -0.6),
    ("losses", -0.6),
    ("corrupt", -0.7),
    ("corruption", -0.7),
    ("fraud", -0.9),
    ("scam", -0.8),
    ("rigged", -0.8),
    ("fake", -0.6),
    ("sad", -0.5),
    ("hate", -0.7),
    ("angry", -0.5),
    ("inflation", -0.4),
    ("recession", -0.7),
    ("decline", -0.4),
    ("fall", -0.4),
    ("falling", -0.4),
    ("drop", -0.4),
    ("plunge", -0.6),
    ("danger", -0.5),
    ("dangerous", -0.6),
    ("threat", -0.5),
    ("war", -0.6),
    ("panic", -0.6),
    ("fear", -0.5),
    ("broken", -0.5),
    ("destroy", -0.6),
    ("destroyed", -0.7),
    ("incompetent", -0.7),
    ("problem", -0.4),
    ("problems", -0.4),
    ("negative", -0.5),
    ("bearish", -0.7),
];

const BOOSTERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("absolutely", 1.4),
    ("completely", 1.4),
    ("totally", 1.3),
    ("total", 1.3),
    ("so", 1.2),
    ("super", 1.3),
    ("incredibly", 1.4),
    ("highly", 1.3),
    ("truly", 1.2),
    ("most", 1.2),
    ("huge", 1.3),
    ("hugely", 1.4),
    ("massive", 1.3),
    ("massively", 1.4),
    ("tremendously", 1.4),
    ("fantastically", 1.3),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "neither", "nobody", "nothing", "nowhere", "isn't", "aren't",
    "wasn't", "weren't", "hasn't", "haven't", "hadn't", "doesn't", "don't", "didn't", "won't",
    "wouldn't", "can't", "cannot", "couldn't", "shouldn't",
];

/// Polarity breakdown of a text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarityScores {
    /// Share of positive weight (0.0 to 1.0)
    pub positive: f64,
    /// Share of negative weight (0.0 to 1.0)
    pub negative: f64,
    /// Remainder (0.0 to 1.0)
    pub neutral: f64,
    /// Normalized overall score (-1.0 to 1.0)
    pub compound: f64,
}

impl PolarityScores {
    fn neutral() -> Self {
        Self {
            positive: 0.0,
            negative: 0.0,
            neutral: 1.0,
            compound: 0.0,
        }
    }

    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_compound(self.compound)
    }
}

/// Lexicon-based scorer
pub struct SentimentAnalyzer {
    lexicon: HashMap<&'static str, f64>,
    boosters: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            lexicon: POSITIVE_WORDS.iter().chain(NEGATIVE_WORDS).copied().collect(),
            boosters: BOOSTERS.iter().copied().collect(),
            negations: NEGATIONS.iter().copied().collect(),
        }
    }

    /// Score a text
    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let words: Vec<String> = tokens.iter().map(|t| clean_word(t)).collect();
        let caps_differential = caps_differential(&tokens);
        let contrast_at = words.iter().position(|w| w == "but");

        let mut scores: Vec<f64> = Vec::new();
        for (i, word) in words.iter().enumerate() {
            let Some(&base) = self.lexicon.get(word.as_str()) else {
                continue;
            };

            let mut score = base;
            if caps_differential && is_shouted(tokens[i]) {
                score *= CAPS_EMPHASIS;
            }
            score = self.apply_modifiers(&words, i, score);
            score *= match contrast_at {
                Some(at) if i < at => 0.5,
                Some(at) if i > at => 1.5,
                _ => 1.0,
            };
            scores.push(score.clamp(-1.0, 1.0));
        }

        if scores.is_empty() {
            return PolarityScores::neutral();
        }

        let mut sum: f64 = scores.iter().sum();
        if sum != 0.0 {
            let bangs = text.chars().filter(|&c| c == '!').count().min(MAX_EXCLAMATIONS);
            sum += EXCLAMATION_BOOST * bangs as f64 * sum.signum();
        }

        let positive_sum: f64 = scores.iter().filter(|&&s| s > 0.0).sum();
        let negative_sum: f64 = scores.iter().filter(|&&s| s < 0.0).map(|s| s.abs()).sum();
        let total = positive_sum + negative_sum;
        let (positive, negative) = if total > 0.0 {
            (positive_sum / total, negative_sum / total)
        } else {
            (0.0, 0.0)
        };

        PolarityScores {
            positive,
            negative,
            neutral: (1.0 - positive - negative).max(0.0),
            compound: normalize(sum),
        }
    }

    /// Scale a term by boosters and negations in the preceding words
    fn apply_modifiers(&self, words: &[String], index: usize, mut score: f64) -> f64 {
        for prev in &words[index.saturating_sub(MODIFIER_WINDOW)..index] {
            if let Some(&factor) = self.boosters.get(prev.as_str()) {
                score *= factor;
            }
            if self.negations.contains(prev.as_str()) {
                score *= NEGATION_SCALAR;
            }
        }
        score
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Offline classifier backed by [`SentimentAnalyzer`]
#[derive(Default)]
pub struct LexiconClassifier {
    analyzer: SentimentAnalyzer,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scores(&self, text: &str) -> PolarityScores {
        self.analyzer.polarity_scores(text)
    }
}

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<SentimentLabel> {
        ensure_text(text)?;
        Ok(self.analyzer.polarity_scores(text).label())
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

/// Lowercase and strip punctuation, keeping apostrophes and hyphens.
/// Typographic apostrophes count as `'`.
fn clean_word(word: &str) -> String {
    word.chars()
        .map(|c| if matches!(c, '\u{2019}' | '\u{2018}') { '\'' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '\'' || *c == '-')
        .collect::<String>()
        .to_lowercase()
}

fn is_shouted(token: &str) -> bool {
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() > 1 && letters.iter().all(|c| c.is_uppercase())
}

/// True when some, but not all, words are shouted
fn caps_differential(tokens: &[&str]) -> bool {
    let worded = tokens.iter().filter(|t| t.chars().any(char::is_alphabetic)).count();
    let shouted = tokens.iter().filter(|t| is_shouted(t)).count();
    shouted > 0 && shouted < worded
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}
