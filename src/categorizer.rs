use rust_decimal::Decimal;

use crate::models::{KeywordRule, KeywordType};

pub const OTHER_EXPENSES: &str = "Other Expenses";
pub const OTHER_INCOME: &str = "Other Income";

/// Outcome of matching one description against the keyword rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Categorization {
    /// Every plausible category, most preferred first.
    pub candidates: Vec<String>,
}

impl Categorization {
    /// The category actually assigned, if any.
    pub fn category(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }

    /// Assigned category, or the income/expense fallback bucket.
    pub fn bucket(&self, amount: Decimal) -> &str {
        self.category().unwrap_or(if amount < Decimal::ZERO {
            OTHER_EXPENSES
        } else {
            OTHER_INCOME
        })
    }
}

/// Number of description words that also occur in the phrase.
fn shared_words(description: &str, phrase: &str) -> usize {
    let phrase_words: Vec<&str> = phrase.split_whitespace().collect();
    description
        .split_whitespace()
        .filter(|word| phrase_words.contains(word))
        .count()
}

/// Scoring state threaded through one pass over the rules.
#[derive(Debug, Default)]
struct MatchAccumulator {
    exact: Vec<String>,
    tied: Vec<String>,
    best: Option<(usize, String)>,
}

impl MatchAccumulator {
    fn observe(mut self, description: &str, phrase: &str, category: &str) -> Self {
        if description == phrase {
            self.exact.push(category.to_string());
            return self;
        }
        if !description.contains(phrase) {
            return self;
        }
        let score = shared_words(description, phrase);
        match self.best.as_ref().map(|(best, _)| *best) {
            Some(best) if score < best => {}
            // A tie never displaces the current best, and earlier ties are
            // kept even once a higher score shows up.
            Some(best) if score == best => self.tied.push(category.to_string()),
            _ => self.best = Some((score, category.to_string())),
        }
        self
    }

    fn finish(self) -> Categorization {
        let mut candidates = self.exact;
        candidates.extend(self.tied);
        candidates.extend(self.best.map(|(_, category)| category));
        Categorization { candidates }
    }
}

/// Match a normalised description against the owner's INCLUDED rules.
/// Exact phrase matches come first (rule order), then categories tied on
/// shared-word count, then the best-scoring substring match.
pub fn categorize(description: &str, rules: &[KeywordRule]) -> Categorization {
    let description = description.to_lowercase();
    if description.is_empty() {
        return Categorization::default();
    }

    rules
        .iter()
        .filter(|rule| rule.kind == KeywordType::Included)
        .flat_map(|rule| rule.phrases.iter().map(move |p| (p, &rule.category)))
        .fold(MatchAccumulator::default(), |acc, (phrase, category)| {
            acc.observe(&description, &phrase.to_lowercase(), category)
        })
        .finish()
}

/// True when the description contains the first phrase of any EXCLUDED rule.
pub fn is_excluded(description: &str, rules: &[KeywordRule]) -> bool {
    let description = description.to_lowercase();
    rules
        .iter()
        .filter(|rule| rule.kind == KeywordType::Excluded)
        .filter_map(|rule| rule.phrases.first())
        .any(|phrase| description.contains(&phrase.to_lowercase()))
}
