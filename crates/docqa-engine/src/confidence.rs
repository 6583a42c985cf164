//! Retrieval confidence heuristic.
//!
//! A coarse, explainable proxy for answer quality rather than a calibrated
//! probability. The arithmetic is fixed so results reproduce exactly for the
//! same question and retrieved set.

pub const BASE: f64 = 0.5;
pub const CAP: f64 = 0.95;

const LONG_CONTEXT_BONUS: f64 = 0.2;
const KEYWORD_BONUS: f64 = 0.2;
const BREADTH_BONUS: f64 = 0.1;

/// Mean chunk length (in characters) above which the context counts as substantial.
const LONG_CONTEXT_CHARS: f64 = 100.0;
const BREADTH_MIN_CHUNKS: usize = 3;

/// Confidence in `[BASE, CAP]` for an answer built from `contents`.
pub fn confidence(question: &str, contents: &[&str]) -> f64 {
    let mut score = BASE;

    if !contents.is_empty() {
        let total_chars: usize = contents.iter().map(|c| c.chars().count()).sum();
        if total_chars as f64 / contents.len() as f64 > LONG_CONTEXT_CHARS {
            score += LONG_CONTEXT_BONUS;
        }
    }

    // Empty or all-whitespace questions have no first token and earn nothing here.
    if let Some(token) = question.split_whitespace().next() {
        let token = token.to_lowercase();
        if contents.iter().any(|c| c.to_lowercase().contains(&token)) {
            score += KEYWORD_BONUS;
        }
    }

    if contents.len() >= BREADTH_MIN_CHUNKS {
        score += BREADTH_BONUS;
    }

    score.min(CAP)
}
