//! Answer policy filter
//!
//! A textual heuristic: it only catches answers where the model already
//! tried to refuse, and replaces them with the one canonical refusal.

use mzp_core::{REFUSAL_MARKER, REFUSAL_MESSAGE};

/// Apply the refusal policy to a trimmed answer
pub fn apply_policy(answer: &str) -> String {
    if answer.is_empty() || answer.contains(REFUSAL_MARKER) {
        return REFUSAL_MESSAGE.to_string();
    }
    answer.to_string()
}

/// Trim and filter raw generated text
pub fn finalize_answer(raw: &str) -> String {
    apply_policy(raw.trim())
}
