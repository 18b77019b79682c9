//! Script events and sentence segmentation.
//!
//! A script is an ordered list of [`ScriptEvent`]s; insertion order is
//! playback order. The JSON encoding keeps the upstream screenwriter's
//! `line_type`/`content` shape so existing scripts parse unchanged.

use serde::{Deserialize, Serialize};

/// One line of a finalized script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "line_type", content = "content", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// A character speaking. `motion` is an optional body-motion tag
    /// consumed by the animation stage.
    Dialogue {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        motion: Option<String>,
    },
    /// A sound-effect cue of a fixed requested duration.
    SoundEffect { effect: String, duration_sec: f64 },
}

/// Sentence terminator characters.
fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split dialogue text into sentences.
///
/// A sentence ends at a run of `.`/`!`/`?` (so `"..."` and `"?!"` stay with
/// their sentence) followed by whitespace or end of input. A `.` between two
/// digits is a decimal point, not a boundary. Results are trimmed; empty
/// pieces are dropped, so whitespace-only input yields no sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_terminator(chars[i]) {
            i += 1;
            continue;
        }

        // Decimal point: "2.5" stays intact.
        if chars[i] == '.'
            && i > 0
            && i + 1 < chars.len()
            && chars[i - 1].is_ascii_digit()
            && chars[i + 1].is_ascii_digit()
        {
            i += 1;
            continue;
        }

        // Absorb the full terminator run, then one closing quote.
        let mut end = i + 1;
        while end < chars.len() && is_terminator(chars[end]) {
            end += 1;
        }
        if end < chars.len() && matches!(chars[end], '"' | '\'' | '\u{2019}' | '\u{201d}') {
            end += 1;
        }

        if end >= chars.len() || chars[end].is_whitespace() {
            let sentence: String = chars[start..end].iter().collect();
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
        i = end;
    }

    let tail: String = chars[start..].iter().collect();
    let tail = tail.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}
