// regexec.rs - Running a compiled DFA over text.
//
// Matching is anchored at the start of the input. Each character is mapped
// to its class and the table is stepped once per character. After the last
// character the end-of-input class (if the pattern has one) may be stepped to
// satisfy `$` anchors.

use crate::regclass::CharSet;
use crate::regdfa::Dtran;

/// Whether `state` accepts once the input is exhausted.
fn accepts_at_end(charset: &CharSet, dtran: &Dtran, mut state: usize) -> bool {
    if dtran[state].is_final() {
        return true;
    }
    let Some(end) = charset.end_class() else {
        return false;
    };
    // Stacked anchors (`$$`) need one end step each; a cycle cannot be longer
    // than the table.
    for _ in 0..dtran.len() {
        match dtran.step(state, end) {
            Some(next) if dtran[next].is_final() => return true,
            Some(next) if next != state => state = next,
            _ => return false,
        }
    }
    false
}

/// Whether the whole of `text` is accepted.
pub fn is_match(charset: &CharSet, dtran: &Dtran, text: &str) -> bool {
    if dtran.is_empty() {
        return false;
    }
    let mut state = 0;
    for c in text.chars() {
        let next = charset.class_of(c).and_then(|class| dtran.step(state, class));
        match next {
            Some(next) => state = next,
            None => return false,
        }
    }
    accepts_at_end(charset, dtran, state)
}

/// Byte length of the longest accepted prefix of `text`.
///
/// End-anchored alternatives only accept when the prefix is all of `text`.
pub fn longest_prefix(charset: &CharSet, dtran: &Dtran, text: &str) -> Option<usize> {
    if dtran.is_empty() {
        return None;
    }
    let mut best = None;
    let mut state = 0;
    for (offset, c) in text.char_indices() {
        if dtran[state].is_final() {
            best = Some(offset);
        }
        let next = charset.class_of(c).and_then(|class| dtran.step(state, class));
        match next {
            Some(next) => state = next,
            None => return best,
        }
    }
    if accepts_at_end(charset, dtran, state) {
        best = Some(text.len());
    }
    best
}
