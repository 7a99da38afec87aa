//! Cleanup of raw engine stdout.
//!
//! whisper.cpp decorates its output with terminal escape codes and bracketed
//! annotations (`[BLANK_AUDIO]`, `[Music]`, `[_BEG_]`, ...). Streaming replies
//! want a list of distinct sentences; the one-shot path wants a single
//! flattened string and maps the engine's sentinel outputs to fixed messages.

use crate::defaults;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// Literal patterns; construction cannot fail.
#[allow(clippy::expect_used)]
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("valid ANSI pattern"));

#[allow(clippy::expect_used)]
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("valid annotation pattern"));

#[allow(clippy::expect_used)]
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid blank-line pattern"));

#[allow(clippy::expect_used)]
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.。!！?？]+").expect("valid sentence pattern"));

/// Strip escapes and annotations and join the surviving lines with spaces.
pub fn flatten(raw: &str) -> String {
    let text = ANSI_ESCAPE.replace_all(raw, "");
    let text = ANNOTATION.replace_all(&text, "");
    let text = BLANK_LINES.replace_all(&text, "\n");

    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split cleaned output into distinct sentences, first occurrence first.
pub fn sanitize(raw: &str) -> Vec<String> {
    let flat = flatten(raw);

    let mut seen = HashSet::new();
    let mut sentences = Vec::new();
    for candidate in SENTENCE_END.split(&flat) {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            continue;
        }
        if seen.insert(candidate.to_string()) {
            sentences.push(candidate.to_string());
        }
    }

    tracing::debug!(count = sentences.len(), ?sentences, "sanitized engine output");
    sentences
}

/// Interpretation of single-shot engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneShotText {
    /// Recognized text, flattened.
    Text(String),
    /// The engine printed only the blank-audio marker.
    BlankAudio,
    /// The engine printed nothing usable.
    NoSpeech,
}

impl OneShotText {
    /// Text shown to the caller.
    pub fn message(&self) -> &str {
        match self {
            OneShotText::Text(text) => text,
            OneShotText::BlankAudio => defaults::BLANK_AUDIO_MESSAGE,
            OneShotText::NoSpeech => defaults::NO_SPEECH_MESSAGE,
        }
    }

    pub fn has_text(&self) -> bool {
        matches!(self, OneShotText::Text(_))
    }
}

/// Classify single-shot output, recognizing sentinels before cleanup.
pub fn interpret_one_shot(raw: &str) -> OneShotText {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return OneShotText::NoSpeech;
    }
    if trimmed == defaults::BLANK_AUDIO_MARKER {
        return OneShotText::BlankAudio;
    }

    let flat = flatten(trimmed);
    if flat.is_empty() {
        OneShotText::NoSpeech
    } else {
        OneShotText::Text(flat)
    }
}
