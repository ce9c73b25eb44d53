use crate::vocabulary::{KeywordCounts, KeywordField, Vocabulary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct SnippetConfig {
    pub chars_before: usize,
    pub chars_after: usize,
    pub max_words: usize,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            chars_before: 100,
            chars_after: 200,
            max_words: 75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TermCount {
    pub phrase: String,
    pub field: KeywordField,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordScan {
    pub vocabulary_version: u32,
    pub term_counts: Vec<TermCount>,
    pub counts: KeywordCounts,
    pub total: u32,
    pub snippets: Vec<String>,
}

impl KeywordScan {
    pub fn is_relevant(&self) -> bool {
        self.total > 0
    }
}

pub fn scan(text: &str, vocabulary: &Vocabulary) -> KeywordScan {
    scan_with(text, vocabulary, SnippetConfig::default())
}

/// Scans `text` term by term in vocabulary order, left to right within each
/// term. Matches are word bounded and case insensitive; snippets are cut from
/// the original text so they keep its casing.
pub fn scan_with(text: &str, vocabulary: &Vocabulary, config: SnippetConfig) -> KeywordScan {
    let mut term_counts = Vec::with_capacity(vocabulary.terms().len());
    let mut counts = KeywordCounts::default();
    let mut total = 0u32;
    let mut snippets = Vec::new();

    for term in vocabulary.terms() {
        let mut count = 0u32;
        for found in term.pattern().find_iter(text) {
            count = count.saturating_add(1);
            snippets.push(snippet_around(text, found.start(), found.end(), config));
        }

        counts.add(term.field, count);
        total = total.saturating_add(count);
        term_counts.push(TermCount {
            phrase: term.phrase.clone(),
            field: term.field,
            count,
        });
    }

    KeywordScan {
        vocabulary_version: vocabulary.version(),
        term_counts,
        counts,
        total,
        snippets,
    }
}

/// Context window around the byte range `start..end`, clipped to the text
/// and cut down to `max_words` words when longer.
pub fn snippet_around(text: &str, start: usize, end: usize, config: SnippetConfig) -> String {
    let window_start = step_back(text, start, config.chars_before);
    let window_end = step_forward(text, end, config.chars_after);
    let context = &text[window_start..window_end];

    let words = context.split_whitespace().collect::<Vec<_>>();
    if words.len() > config.max_words {
        words[..config.max_words].join(" ")
    } else {
        context.to_string()
    }
}

fn step_back(text: &str, from: usize, chars: usize) -> usize {
    text[..from]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map_or(from, |(index, _)| index)
}

fn step_forward(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| from + index)
}
