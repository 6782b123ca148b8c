//! Sentence-boundary chunking for long-form narration.
//!
//! Long documents are split into sentences and greedily packed into chunks
//! that fit a character budget, so each model call sees a bounded input.

fn is_sentence_break(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '。' | '！' | '？' | '।')
}

fn push_sentence(units: &mut Vec<String>, body: &mut String, terminator: &mut String) {
    let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalized.is_empty() {
        let terminator = if terminator.is_empty() {
            "."
        } else {
            terminator.as_str()
        };
        units.push(format!("{normalized}{terminator}"));
    }
    body.clear();
    terminator.clear();
}

/// Split text into sentences, each ending with its own punctuation run.
///
/// Empty sentences (stray punctuation, blank lines) are dropped and internal
/// whitespace is collapsed to single spaces. A trailing fragment without
/// punctuation gets a `.`.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut body = String::new();
    let mut terminator = String::new();

    for ch in text.chars() {
        if is_sentence_break(ch) {
            terminator.push(ch);
            continue;
        }
        if !terminator.is_empty() {
            push_sentence(&mut units, &mut body, &mut terminator);
        }
        body.push(ch);
    }
    push_sentence(&mut units, &mut body, &mut terminator);

    units
}

/// Greedily pack sentences into chunks of at most `max_chars` characters.
///
/// A sentence longer than the budget on its own becomes a chunk by itself.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();
        let sep_chars = if current.is_empty() { 0 } else { 1 };

        if current_chars + sep_chars + sentence_chars <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&sentence);
            current_chars += sep_chars + sentence_chars;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current = sentence;
        current_chars = sentence_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
