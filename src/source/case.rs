//! First-letter case helpers for case-insensitive gathering.

/// `word` with its first character uppercased.
pub fn capitalize(word: &str) -> String {
    map_first(word, |c| c.to_uppercase().collect())
}

/// `word` with its first character lowercased.
pub fn decapitalize(word: &str) -> String {
    map_first(word, |c| c.to_lowercase().collect())
}

/// Whether the first character is unaffected by uppercasing.
///
/// Digits, punctuation and the empty string count as capital.
pub fn starts_uppercase(word: &str) -> bool {
    match word.chars().next() {
        Some(c) => c.to_uppercase().eq(std::iter::once(c)),
        None => true,
    }
}

/// The first `len` characters of `input`.
pub fn truncate_chars(input: &str, len: usize) -> &str {
    match input.char_indices().nth(len) {
        Some((end, _)) => &input[..end],
        None => input,
    }
}

fn map_first(word: &str, f: impl FnOnce(char) -> String) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut mapped = f(first);
            mapped.push_str(chars.as_str());
            mapped
        }
        None => String::new(),
    }
}
