//! Path slugification for generated media file names.
//!
//! Lowercases, transliterates to ASCII and joins words with `-`. Path
//! separators survive, so `/Photos/Summer Trip/Beach!-small` becomes
//! `/photos/summer-trip/beach-small`.

/// Characters that separate words. `/` is deliberately absent.
const PUNCTUATION: &[char] = &[
    '\t', ' ', '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '-', '<', '=', '>', '?', '@',
    '[', '\\', ']', '^', '_', '`', '{', '|', '}', ',', '.',
];

/// Slugify `text`, keeping `/` separators.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    lower
        .split(|c| PUNCTUATION.contains(&c))
        .map(|word| {
            deunicode::deunicode(word)
                .chars()
                .filter(|c| c.is_ascii() && !PUNCTUATION.contains(c))
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
