//! Hint redaction.

/// Filler character for hidden letters.
pub const HINT_FILLER: char = '_';

/// Masks `phrase`, revealing the first `reveal` characters of each word.
///
/// Every word is padded with filler up to the length of the *whole*
/// phrase minus `reveal`, not the word's own length, so multi-word
/// phrases come out longer than the original:
///
/// ```
/// # use scrawl_room::create_hint;
/// assert_eq!(create_hint("apple", 1), "a____");
/// assert_eq!(create_hint("ice cream", 1), "i________ c________");
/// ```
pub fn create_hint(phrase: &str, reveal: usize) -> String {
    let hidden = phrase.chars().count().saturating_sub(reveal);
    phrase
        .split_whitespace()
        .map(|word| {
            let mut masked: String = word.chars().take(reveal).collect();
            masked.extend(std::iter::repeat_n(HINT_FILLER, hidden));
            masked
        })
        .collect::<Vec<_>>()
        .join(" ")
}
