//! Where secret phrases come from.

use std::sync::Arc;

use rand::Rng;

use crate::RoomError;

/// Supplies the secret phrase for each new round.
///
/// Rooms own their source as a `Box<dyn PhraseSource>` and may have it
/// swapped out while running.
pub trait PhraseSource: Send + 'static {
    /// Name of the word list this source draws from.
    fn name(&self) -> &str;

    /// The phrase for the next round.
    fn next_phrase(&mut self) -> String;
}

/// A named, non-empty list of phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordList {
    name: String,
    words: Vec<String>,
}

impl WordList {
    /// Builds a word list, trimming every entry and dropping blank ones.
    ///
    /// # Errors
    /// Returns [`RoomError::EmptyWordList`] if nothing is left.
    pub fn new<I, S>(name: impl Into<String>, words: I) -> Result<Self, RoomError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Err(RoomError::EmptyWordList(name));
        }
        Ok(Self { name, words })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`; construction refuses empty lists.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Picks phrases uniformly at random from a shared [`WordList`].
#[derive(Debug, Clone)]
pub struct PhraseChooser {
    list: Arc<WordList>,
}

impl PhraseChooser {
    pub fn new(list: Arc<WordList>) -> Self {
        Self { list }
    }
}

impl PhraseSource for PhraseChooser {
    fn name(&self) -> &str {
        self.list.name()
    }

    fn next_phrase(&mut self) -> String {
        let words = self.list.words();
        let index = rand::rng().random_range(0..words.len());
        words[index].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_list_trims_and_drops_blanks() {
        let list = WordList::new("food", ["  apple ", "", "   ", "ice cream"]).unwrap();
        assert_eq!(list.words(), ["apple", "ice cream"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_empty_word_list_is_refused() {
        let result = WordList::new("nothing", ["", "  "]);
        assert!(matches!(result, Err(RoomError::EmptyWordList(ref n)) if n == "nothing"));
    }

    #[test]
    fn test_chooser_only_returns_listed_phrases() {
        let list = Arc::new(WordList::new("food", ["apple", "pear"]).unwrap());
        let mut chooser = PhraseChooser::new(list);

        assert_eq!(chooser.name(), "food");
        for _ in 0..50 {
            let phrase = chooser.next_phrase();
            assert!(phrase == "apple" || phrase == "pear");
        }
    }
}
