//! Word lists stored as text files, one phrase per line.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use scrawl_room::{PhraseChooser, WordList};

use crate::{ConfigError, ScrawlError};

/// Longest allowed word-list name.
const MAX_LIST_NAME_LEN: usize = 50;

/// Returns `true` if `name` is 1–50 ASCII letters, digits, spaces,
/// underscores, hyphens or apostrophes.
///
/// Nothing else can reach the filesystem, so names like `../x` are
/// never looked up.
pub fn is_valid_list_name(name: &str) -> bool {
    (1..=MAX_LIST_NAME_LEN).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '\'' | '-'))
}

/// A directory of `<name>.txt` word lists.
#[derive(Debug, Clone)]
pub struct WordListDirectory {
    dir: PathBuf,
}

impl WordListDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the list called `name`. Blank lines are skipped.
    ///
    /// # Errors
    /// - [`ConfigError::UnknownWordList`] if the name isn't allowed or
    ///   there's no such file
    /// - [`ConfigError::Read`] if the file can't be read
    /// - [`RoomError::EmptyWordList`](scrawl_room::RoomError::EmptyWordList)
    ///   if it has no phrases
    pub fn get(&self, name: &str) -> Result<WordList, ScrawlError> {
        if !is_valid_list_name(name) {
            return Err(ConfigError::UnknownWordList(name.to_string()).into());
        }
        let path = self.dir.join(format!("{name}.txt"));
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::UnknownWordList(name.to_string()).into());
            }
            Err(source) => return Err(ConfigError::Read { path, source }.into()),
        };

        let list = WordList::new(name, text.lines())?;
        tracing::debug!(word_list = name, phrases = list.len(), "word list loaded");
        Ok(list)
    }

    /// A random phrase source over the list called `name`.
    ///
    /// # Errors
    /// See [`WordListDirectory::get`].
    pub fn chooser(&self, name: &str) -> Result<PhraseChooser, ScrawlError> {
        Ok(PhraseChooser::new(Arc::new(self.get(name)?)))
    }

    /// Names of every list in the directory, sorted.
    ///
    /// # Errors
    /// [`ConfigError::Read`] if the directory can't be listed.
    pub fn list(&self) -> Result<Vec<String>, ConfigError> {
        let read_error = |source| ConfigError::Read {
            path: self.dir.clone(),
            source,
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            if !path.extension().is_some_and(|ext| ext == "txt") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_valid_list_name(stem) => names.push(stem.to_string()),
                _ => {}
            }
        }
        names.sort();
        Ok(names)
    }
}
