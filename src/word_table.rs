//! Word lists used to spell out slots as human readable names.

use crate::error::Error;
use std::collections::HashMap;
use std::path::Path;

/// Joins the words of a name, e.g. `correct-horse-battery`.
pub const SEPARATOR: char = '-';

/// One digit per word of a name, each indexing a [`WordTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey(Vec<usize>);

impl From<Vec<usize>> for SlotKey {
    fn from(digits: Vec<usize>) -> Self {
        SlotKey(digits)
    }
}

/// An ordered list of distinct, lower-case words.
///
/// Words are loaded from a file with one word per line. Blank lines and lines starting with `#`
/// are ignored.
#[derive(Debug, Clone)]
pub struct WordTable {
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl WordTable {
    /// Load a word table from a word list file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathIO`] if the file can't be read and [`Error::InvalidWordList`] if its
    /// content isn't a usable word list.
    pub async fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let p = p.as_ref();
        let contents = tokio::fs::read_to_string(p)
            .await
            .map_err(|err| Error::PathIO(p.to_path_buf(), err))?;
        Self::parse(&contents)
    }

    /// Build a word table from the content of a word list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWordList`] for duplicate words, words that can't be used as part
    /// of a DNS label or a path segment, and for lists with fewer than two words.
    pub fn parse(contents: &str) -> Result<Self, Error> {
        let mut words = Vec::new();
        let mut index = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let word = line.to_ascii_lowercase();
            if !word.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(Error::InvalidWordList(format!(
                    "\"{word}\" must only contain letters and digits"
                )));
            }
            if index.insert(word.clone(), words.len()).is_some() {
                return Err(Error::InvalidWordList(format!("\"{word}\" is repeated")));
            }
            words.push(word);
        }
        if words.len() < 2 {
            return Err(Error::InvalidWordList(format!(
                "found {} word(s), at least 2 are needed",
                words.len()
            )));
        }
        Ok(WordTable { words, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The words spelling out `key`. Digits out of range are skipped.
    #[must_use]
    pub fn words(&self, key: &SlotKey) -> Vec<&str> {
        key.0
            .iter()
            .filter_map(|i| self.words.get(*i).map(String::as_str))
            .collect()
    }

    /// The canonical name of `key`: its words joined by [`SEPARATOR`].
    #[must_use]
    pub fn name(&self, key: &SlotKey) -> String {
        self.words(key).join(&SEPARATOR.to_string())
    }

    /// The key spelled by `name`, if `name` is exactly `arity` known words. Case-insensitive.
    #[must_use]
    pub fn key_for_name(&self, name: &str, arity: u32) -> Option<SlotKey> {
        let name = name.trim_end_matches('.').to_ascii_lowercase();
        let digits = name
            .split(SEPARATOR)
            .map(|word| self.index.get(word).copied())
            .collect::<Option<Vec<usize>>>()?;
        if digits.len() != arity as usize {
            return None;
        }
        Some(SlotKey(digits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDS: &str = "# a comment\nApple\nbanana\n\n  cherry  \n#durian\n";

    #[test]
    fn parse_skips_comments_and_blanks() {
        let table = WordTable::parse(WORDS).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.name(&SlotKey(vec![0, 2, 1])), "apple-cherry-banana");
    }

    #[test]
    fn parse_rejects_bad_lists() {
        assert!(matches!(
            WordTable::parse("apple\nbanana\nAPPLE\n"),
            Err(Error::InvalidWordList(_))
        ));
        assert!(matches!(
            WordTable::parse("apple\nban-ana\n"),
            Err(Error::InvalidWordList(_))
        ));
        assert!(matches!(
            WordTable::parse("apple\n../etc\n"),
            Err(Error::InvalidWordList(_))
        ));
        assert!(matches!(
            WordTable::parse("# only\napple\n"),
            Err(Error::InvalidWordList(_))
        ));
    }

    #[test]
    fn names_round_trip() {
        let table = WordTable::parse(WORDS).unwrap();
        let key = SlotKey(vec![2, 2, 0]);
        let name = table.name(&key);
        assert_eq!(table.key_for_name(&name, 3), Some(key.clone()));
        assert_eq!(table.key_for_name("CHERRY-cherry-Apple", 3), Some(key));
    }

    #[test]
    fn unknown_names_rejected() {
        let table = WordTable::parse(WORDS).unwrap();
        assert_eq!(table.key_for_name("apple-banana", 3), None);
        assert_eq!(table.key_for_name("apple-banana-kiwi", 3), None);
        assert_eq!(table.key_for_name("apple-banana-cherry-apple", 3), None);
        assert_eq!(table.key_for_name("", 1), None);
        assert_eq!(table.key_for_name("..", 1), None);
    }
}
