use std::collections::BTreeSet;

use crate::model::WordId;

/// A single membership change applied to a `BookmarkSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkChange {
    Added(WordId),
    Removed(WordId),
}

impl BookmarkChange {
    #[must_use]
    pub fn word(self) -> WordId {
        match self {
            BookmarkChange::Added(word) | BookmarkChange::Removed(word) => word,
        }
    }

    /// The change that undoes this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            BookmarkChange::Added(word) => BookmarkChange::Removed(word),
            BookmarkChange::Removed(word) => BookmarkChange::Added(word),
        }
    }
}

/// Locally cached set of bookmarked vocabulary entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSet {
    words: BTreeSet<WordId>,
}

impl BookmarkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_words(words: impl IntoIterator<Item = WordId>) -> Self {
        Self {
            words: words.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, word: WordId) -> bool {
        self.words.contains(&word)
    }

    /// Flip membership of `word` and return the change that was applied.
    pub fn toggle(&mut self, word: WordId) -> BookmarkChange {
        let change = if self.contains(word) {
            BookmarkChange::Removed(word)
        } else {
            BookmarkChange::Added(word)
        };
        self.apply(change);
        change
    }

    pub fn apply(&mut self, change: BookmarkChange) {
        match change {
            BookmarkChange::Added(word) => {
                self.words.insert(word);
            }
            BookmarkChange::Removed(word) => {
                self.words.remove(&word);
            }
        }
    }

    pub fn revert(&mut self, change: BookmarkChange) {
        self.apply(change.inverse());
    }

    pub fn iter(&self) -> impl Iterator<Item = WordId> + '_ {
        self.words.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_reports_change() {
        let mut set = BookmarkSet::new();
        assert_eq!(set.toggle(WordId::new(1)), BookmarkChange::Added(WordId::new(1)));
        assert_eq!(set.toggle(WordId::new(1)), BookmarkChange::Removed(WordId::new(1)));
        assert!(set.is_empty());
    }

    #[test]
    fn revert_restores_previous_membership() {
        let mut set = BookmarkSet::from_words([WordId::new(3)]);
        let before = set.clone();

        let change = set.toggle(WordId::new(3));
        assert!(!set.contains(WordId::new(3)));
        set.revert(change);

        assert_eq!(set, before);
    }
}
