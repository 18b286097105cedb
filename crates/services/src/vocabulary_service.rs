use std::sync::Arc;

use exam_core::model::WordId;
use exam_core::vocabulary::{BookmarkChange, BookmarkSet};
use storage::repository::VocabularyRepository;

use crate::error::VocabularyError;

/// Bookmarked vocabulary with optimistic local updates.
///
/// The local set changes before the remote call; a failed call rolls the
/// change back and reports `VocabularyError::RolledBack`.
pub struct VocabularyService {
    repo: Arc<dyn VocabularyRepository>,
    bookmarks: BookmarkSet,
}

impl VocabularyService {
    /// Load the current bookmark list.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyError::Storage` if the list cannot be fetched.
    pub async fn load(repo: Arc<dyn VocabularyRepository>) -> Result<Self, VocabularyError> {
        let words = repo.list_bookmarks().await?;
        Ok(Self {
            repo,
            bookmarks: BookmarkSet::from_words(words),
        })
    }

    #[must_use]
    pub fn is_bookmarked(&self, word: WordId) -> bool {
        self.bookmarks.contains(word)
    }

    #[must_use]
    pub fn bookmarks(&self) -> &BookmarkSet {
        &self.bookmarks
    }

    /// Save or unsave `word`.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyError::RolledBack` when the remote update fails; the
    /// local set is back to its previous state in that case.
    pub async fn toggle(&mut self, word: WordId) -> Result<BookmarkChange, VocabularyError> {
        let change = self.bookmarks.toggle(word);
        let result = match change {
            BookmarkChange::Added(word) => self.repo.add_bookmark(word).await,
            BookmarkChange::Removed(word) => self.repo.remove_bookmark(word).await,
        };

        match result {
            Ok(()) => Ok(change),
            Err(source) => {
                self.bookmarks.revert(change);
                tracing::warn!(word = %word, error = %source, "bookmark update failed, rolled back");
                Err(VocabularyError::RolledBack { change, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::repository::{InMemoryRepository, StorageError};

    struct OfflineVocabulary {
        existing: Vec<WordId>,
    }

    #[async_trait]
    impl VocabularyRepository for OfflineVocabulary {
        async fn list_bookmarks(&self) -> Result<Vec<WordId>, StorageError> {
            Ok(self.existing.clone())
        }

        async fn add_bookmark(&self, _word: WordId) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn remove_bookmark(&self, _word: WordId) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    #[tokio::test]
    async fn toggle_writes_through() {
        let repo = InMemoryRepository::new();
        let mut svc = VocabularyService::load(Arc::new(repo.clone())).await.unwrap();

        let change = svc.toggle(WordId::new(7)).await.unwrap();
        assert_eq!(change, BookmarkChange::Added(WordId::new(7)));
        assert!(svc.is_bookmarked(WordId::new(7)));
        assert_eq!(repo.list_bookmarks().await.unwrap(), vec![WordId::new(7)]);

        svc.toggle(WordId::new(7)).await.unwrap();
        assert!(repo.list_bookmarks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_add_rolls_back() {
        let repo = Arc::new(OfflineVocabulary { existing: Vec::new() });
        let mut svc = VocabularyService::load(repo).await.unwrap();

        let err = svc.toggle(WordId::new(1)).await.unwrap_err();
        assert!(matches!(
            err,
            VocabularyError::RolledBack {
                change: BookmarkChange::Added(_),
                ..
            }
        ));
        assert!(!svc.is_bookmarked(WordId::new(1)));
    }

    #[tokio::test]
    async fn failed_remove_rolls_back() {
        let repo = Arc::new(OfflineVocabulary {
            existing: vec![WordId::new(2)],
        });
        let mut svc = VocabularyService::load(repo).await.unwrap();

        assert!(svc.toggle(WordId::new(2)).await.is_err());
        assert!(svc.is_bookmarked(WordId::new(2)));
    }
}
