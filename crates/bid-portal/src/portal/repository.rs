use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

/// Record stored behind a [`Repository`] handle.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Display + Send + Sync;

    fn id(&self) -> &Self::Id;
}

/// Storage capability injected into the portal services.
pub trait Repository<T: Entity>: Send + Sync {
    fn list(&self) -> Result<Vec<T>, RepositoryError>;
    fn get_by_id(&self, id: &T::Id) -> Result<Option<T>, RepositoryError>;
    fn create(&self, record: T) -> Result<T, RepositoryError>;
    fn update(&self, record: T) -> Result<T, RepositoryError>;
    fn delete(&self, id: &T::Id) -> Result<(), RepositoryError>;

    /// Check-and-write a stored record in one step. `change` sees the current
    /// record; the store is only written when it returns `Ok`.
    fn modify<F, E>(&self, id: &T::Id, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut T) -> Result<(), E>,
        E: From<RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Insertion-ordered in-memory store.
pub struct InMemoryRepository<T> {
    records: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn seeded(records: impl IntoIterator<Item = T>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records.into_iter().collect())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<T>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    fn list(&self) -> Result<Vec<T>, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    fn get_by_id(&self, id: &T::Id) -> Result<Option<T>, RepositoryError> {
        Ok(self.lock()?.iter().find(|record| record.id() == id).cloned())
    }

    fn create(&self, record: T) -> Result<T, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.iter().any(|existing| existing.id() == record.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: T) -> Result<T, RepositoryError> {
        let mut guard = self.lock()?;
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id() == record.id())
            .ok_or(RepositoryError::NotFound)?;
        *slot = record.clone();
        Ok(record)
    }

    fn delete(&self, id: &T::Id) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let index = guard
            .iter()
            .position(|existing| existing.id() == id)
            .ok_or(RepositoryError::NotFound)?;
        guard.remove(index);
        Ok(())
    }

    fn modify<F, E>(&self, id: &T::Id, change: F) -> Result<T, E>
    where
        F: FnOnce(&mut T) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut guard = self.lock()?;
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id() == id)
            .ok_or(RepositoryError::NotFound)?;

        let mut working = slot.clone();
        change(&mut working)?;
        *slot = working.clone();
        Ok(working)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        body: &'static str,
    }

    impl Entity for Note {
        type Id = String;

        fn id(&self) -> &String {
            &self.id
        }
    }

    fn note(id: &str, body: &'static str) -> Note {
        Note {
            id: id.to_string(),
            body,
        }
    }

    #[test]
    fn create_rejects_duplicate_ids() {
        let store = InMemoryRepository::default();
        store.create(note("a", "first")).expect("first insert");

        assert_eq!(
            store.create(note("a", "again")),
            Err(RepositoryError::Conflict)
        );
    }

    #[test]
    fn list_preserves_insertion_order() {
        let store = InMemoryRepository::seeded([note("b", "one"), note("a", "two")]);
        store.create(note("c", "three")).expect("insert");

        let ids: Vec<_> = store
            .list()
            .expect("list")
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn update_and_delete_require_existing_records() {
        let store = InMemoryRepository::seeded([note("a", "one")]);

        assert_eq!(
            store.update(note("missing", "x")),
            Err(RepositoryError::NotFound)
        );
        store.update(note("a", "edited")).expect("update");
        assert_eq!(
            store
                .get_by_id(&"a".to_string())
                .expect("fetch")
                .map(|record| record.body),
            Some("edited")
        );

        store.delete(&"a".to_string()).expect("delete");
        assert_eq!(
            store.delete(&"a".to_string()),
            Err(RepositoryError::NotFound)
        );
    }

    #[test]
    fn modify_writes_only_when_the_change_succeeds() {
        let store = InMemoryRepository::seeded([note("a", "draft")]);

        let rejected: Result<Note, RepositoryError> =
            store.modify(&"a".to_string(), |record| {
                record.body = "half-written";
                Err(RepositoryError::Conflict)
            });
        assert_eq!(rejected, Err(RepositoryError::Conflict));
        assert_eq!(
            store.get_by_id(&"a".to_string()).expect("fetch").map(|r| r.body),
            Some("draft")
        );

        let applied = store
            .modify(&"a".to_string(), |record| {
                record.body = "final";
                Ok::<_, RepositoryError>(())
            })
            .expect("modify");
        assert_eq!(applied.body, "final");
        assert_eq!(
            store.modify(&"missing".to_string(), |_| Ok::<_, RepositoryError>(())),
            Err(RepositoryError::NotFound)
        );
    }

    #[test]
    fn clones_share_the_same_records() {
        let store = InMemoryRepository::default();
        let handle = store.clone();
        handle.create(note("a", "shared")).expect("insert");

        assert_eq!(store.list().expect("list").len(), 1);
    }
}
