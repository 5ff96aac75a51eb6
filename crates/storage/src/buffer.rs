use std::collections::BTreeMap;

use crate::repository::ScalarValue;

/// A write staged since the last `persist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Staged {
    Set(ScalarValue),
    Delete,
}

/// Pending writes, last write per key wins.
#[derive(Debug, Default)]
pub(crate) struct WriteBuffer {
    pending: BTreeMap<String, Staged>,
}

impl WriteBuffer {
    pub(crate) fn set(&mut self, key: &str, value: ScalarValue) {
        self.pending.insert(key.to_owned(), Staged::Set(value));
    }

    pub(crate) fn delete(&mut self, key: &str) {
        self.pending.insert(key.to_owned(), Staged::Delete);
    }

    /// `Some(None)` means the key was deleted; `None` means nothing is staged.
    pub(crate) fn lookup(&self, key: &str) -> Option<Option<&ScalarValue>> {
        self.pending.get(key).map(|staged| match staged {
            Staged::Set(value) => Some(value),
            Staged::Delete => None,
        })
    }

    /// Merges staged writes into a committed key list.
    pub(crate) fn overlay_keys(&self, prefix: &str, committed: Vec<String>) -> Vec<String> {
        let mut keys: std::collections::BTreeSet<String> = committed.into_iter().collect();
        for (key, staged) in self.pending.range(prefix.to_owned()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match staged {
                Staged::Set(_) => {
                    keys.insert(key.clone());
                }
                Staged::Delete => {
                    keys.remove(key);
                }
            }
        }
        keys.into_iter().collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn take(&mut self) -> BTreeMap<String, Staged> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn snapshot(&self) -> BTreeMap<String, Staged> {
        self.pending.clone()
    }

    /// Drops writes that were flushed, keeping any that changed since the snapshot.
    pub(crate) fn settle(&mut self, flushed: &BTreeMap<String, Staged>) {
        for (key, staged) in flushed {
            if self.pending.get(key) == Some(staged) {
                self.pending.remove(key);
            }
        }
    }
}
