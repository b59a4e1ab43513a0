//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Turnsole.
//
// Turnsole is free software: you can redistribute it and/or modify it under
// the terms of  the GNU General Public  License as published  by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Turnsole is distributed  in the hope that  it will be useful,  but WITHOUT
// ANY WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along
// with Turnsole. If not, see <http://www.gnu.org/licenses/>.

//! The dirty-checked cache of per-mailbox sequence data.
//!
//! Listing "every message matching this label, sorted" is the expensive
//! operation behind most protocol commands, so its results are cached per
//! mailbox and reused until the index reports a newer modification stamp
//! for the mailbox's label. Three regions exist per mailbox — the sequence
//! list, the message count, and the unseen-restricted count — stored and
//! checked independently but all keyed off the same staleness input.
//!
//! An entry is fresh iff the stamp recorded when it was computed is at
//! least the index's current stamp for the underlying label. The unseen
//! count depends on two labels (the mailbox's own and `unread`), so its
//! effective stamp is the max of both and it re-derives whenever either
//! changed.
//!
//! Backend calls are made outside the cache lock: a recompute for one
//! mailbox never blocks another session's access to a different key, and a
//! partially computed value is never observable (recompute-then-publish is
//! a single map insert).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;

use super::defs::MailStore;
use super::labels;
use crate::backend::{MetaIndex, RawStore};
use crate::store::model::{MessageId, Seqnum, SequenceList};
use crate::support::error::Error;

/// Matches the bound of the recency cache the store grew up with.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(super) enum CacheKind {
    Sequence,
    Count,
    UnseenCount,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(super) struct CacheKey {
    pub kind: CacheKind,
    pub mailbox: String,
}

#[derive(Clone, Debug)]
pub(super) enum CacheValue {
    Sequence(Arc<SequenceList>),
    Count(usize),
}

struct CacheEntry {
    value: CacheValue,
    /// The index stamp observed when `value` was computed.
    timestamp: u64,
    last_access: u64,
}

struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Logical clock driving recency eviction.
    clock: u64,
}

/// Process-scoped storage for cached sequence data.
///
/// Owned by the `MailStore` instance; bounded, evicting the
/// least-recently-accessed entry when full.
pub(super) struct SequenceCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl SequenceCache {
    pub fn new(capacity: usize) -> Self {
        SequenceCache {
            capacity,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                clock: 0,
            }),
        }
    }

    /// Return the cached value for `key` if it is at least as new as
    /// `latest`, the index's current stamp for the key's staleness input.
    pub fn get_fresh(&self, key: &CacheKey, latest: u64) -> Option<CacheValue> {
        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let clock = inner.clock;

        let entry = inner.entries.get_mut(key)?;
        if entry.timestamp < latest {
            // Stale; leave it in place for publish() to overwrite
            return None;
        }

        entry.last_access = clock;
        Some(entry.value.clone())
    }

    /// Store a freshly computed value, replacing any previous entry for
    /// `key` in one step.
    pub fn publish(&self, key: CacheKey, value: CacheValue, timestamp: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let clock = inner.clock;

        inner.entries.insert(
            key,
            CacheEntry {
                value,
                timestamp,
                last_access: clock,
            },
        );

        if inner.entries.len() > self.capacity {
            // The capacity is small, so a linear scan is fine
            if let Some(oldest) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone())
            {
                inner.entries.remove(&oldest);
            }
        }
    }
}

impl<M: MetaIndex, R: RawStore> MailStore<M, R> {
    /// Return the message ids of `mailbox` in sequence order.
    ///
    /// Slot 0 of the result is the reserved sentinel; 1-based sequence
    /// numbers index it directly. The result reflects the index state as of
    /// the dirty check at the top of this call.
    pub fn sequence_for(
        &self,
        mailbox: &str,
    ) -> Result<Arc<SequenceList>, Error> {
        let stamp = self.mailbox_stamp(mailbox)?;
        let key = CacheKey {
            kind: CacheKind::Sequence,
            mailbox: mailbox.to_owned(),
        };

        if let Some(CacheValue::Sequence(list)) =
            self.cache.get_fresh(&key, stamp)
        {
            return Ok(list);
        }

        let token = labels::query_token(mailbox);
        let ids = self
            .index
            .search(&token)?
            .into_iter()
            .map(|hit| hit.message_id)
            .collect::<Vec<MessageId>>();
        let list = Arc::new(SequenceList::from_ids(ids));
        debug!(
            "{} Rebuilt sequence for {:?} ({} messages)",
            self.log_prefix,
            mailbox,
            list.len()
        );

        self.cache
            .publish(key, CacheValue::Sequence(Arc::clone(&list)), stamp);
        Ok(list)
    }

    /// Return the number of messages in `mailbox`.
    pub fn message_count(&self, mailbox: &str) -> Result<usize, Error> {
        self.count_impl(mailbox, false)
    }

    /// Return the number of unseen messages in `mailbox`.
    pub fn unseen_count(&self, mailbox: &str) -> Result<usize, Error> {
        self.count_impl(mailbox, true)
    }

    /// Return the sequence number of `id` within `mailbox`.
    ///
    /// Correct against the sequence list as of this call's dirty check; the
    /// index may move on afterwards.
    pub fn seqno_of(
        &self,
        mailbox: &str,
        id: MessageId,
    ) -> Result<Seqnum, Error> {
        self.sequence_for(mailbox)?
            .seqnum_of(id)
            .ok_or(Error::NxMessage)
    }

    /// The index's current modification stamp for the label behind
    /// `mailbox`.
    fn mailbox_stamp(&self, mailbox: &str) -> Result<u64, Error> {
        let label = labels::imap_to_tag(mailbox)?;
        self.index.label_timestamp(label.as_deref())
    }

    fn count_impl(
        &self,
        mailbox: &str,
        with_unseen: bool,
    ) -> Result<usize, Error> {
        // A count restricted to unseen depends on two labels; re-derive
        // whenever either input changed.
        let mut stamp = self.mailbox_stamp(mailbox)?;
        if with_unseen {
            stamp = stamp.max(self.index.label_timestamp(Some("unread"))?);
        }

        let key = CacheKey {
            kind: if with_unseen {
                CacheKind::UnseenCount
            } else {
                CacheKind::Count
            },
            mailbox: mailbox.to_owned(),
        };

        if let Some(CacheValue::Count(n)) = self.cache.get_fresh(&key, stamp) {
            return Ok(n);
        }

        let mut token = labels::query_token(mailbox);
        if with_unseen {
            token.push_str(" ~unread");
        }
        let n = self.index.count(&token)?;

        self.cache.publish(key, CacheValue::Count(n), stamp);
        Ok(n)
    }
}

#[cfg(test)]
mod test {
    use super::super::test_prelude::*;
    use super::*;

    #[test]
    fn cache_storage_fresh_and_stale() {
        let cache = SequenceCache::new(4);
        let key = CacheKey {
            kind: CacheKind::Count,
            mailbox: "INBOX".to_owned(),
        };

        assert!(cache.get_fresh(&key, 0).is_none());

        cache.publish(key.clone(), CacheValue::Count(3), 5);
        assert!(matches!(
            cache.get_fresh(&key, 5),
            Some(CacheValue::Count(3))
        ));
        // A newer index stamp makes the entry unusable
        assert!(cache.get_fresh(&key, 6).is_none());
        // ... but it is not removed; an equal-or-older stamp still hits
        assert!(matches!(
            cache.get_fresh(&key, 4),
            Some(CacheValue::Count(3))
        ));
    }

    #[test]
    fn cache_storage_evicts_least_recently_accessed() {
        let cache = SequenceCache::new(2);
        let key = |name: &str| CacheKey {
            kind: CacheKind::Count,
            mailbox: name.to_owned(),
        };

        cache.publish(key("a"), CacheValue::Count(1), 1);
        cache.publish(key("b"), CacheValue::Count(2), 1);
        // Touch "a" so "b" is the eviction candidate
        assert!(cache.get_fresh(&key("a"), 1).is_some());
        cache.publish(key("c"), CacheValue::Count(3), 1);

        assert!(cache.get_fresh(&key("a"), 1).is_some());
        assert!(cache.get_fresh(&key("b"), 1).is_none());
        assert!(cache.get_fresh(&key("c"), 1).is_some());
    }

    #[test]
    fn sequence_is_sorted_deterministic_and_cached() {
        let setup = set_up();
        setup.store.index().add(52, 1, &["inbox"], &[]);
        setup.store.index().add(47, 1, &["inbox"], &[]);
        setup.store.index().add(312, 2, &["inbox"], &["unread"]);
        setup.store.index().touch("inbox", 1);

        let first = setup.store.sequence_for("INBOX").unwrap();
        assert_eq!(3, first.len());
        assert_eq!(Some(MessageId::u(47)), first.get(Seqnum::u(1)));
        assert_eq!(Some(MessageId::u(52)), first.get(Seqnum::u(2)));
        assert_eq!(Some(MessageId::u(312)), first.get(Seqnum::u(3)));

        let searches = setup.store.index().search_calls();
        let second = setup.store.sequence_for("INBOX").unwrap();
        assert_eq!(first, second);
        // The index didn't move, so the second call hit the cache
        assert_eq!(searches, setup.store.index().search_calls());
    }

    #[test]
    fn newer_stamp_forces_recompute() {
        let setup = set_up();
        setup.store.index().add(1, 1, &["inbox"], &[]);
        setup.store.index().touch("inbox", 1);

        assert_eq!(1, setup.store.message_count("INBOX").unwrap());

        setup.store.index().add(2, 2, &["inbox"], &[]);
        setup.store.index().touch("inbox", 2);

        assert_eq!(2, setup.store.message_count("INBOX").unwrap());
        let list = setup.store.sequence_for("INBOX").unwrap();
        assert_eq!(2, list.len());
    }

    #[test]
    fn unseen_count_re_derives_when_either_label_changes() {
        let setup = set_up();
        setup.store.index().add(1, 1, &["inbox"], &["unread"]);
        setup.store.index().add(2, 2, &["inbox"], &[]);
        setup.store.index().touch("inbox", 1);
        setup.store.index().touch("unread", 1);

        assert_eq!(1, setup.store.unseen_count("INBOX").unwrap());

        // Mark message 1 read; only the unread label's stamp moves
        setup.store.index().set_state(1, &[]);
        setup.store.index().touch("unread", 2);

        assert_eq!(0, setup.store.unseen_count("INBOX").unwrap());
        // The plain count's input didn't change
        assert_eq!(2, setup.store.message_count("INBOX").unwrap());
    }

    #[test]
    fn seqno_lookup() {
        let setup = set_up();
        setup.store.index().add(47, 1, &["inbox"], &[]);
        setup.store.index().add(52, 1, &["inbox"], &[]);
        setup.store.index().touch("inbox", 1);

        assert_eq!(
            Seqnum::u(2),
            setup.store.seqno_of("INBOX", MessageId::u(52)).unwrap()
        );
        assert!(matches!(
            setup.store.seqno_of("INBOX", MessageId::u(99)),
            Err(Error::NxMessage)
        ));
    }
}
