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

//! The mail store adapter itself.
//!
//! IMAP models mail as mailboxes holding messages with per-mailbox flags;
//! the index underneath models mail as one flat set of messages carrying
//! labels and state tags. This module bridges the two:
//!
//! - Every label is a mailbox (and vice versa, through the name rules in
//!   [`labels`]); a handful of IMAP-reserved names map onto well-known
//!   labels.
//! - UIDs are the index's message ids. Sequence numbers are positions in the
//!   sorted id list of a mailbox's label, rebuilt on demand and cached with
//!   dirty checking against the index's modification stamps (`seqcache`).
//! - Flag writes translate back to state tags and are propagated to the
//!   message's whole thread, since the index lists by thread.
//!
//! `MailStore` is logically one type; like the other large types in this
//! codebase its `impl` blocks are split across the submodules by concern,
//! with the struct itself in `defs`.

mod defs;
mod fetch;
pub mod labels;
mod mailboxes;
mod messages;
pub mod model;
mod seqcache;

pub use self::defs::MailStore;
pub use self::messages::MessageView;
pub use self::seqcache::DEFAULT_CACHE_CAPACITY;

#[cfg(test)]
mod test_prelude {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
    use std::sync::Mutex;

    pub use crate::store::model::MessageId;
    pub use crate::support::error::Error;

    use crate::backend::{
        MessageMeta, MessageSummary, MetaIndex, RawLocation, RawStore,
        ThreadId,
    };
    use crate::store::defs::MailStore;

    /// An in-memory `MetaIndex` scripted by the tests.
    ///
    /// Matching is deliberately crude: a message matches a query if every
    /// whitespace-separated term, marker stripped, appears among its labels
    /// or state tags. Stamps never move on their own; tests advance them
    /// explicitly with `touch` so staleness is under test control.
    pub struct TestIndex {
        inner: Mutex<TestIndexInner>,
        queries: AtomicUsize,
    }

    struct TestIndexInner {
        /// Insertion order, so search results are deliberately unsorted
        /// whenever the test inserts them out of order.
        messages: Vec<MessageMeta>,
        label_stamps: HashMap<String, u64>,
        index_stamp: u64,
    }

    impl TestIndex {
        pub fn new() -> Self {
            TestIndex {
                inner: Mutex::new(TestIndexInner {
                    messages: Vec::new(),
                    label_stamps: HashMap::new(),
                    index_stamp: 0,
                }),
                queries: AtomicUsize::new(0),
            }
        }

        pub fn add(
            &self,
            id: u32,
            thread: u32,
            labels: &[&str],
            state: &[&str],
        ) {
            let mut inner = self.inner.lock().unwrap();
            inner.messages.push(MessageMeta {
                message_id: MessageId::u(id),
                thread_id: ThreadId(thread),
                labels: labels.iter().map(|&s| s.to_owned()).collect(),
                state: state.iter().map(|&s| s.to_owned()).collect(),
                loc: RawLocation(u64::from(id)),
            });
        }

        /// Set the stamp of `label`, also advancing the whole-index stamp.
        pub fn touch(&self, label: &str, stamp: u64) {
            let mut inner = self.inner.lock().unwrap();
            inner.label_stamps.insert(label.to_owned(), stamp);
            inner.index_stamp = inner.index_stamp.max(stamp);
        }

        /// Rewrite a message's state without moving any stamp, so tests
        /// can model an index whose stamps lag its contents.
        pub fn set_state(&self, id: u32, state: &[&str]) {
            let mut inner = self.inner.lock().unwrap();
            let msg = inner
                .messages
                .iter_mut()
                .find(|m| m.message_id == MessageId::u(id))
                .unwrap();
            msg.state = state.iter().map(|&s| s.to_owned()).collect();
        }

        /// How many queries (searches and counts) have hit this index.
        pub fn search_calls(&self) -> usize {
            self.queries.load(SeqCst)
        }

        fn matching(&self, query: &str) -> Vec<MessageMeta> {
            self.queries.fetch_add(1, SeqCst);
            let terms = query
                .split_whitespace()
                .map(|t| t.trim_start_matches('~'))
                .collect::<Vec<_>>();

            self.inner
                .lock()
                .unwrap()
                .messages
                .iter()
                .filter(|m| {
                    terms.iter().all(|&t| {
                        m.labels.iter().any(|l| l == t)
                            || m.state.iter().any(|s| s == t)
                    })
                })
                .cloned()
                .collect()
        }
    }

    impl MetaIndex for TestIndex {
        fn search(&self, query: &str) -> Result<Vec<MessageSummary>, Error> {
            Ok(self
                .matching(query)
                .into_iter()
                .map(|m| MessageSummary {
                    message_id: m.message_id,
                    thread_id: m.thread_id,
                })
                .collect())
        }

        fn count(&self, query: &str) -> Result<usize, Error> {
            Ok(self.matching(query).len())
        }

        fn message_meta(&self, id: MessageId) -> Result<MessageMeta, Error> {
            self.inner
                .lock()
                .unwrap()
                .messages
                .iter()
                .find(|m| m.message_id == id)
                .cloned()
                .ok_or(Error::NxMessage)
        }

        fn set_message_state(
            &self,
            id: MessageId,
            state: &[String],
        ) -> Result<(), Error> {
            let mut inner = self.inner.lock().unwrap();
            let msg = inner
                .messages
                .iter_mut()
                .find(|m| m.message_id == id)
                .ok_or(Error::NxMessage)?;
            msg.state = state.to_vec();
            Ok(())
        }

        fn set_thread_labels(
            &self,
            thread_id: ThreadId,
            labels: &[String],
        ) -> Result<(), Error> {
            let mut inner = self.inner.lock().unwrap();
            for msg in
                inner.messages.iter_mut().filter(|m| m.thread_id == thread_id)
            {
                msg.labels = labels.to_vec();
            }
            Ok(())
        }

        fn label_timestamp(&self, label: Option<&str>) -> Result<u64, Error> {
            let inner = self.inner.lock().unwrap();
            Ok(match label {
                None => inner.index_stamp,
                Some(label) => {
                    inner.label_stamps.get(label).copied().unwrap_or(0)
                },
            })
        }

        fn all_labels(&self) -> Result<Vec<String>, Error> {
            let inner = self.inner.lock().unwrap();
            let mut out = Vec::<String>::new();
            for msg in &inner.messages {
                for label in &msg.labels {
                    if !out.contains(label) {
                        out.push(label.clone());
                    }
                }
            }
            Ok(out)
        }

        fn size(&self) -> Result<usize, Error> {
            Ok(self.inner.lock().unwrap().messages.len())
        }
    }

    /// An in-memory `RawStore`.
    pub struct TestRaw {
        blobs: Mutex<HashMap<u64, Vec<u8>>>,
    }

    impl TestRaw {
        pub fn new() -> Self {
            TestRaw {
                blobs: Mutex::new(HashMap::new()),
            }
        }

        pub fn put(&self, loc: u64, data: &[u8]) {
            self.blobs.lock().unwrap().insert(loc, data.to_vec());
        }
    }

    impl RawStore for TestRaw {
        fn read(&self, loc: &RawLocation) -> Result<Vec<u8>, Error> {
            self.blobs
                .lock()
                .unwrap()
                .get(&loc.0)
                .cloned()
                .ok_or(Error::NxMessage)
        }
    }

    pub struct Setup {
        pub store: MailStore<TestIndex, TestRaw>,
    }

    pub fn set_up() -> Setup {
        Setup {
            store: MailStore::new(
                "test".to_owned(),
                TestIndex::new(),
                TestRaw::new(),
            ),
        }
    }
}
