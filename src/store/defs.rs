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

use std::sync::Mutex;

use crate::backend::{MetaIndex, RawStore};
use crate::store::model::ListedMailbox;
use crate::store::seqcache::{SequenceCache, DEFAULT_CACHE_CAPACITY};

/// The adapter: a label-indexed mail store presented through the IMAP
/// mailbox model.
///
/// One instance serves every session in the process; sessions address it
/// through `&self` and all shared state (the sequence cache, the ephemeral
/// mailbox list) is guarded internally. A read immediately after another
/// session's write may still observe staleness until the next dirty check
/// on that mailbox; this bounded staleness is the intended consistency
/// model.
pub struct MailStore<M, R> {
    pub(super) log_prefix: String,
    pub(super) index: M,
    pub(super) raw: R,
    pub(super) cache: SequenceCache,
    /// Mailboxes created by clients that are not (yet) backed by any index
    /// label. Held in memory only; lost on restart by design.
    pub(super) ephemeral_mailboxes: Mutex<Vec<ListedMailbox>>,
}

impl<M: MetaIndex, R: RawStore> MailStore<M, R> {
    pub fn new(log_prefix: String, index: M, raw: R) -> Self {
        Self::with_cache_capacity(log_prefix, index, raw, DEFAULT_CACHE_CAPACITY)
    }

    /// Like `new`, but with an explicit bound on the sequence cache.
    pub fn with_cache_capacity(
        log_prefix: String,
        index: M,
        raw: R,
        cache_capacity: usize,
    ) -> Self {
        MailStore {
            log_prefix,
            index,
            raw,
            cache: SequenceCache::new(cache_capacity),
            ephemeral_mailboxes: Mutex::new(Vec::new()),
        }
    }

    /// Return the underlying metadata index.
    pub fn index(&self) -> &M {
        &self.index
    }

    /// Return the log prefix used for messages regarding this store.
    pub fn log_prefix(&self) -> &str {
        &self.log_prefix
    }
}
