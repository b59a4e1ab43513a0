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

//! Contracts the underlying mail store must fulfil.
//!
//! Turnsole itself never touches disk or network. Everything it knows about
//! mail comes through [`MetaIndex`] (the searchable label/metadata index)
//! and [`RawStore`] (the append-only store holding raw message bytes).
//! Implementations surface their own transport failures as
//! [`Error::BackendUnavailable`] or [`Error::Io`]; the adapter performs no
//! retries on their behalf.
//!
//! A search query is a whitespace-separated list of terms in the index's own
//! syntax; the adapter only ever constructs queries from label terms such as
//! `~inbox` (see `store::labels::query_token`).

use serde::{Deserialize, Serialize};

use crate::store::model::MessageId;
use crate::support::error::Error;

/// Identifies a conversation thread in the index.
///
/// The index groups messages by thread for search and listing, which is why
/// label changes must be applied at thread granularity to stay visible.
#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash,
)]
#[serde(transparent)]
pub struct ThreadId(pub u32);

/// Where the raw bytes of a message live within the raw store.
///
/// Opaque to the adapter; it is read out of a message's metadata and handed
/// straight back to [`RawStore::read`].
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct RawLocation(pub u64);

/// The metadata the index holds for a single message.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct MessageMeta {
    pub message_id: MessageId,
    pub thread_id: ThreadId,
    /// User-visible grouping labels (`inbox`, `lists`, ...).
    pub labels: Vec<String>,
    /// Status tags, both mutable (`starred`, `unread`, `deleted`) and
    /// immutable (`attachment`, `signed`, ...).
    pub state: Vec<String>,
    /// Where the raw message bytes live.
    pub loc: RawLocation,
}

/// One hit of a search, in the index's own (relevance) order.
#[derive(Deserialize, Serialize, Clone, Copy, Debug)]
pub struct MessageSummary {
    pub message_id: MessageId,
    pub thread_id: ThreadId,
}

/// The searchable label/metadata index.
pub trait MetaIndex {
    /// Run `query` and return every matching message, in the index's own
    /// order. The adapter never relies on that order.
    fn search(&self, query: &str) -> Result<Vec<MessageSummary>, Error>;

    /// Return the number of messages matching `query`.
    fn count(&self, query: &str) -> Result<usize, Error>;

    /// Load the metadata of one message.
    ///
    /// Fails with `Error::NxMessage` if the id is not known to the index.
    fn message_meta(&self, id: MessageId) -> Result<MessageMeta, Error>;

    /// Replace the mutable state tags of one message.
    fn set_message_state(
        &self,
        id: MessageId,
        state: &[String],
    ) -> Result<(), Error>;

    /// Replace the labels of every message in a thread.
    fn set_thread_labels(
        &self,
        thread_id: ThreadId,
        labels: &[String],
    ) -> Result<(), Error>;

    /// Return the last-modified stamp of `label`, or of the index as a whole
    /// if `label` is `None`.
    ///
    /// Stamps are monotonically non-decreasing and bumped by the index
    /// whenever the set of messages matching the label (or their metadata)
    /// changes. Their absolute value is meaningless to the adapter; only
    /// comparisons matter.
    fn label_timestamp(&self, label: Option<&str>) -> Result<u64, Error>;

    /// Return every label currently present in the index.
    fn all_labels(&self) -> Result<Vec<String>, Error>;

    /// Return the total number of messages in the index.
    fn size(&self) -> Result<usize, Error>;
}

/// The store holding raw message bytes.
pub trait RawStore {
    /// Read the full raw text of the message stored at `loc`.
    fn read(&self, loc: &RawLocation) -> Result<Vec<u8>, Error>;
}
