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

use std::convert::TryFrom;
use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::support::error::Error;

/// The index's permanent identifier for a message.
///
/// This doubles as the IMAP UID: it is stable across mailbox re-listing and
/// never reused. Ids start at 1; 0 is reserved (see `SequenceList`).
#[derive(
    Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct MessageId(pub NonZeroU32);

impl MessageId {
    pub fn of(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(MessageId)
    }

    #[cfg(test)]
    pub fn u(raw: u32) -> Self {
        MessageId::of(raw).unwrap()
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MessageId({})", self.0.get())
    }
}

impl TryFrom<u32> for MessageId {
    type Error = ();

    fn try_from(v: u32) -> Result<Self, ()> {
        Self::of(v).ok_or(())
    }
}

impl Into<u32> for MessageId {
    fn into(self) -> u32 {
        self.0.get()
    }
}

/// The 1-based position of a message within a mailbox's current listing.
///
/// Sequence numbers are tied to the listing's order, not to any stored
/// identifier; they are only meaningful against the `SequenceList` they were
/// resolved from.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seqnum(pub NonZeroU32);

impl Seqnum {
    pub fn of(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Seqnum)
    }

    #[cfg(test)]
    pub fn u(raw: u32) -> Self {
        Seqnum::of(raw).unwrap()
    }
}

impl fmt::Debug for Seqnum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Seqnum({})", self.0.get())
    }
}

impl Into<u32> for Seqnum {
    fn into(self) -> u32 {
        self.0.get()
    }
}

/// The message ids of one mailbox, sorted ascending, with slot 0 reserved so
/// that 1-based sequence numbers index the backing list directly.
///
/// For a fixed mailbox and a fixed backend state the list is deterministic:
/// the order comes from the ids themselves, never from insertion or fetch
/// time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceList(Vec<u32>);

impl SequenceList {
    pub fn from_ids(mut ids: Vec<MessageId>) -> Self {
        ids.sort_unstable();
        let mut slots = Vec::with_capacity(ids.len() + 1);
        // The reserved slot. 0 is not a valid message id, so it can never be
        // matched by a lookup.
        slots.push(0);
        slots.extend(ids.into_iter().map(|id| id.0.get()));
        SequenceList(slots)
    }

    /// The number of messages in the mailbox.
    pub fn len(&self) -> usize {
        self.0.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        1 == self.0.len()
    }

    /// Resolve a sequence number to a message id, if in range.
    pub fn get(&self, seqnum: Seqnum) -> Option<MessageId> {
        self.0
            .get(seqnum.0.get() as usize)
            .copied()
            .and_then(MessageId::of)
    }

    /// Linear search for the sequence number of `id` in this listing.
    pub fn seqnum_of(&self, id: MessageId) -> Option<Seqnum> {
        self.0
            .iter()
            .position(|&slot| slot == id.0.get())
            // The reserved slot can't match, so the position is >= 1 and is
            // itself the sequence number.
            .map(|ix| Seqnum::of(ix as u32).unwrap())
    }
}

/// One element of a client-supplied sequence set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeqAtom {
    /// A single position or UID.
    Just(u32),
    /// An inclusive range. An end of `None` means "through the last message
    /// currently in the mailbox".
    Range(u32, Option<u32>),
    /// An already-expanded run of values, spliced in verbatim.
    List(Vec<u32>),
}

impl SeqAtom {
    /// The atom denoting just the last message (a lone `*`): an unbounded
    /// range whose start clamps down to the end of the mailbox.
    pub const LAST: SeqAtom = SeqAtom::Range(u32::MAX, None);
}

/// A sequence set as supplied by a `FETCH`-family command.
///
/// Unlike a normalized range set, this preserves element order and
/// duplicates: the protocol allows repeats, and response ordering follows
/// request ordering.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SequenceSet(pub Vec<SeqAtom>);

enum Endpoint {
    Num(u32),
    Splat,
}

fn endpoint(raw: &str) -> Result<Endpoint, Error> {
    if "*" == raw {
        Ok(Endpoint::Splat)
    } else {
        raw.parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .map(Endpoint::Num)
            .ok_or(Error::MalformedSequenceSet)
    }
}

impl SequenceSet {
    /// Parse the IMAP wire shape of a sequence set, e.g. `2,4:*`.
    ///
    /// `*` denotes the last message in the mailbox and is left unresolved
    /// until `expand`. RFC 3501 allows range endpoints in either order.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let mut atoms = Vec::new();
        for part in raw.split(',') {
            let mut subs = part.split(':');
            let atom = match (subs.next(), subs.next(), subs.next()) {
                (Some(only), None, None) => match endpoint(only)? {
                    Endpoint::Num(n) => SeqAtom::Just(n),
                    Endpoint::Splat => SeqAtom::LAST,
                },
                (Some(start), Some(end), None) => {
                    match (endpoint(start)?, endpoint(end)?) {
                        (Endpoint::Num(a), Endpoint::Num(b)) => {
                            SeqAtom::Range(a.min(b), Some(a.max(b)))
                        },
                        (Endpoint::Num(a), Endpoint::Splat)
                        | (Endpoint::Splat, Endpoint::Num(a)) => {
                            SeqAtom::Range(a, None)
                        },
                        (Endpoint::Splat, Endpoint::Splat) => SeqAtom::LAST,
                    }
                },
                _ => return Err(Error::MalformedSequenceSet),
            };
            atoms.push(atom);
        }

        Ok(SequenceSet(atoms))
    }

    /// Flatten the set against a mailbox whose last message is at position
    /// (or UID) `last`.
    ///
    /// `last` is resolved here, once per call, so every unbounded range in
    /// the set sees the same snapshot. Order and duplicates are preserved.
    /// An unbounded range whose start lies beyond `last` still yields the
    /// last message, per RFC 3501.
    pub fn expand(&self, last: u32) -> Vec<u32> {
        let mut out = Vec::new();
        for atom in &self.0 {
            match *atom {
                SeqAtom::Just(n) => out.push(n),
                SeqAtom::Range(start, Some(end)) => {
                    out.extend(start.min(end)..=start.max(end))
                },
                SeqAtom::Range(start, None) => {
                    if last > 0 {
                        out.extend(start.min(last)..=last)
                    }
                },
                SeqAtom::List(ref items) => out.extend_from_slice(items),
            }
        }
        out
    }
}

impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (ix, atom) in self.0.iter().enumerate() {
            if ix > 0 {
                write!(f, ",")?;
            }

            match *atom {
                SeqAtom::Just(n) => write!(f, "{}", n)?,
                SeqAtom::Range(u32::MAX, None) => write!(f, "*")?,
                SeqAtom::Range(start, Some(end)) => {
                    write!(f, "{}:{}", start, end)?
                },
                SeqAtom::Range(start, None) => write!(f, "{}:*", start)?,
                SeqAtom::List(ref items) => {
                    for (jx, n) in items.iter().enumerate() {
                        if jx > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", n)?;
                    }
                },
            }
        }

        Ok(())
    }
}

/// Whether a fetch request addresses messages by sequence number or by UID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressingMode {
    Seqnum,
    Uid,
}

/// Attributes that may be applied to mailbox listings.
///
/// Only `\Noselect` is modelled; nothing currently produces it, but the
/// selection path must keep checking for it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MailboxAttribute {
    Noselect,
}

impl MailboxAttribute {
    pub fn name(&self) -> &'static str {
        match *self {
            MailboxAttribute::Noselect => "\\Noselect",
        }
    }
}

impl fmt::Display for MailboxAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Debug for MailboxAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <MailboxAttribute as fmt::Display>::fmt(self, f)
    }
}

/// One entry of a `LIST` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListedMailbox {
    pub name: String,
    pub attributes: Vec<MailboxAttribute>,
}

impl ListedMailbox {
    pub fn new(name: String) -> Self {
        ListedMailbox {
            name,
            attributes: vec![],
        }
    }
}

/// The counters of a `STATUS` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailboxStatus {
    pub messages: usize,
    /// Always 0; recency is not tracked.
    pub recent: usize,
    /// An upper bound on the next UID, not a tight guarantee.
    pub uidnext: u32,
    pub uidvalidity: u32,
    pub unseen: usize,
}
