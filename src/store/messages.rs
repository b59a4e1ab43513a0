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

use super::defs::MailStore;
use super::labels;
use crate::backend::{MetaIndex, RawStore};
use crate::store::model::{MessageId, Seqnum};
use crate::support::error::Error;

/// A per-message handle for the session layer.
///
/// Constructed on demand and never persisted. The raw body and the sequence
/// position are fetched lazily and remembered only for the handle's own
/// lifetime; flags are always computed fresh.
pub struct MessageView<'a, M, R> {
    store: &'a MailStore<M, R>,
    id: MessageId,
    raw: Option<Vec<u8>>,
    seqno: Option<Seqnum>,
}

impl<'a, M: MetaIndex, R: RawStore> MessageView<'a, M, R> {
    /// The message's UID.
    pub fn uid(&self) -> MessageId {
        self.id
    }

    /// The message's current flags.
    pub fn flags(&self) -> Result<Vec<String>, Error> {
        self.store.message_flags(self.id)
    }

    /// Replace the message's flags with the whitespace-separated `flags`.
    pub fn set_flags(&self, flags: &str) -> Result<(), Error> {
        self.store.set_message_flags(self.id, flags)
    }

    /// The message's sequence number within `mailbox`, memoised for this
    /// handle's lifetime.
    pub fn seqno_in(&mut self, mailbox: &str) -> Result<Seqnum, Error> {
        if let Some(seqno) = self.seqno {
            return Ok(seqno);
        }

        let seqno = self.store.seqno_of(mailbox, self.id)?;
        self.seqno = Some(seqno);
        Ok(seqno)
    }

    /// The raw message text, read from the raw store at most once per
    /// handle.
    pub fn raw_body(&mut self) -> Result<&[u8], Error> {
        if self.raw.is_none() {
            let meta = self.store.index.message_meta(self.id)?;
            self.raw = Some(self.store.raw.read(&meta.loc)?);
        }

        Ok(self.raw.as_deref().unwrap())
    }
}

impl<M: MetaIndex, R: RawStore> MailStore<M, R> {
    /// Obtain a handle onto one message.
    ///
    /// The id is not checked here; a bad id surfaces as `NxMessage` from
    /// the first operation that touches the index.
    pub fn message(&self, id: MessageId) -> MessageView<'_, M, R> {
        MessageView {
            store: self,
            id,
            raw: None,
            seqno: None,
        }
    }

    /// Compute the IMAP flags of one message: its labels and state tags
    /// under their IMAP names, plus `\Seen` unless the message carries the
    /// `unread` tag.
    ///
    /// Seen-ness is never stored; it is always the negation of `unread`.
    pub fn message_flags(&self, id: MessageId) -> Result<Vec<String>, Error> {
        let meta = self.index.message_meta(id)?;
        let mut out = meta
            .labels
            .iter()
            .chain(meta.state.iter())
            .map(|tag| labels::tag_to_imap(tag))
            .collect::<Vec<_>>();

        let unread = labels::tag_to_imap("unread");
        if !out.contains(&unread) {
            out.push("\\Seen".to_owned());
        }

        Ok(out)
    }

    /// Replace the flags of one message. This corresponds to `STORE`.
    ///
    /// Every whitespace-separated token must translate; one unknown flag
    /// fails the whole call with nothing written. Tokens mapping to no
    /// stored tag (`\Seen`, `\Answered`) drop out — removing `unread` is
    /// how a message becomes seen.
    ///
    /// The tag set is applied to the message's own state and then to the
    /// labels of its whole thread: the index lists by thread, so a flag
    /// change must be mirrored there to stay visible in mailbox listings.
    pub fn set_message_flags(
        &self,
        id: MessageId,
        flags: &str,
    ) -> Result<(), Error> {
        let mut tags = Vec::new();
        for flag in flags.split_whitespace() {
            if let Some(tag) = labels::imap_to_tag(flag)? {
                tags.push(tag);
            }
        }

        self.index.set_message_state(id, &tags)?;

        let thread_id = self.index.message_meta(id)?.thread_id;
        self.index.set_thread_labels(thread_id, &tags)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::super::test_prelude::*;
    use crate::backend::MetaIndex;
    use crate::store::model::Seqnum;
    use crate::support::error::Error;

    #[test]
    fn flags_map_labels_and_state() {
        let setup = set_up();
        setup
            .store
            .index()
            .add(1, 1, &["inbox", "personal"], &["starred"]);

        let flags = setup.store.message_flags(MessageId::u(1)).unwrap();
        assert_eq!(
            vec![
                "INBOX".to_owned(),
                "~personal".to_owned(),
                "\\Starred".to_owned(),
                "\\Seen".to_owned(),
            ],
            flags
        );
    }

    #[test]
    fn seen_is_the_negation_of_unread() {
        let setup = set_up();
        setup.store.index().add(42, 1, &[], &["unread"]);

        let flags = setup.store.message_flags(MessageId::u(42)).unwrap();
        assert_eq!(vec!["~unread".to_owned()], flags);

        // \Seen maps to no stored tag, so this clears unread
        setup
            .store
            .set_message_flags(MessageId::u(42), "\\Seen")
            .unwrap();

        let flags = setup.store.message_flags(MessageId::u(42)).unwrap();
        assert_eq!(vec!["\\Seen".to_owned()], flags);
    }

    #[test]
    fn unknown_flag_fails_whole_call() {
        let setup = set_up();
        setup.store.index().add(1, 1, &[], &["unread"]);

        assert!(matches!(
            setup
                .store
                .set_message_flags(MessageId::u(1), "\\Starred \\Bogus"),
            Err(Error::NxFlag)
        ));
        // Nothing was written
        assert_eq!(
            vec!["~unread".to_owned()],
            setup.store.message_flags(MessageId::u(1)).unwrap()
        );
    }

    #[test]
    fn flag_changes_propagate_to_the_thread() {
        let setup = set_up();
        setup.store.index().add(1, 7, &["inbox"], &[]);
        setup.store.index().add(2, 7, &["inbox"], &[]);

        setup
            .store
            .set_message_flags(MessageId::u(1), "\\Starred ~urgent")
            .unwrap();

        // The target message's own state changed...
        let meta = setup.store.index().message_meta(MessageId::u(1)).unwrap();
        assert_eq!(
            vec!["starred".to_owned(), "urgent".to_owned()],
            meta.state
        );
        // ... and the whole thread's labels followed
        let meta = setup.store.index().message_meta(MessageId::u(2)).unwrap();
        assert_eq!(
            vec!["starred".to_owned(), "urgent".to_owned()],
            meta.labels
        );
        assert!(meta.state.is_empty());
    }

    #[test]
    fn missing_message() {
        let setup = set_up();
        assert!(matches!(
            setup.store.message_flags(MessageId::u(9)),
            Err(Error::NxMessage)
        ));
    }

    #[test]
    fn raw_body_is_fetched_once_per_handle() {
        let setup = set_up();
        setup.store.index().add(5, 1, &["inbox"], &[]);
        setup.store.raw.put(5, b"From: x\r\n\r\nhello");

        let mut handle = setup.store.message(MessageId::u(5));
        assert_eq!(&b"From: x\r\n\r\nhello"[..], handle.raw_body().unwrap());

        // Later changes to the raw store are invisible to this handle
        setup.store.raw.put(5, b"changed");
        assert_eq!(&b"From: x\r\n\r\nhello"[..], handle.raw_body().unwrap());

        // ... but a fresh handle sees them
        let mut fresh = setup.store.message(MessageId::u(5));
        assert_eq!(&b"changed"[..], fresh.raw_body().unwrap());
    }

    #[test]
    fn seqno_is_memoised_per_handle() {
        let setup = set_up();
        setup.store.index().add(10, 1, &["inbox"], &[]);
        setup.store.index().add(20, 2, &["inbox"], &[]);
        setup.store.index().touch("inbox", 1);

        let mut handle = setup.store.message(MessageId::u(20));
        assert_eq!(Seqnum::u(2), handle.seqno_in("INBOX").unwrap());

        // The mailbox shifts under the handle; the memoised position stays
        setup.store.index().add(5, 3, &["inbox"], &[]);
        setup.store.index().touch("inbox", 2);
        assert_eq!(Seqnum::u(2), handle.seqno_in("INBOX").unwrap());

        let mut fresh = setup.store.message(MessageId::u(20));
        assert_eq!(Seqnum::u(3), fresh.seqno_in("INBOX").unwrap());
    }
}
