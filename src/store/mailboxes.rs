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

use std::collections::HashSet;
use std::convert::TryFrom;

use log::info;

use super::defs::MailStore;
use super::labels;
use crate::backend::{MetaIndex, RawStore};
use crate::store::model::{ListedMailbox, MailboxAttribute, MailboxStatus};
use crate::support::error::Error;

/// Placeholder validity reported for every mailbox.
///
/// Known limitation: this does not change when the backing index is rebuilt,
/// so sessions spanning a reindex are not guaranteed correct behaviour.
const UID_VALIDITY: u32 = 1;

impl<M: MetaIndex, R: RawStore> MailStore<M, R> {
    /// List every mailbox a client may address: each index label under its
    /// IMAP name, plus the ephemeral mailboxes created this process
    /// lifetime. This corresponds to `LIST`.
    pub fn mailboxes(&self) -> Result<Vec<ListedMailbox>, Error> {
        let mut out = self
            .index
            .all_labels()?
            .into_iter()
            .map(|label| ListedMailbox::new(labels::tag_to_imap(&label)))
            .collect::<Vec<_>>();
        out.extend(self.ephemeral_mailboxes.lock().unwrap().iter().cloned());

        // Collapse duplicates, keeping the first occurrence
        let mut seen = HashSet::new();
        out.retain(|mb| seen.insert(mb.name.clone()));
        Ok(out)
    }

    /// Record a new client-created mailbox. This corresponds to `CREATE`.
    ///
    /// The mailbox is held in memory only; it becomes real once messages
    /// are labelled into it through normal flagging. Not persisted across
    /// restarts by design.
    pub fn create_mailbox(&self, name: &str) -> Result<(), Error> {
        labels::validate_mailbox_name(name)?;

        let label_names = self
            .index
            .all_labels()?
            .into_iter()
            .map(|label| labels::tag_to_imap(&label))
            .collect::<HashSet<_>>();

        // Existence check and insert under one lock acquisition so two
        // sessions cannot both create the same name
        let mut ephemeral = self.ephemeral_mailboxes.lock().unwrap();
        if label_names.contains(name)
            || ephemeral.iter().any(|mb| mb.name == name)
        {
            return Err(Error::MailboxExists);
        }

        info!(
            "{} Created ephemeral mailbox {:?}",
            self.log_prefix, name
        );
        ephemeral.push(ListedMailbox::new(name.to_owned()));
        Ok(())
    }

    /// Confirm that `name` can be selected. This corresponds to `SELECT`
    /// and `EXAMINE`.
    ///
    /// There is no per-session cursor to set up: positional state is
    /// derived from the sequence cache on every call, addressed by name, so
    /// success simply echoes the name back.
    pub fn select_mailbox(&self, name: &str) -> Result<String, Error> {
        labels::validate_mailbox_name(name)?;

        let all = self.mailboxes()?;
        let entry = all
            .iter()
            .find(|mb| mb.name == name)
            .ok_or(Error::NxMailbox)?;
        if entry.attributes.contains(&MailboxAttribute::Noselect) {
            return Err(Error::MailboxUnselectable);
        }

        Ok(name.to_owned())
    }

    /// Compute the counters of a `STATUS` response.
    ///
    /// `uidnext` is the index size plus one — an upper bound on the next
    /// UID, not a tight guarantee — and `recent` is always 0 since recency
    /// is not tracked.
    pub fn mailbox_status(&self, name: &str) -> Result<MailboxStatus, Error> {
        labels::validate_mailbox_name(name)?;

        let size = self.index.size()?;
        Ok(MailboxStatus {
            messages: if name == labels::ALL_MAIL {
                size
            } else {
                self.message_count(name)?
            },
            recent: 0,
            uidnext: u32::try_from(size + 1).unwrap_or(u32::MAX),
            uidvalidity: UID_VALIDITY,
            unseen: self.unseen_count(name)?,
        })
    }
}
