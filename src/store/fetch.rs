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
use super::messages::MessageView;
use crate::backend::{MetaIndex, RawStore};
use crate::store::model::{AddressingMode, MessageId, Seqnum, SequenceSet};
use crate::support::error::Error;

impl<M: MetaIndex, R: RawStore> MailStore<M, R> {
    /// Resolve `set` against `mailbox` and return a message handle for
    /// every addressed message, in request order, duplicates included. This
    /// corresponds to `FETCH` and `UID FETCH`.
    ///
    /// The whole set is resolved against one snapshot of the mailbox's
    /// sequence list, so `*` and every sequence number refer to the same
    /// listing even if the index moves mid-call.
    ///
    /// Unbounded range bounds resolve from the message count in both
    /// modes. For UIDs that is an approximation of the same kind as the
    /// `uidnext` counter, and it keeps the expansion proportional to the
    /// mailbox size rather than to the width of a sparse UID space.
    ///
    /// In sequence-number mode a position beyond the end of the mailbox
    /// fails with `NxMessage` and nothing is returned. In UID mode ids are
    /// used as given without a membership check; an id the index never
    /// assigned surfaces as `NxMessage` from the returned handle instead.
    pub fn fetch(
        &self,
        mailbox: &str,
        set: &SequenceSet,
        mode: AddressingMode,
    ) -> Result<Vec<MessageView<'_, M, R>>, Error> {
        let seq = self.sequence_for(mailbox)?;
        let last = seq.len() as u32;

        let mut out = Vec::new();
        for n in set.expand(last) {
            let id = match mode {
                AddressingMode::Uid => {
                    MessageId::of(n).ok_or(Error::NxMessage)?
                },
                AddressingMode::Seqnum => Seqnum::of(n)
                    .and_then(|s| seq.get(s))
                    .ok_or(Error::NxMessage)?,
            };
            out.push(self.message(id));
        }

        Ok(out)
    }
}
