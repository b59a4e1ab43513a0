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

use std::io;

use thiserror::Error;

/// Every failure the adapter reports upward.
///
/// Nothing here is recovered internally; the session layer decides how each
/// kind translates into a protocol-level response. The core performs no
/// retries and no silent fallback.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid mailbox name")]
    UnsafeName,
    #[error("Mailbox already exists")]
    MailboxExists,
    #[error("Mailbox does not exist")]
    NxMailbox,
    #[error("Mailbox is not selectable")]
    MailboxUnselectable,
    #[error("Unrecognised flag")]
    NxFlag,
    #[error("Malformed sequence set")]
    MalformedSequenceSet,
    #[error("No such message")]
    NxMessage,
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
