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

//! Turnsole presents a label-indexed, search-driven mail store through the
//! positional mailbox model that IMAP clients expect.
//!
//! The crate is a library; the IMAP wire protocol and session loop live in
//! the embedding server and talk to [`store::MailStore`]. The mail index and
//! the raw-message store are abstract collaborators defined in [`backend`].
//!
//! - [`store`] — the adapter proper: mailbox naming and translation,
//!   sequence-number virtualization, the dirty-checked cache, fetch
//!   resolution, and per-message flag handling.
//! - [`backend`] — the contracts the underlying index and raw store must
//!   fulfil.
//! - [`person`] — address-book helpers for parsing RFC 822-style address
//!   strings.
//! - [`support`] — cross-cutting concerns (errors).

pub mod backend;
pub mod person;
pub mod store;
pub mod support;
