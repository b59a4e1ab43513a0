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

//! Translation between IMAP mailbox/flag names and index labels/tags.
//!
//! Everything here is pure and makes no backend calls. The single source of
//! truth is `SPECIAL_MAILBOXES`; both lookup directions are derived from it
//! so that the two can never disagree.
//!
//! Names outside the special table must carry the `~` marker, which denotes
//! "the index label of this exact name". The marker keeps arbitrary labels
//! clear of the IMAP-reserved namespace, so every label is representable as
//! a mailbox or flag even when IMAP has no reserved name for it.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::support::error::Error;

/// The marker prefix denoting a plain index label.
pub const LABEL_MARKER: char = '~';

/// The special mailbox mapping onto the whole index.
pub const ALL_MAIL: &str = "All Mail";

/// Tags that may be toggled per message.
pub const MESSAGE_MUTABLE_STATE: &[&str] = &["starred", "unread", "deleted"];

/// Tags fixed at message creation.
pub const MESSAGE_IMMUTABLE_STATE: &[&str] =
    &["attachment", "signed", "encrypted", "draft", "sent"];

struct SpecialMailbox {
    imap: &'static str,
    /// The index tag behind this name, or `None` if the property is
    /// synthetic (computed, never stored).
    tag: Option<&'static str>,
}

/// Relates IMAP-reserved names and flags to their index counterparts.
///
/// Order matters for reverse lookup: the first entry carrying a tag wins.
/// `unread` deliberately has no entry; seen-ness is the computed negation of
/// the `unread` tag, so the tag itself renders as `~unread`.
static SPECIAL_MAILBOXES: &[SpecialMailbox] = &[
    SpecialMailbox {
        imap: "\\Starred",
        tag: Some("starred"),
    },
    SpecialMailbox {
        imap: "\\Seen",
        tag: None,
    },
    SpecialMailbox {
        imap: "\\Deleted",
        tag: Some("deleted"),
    },
    SpecialMailbox {
        imap: "\\Answered",
        tag: None,
    },
    SpecialMailbox {
        imap: "\\Draft",
        tag: Some("draft"),
    },
    SpecialMailbox {
        imap: "Sent",
        tag: Some("sent"),
    },
    SpecialMailbox {
        imap: ALL_MAIL,
        tag: None,
    },
    SpecialMailbox {
        imap: "INBOX",
        tag: Some("inbox"),
    },
];

lazy_static! {
    static ref IMAP_TO_TAG: HashMap<&'static str, Option<&'static str>> =
        SPECIAL_MAILBOXES.iter().map(|sm| (sm.imap, sm.tag)).collect();
    static ref TAG_TO_IMAP: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        for sm in SPECIAL_MAILBOXES {
            if let Some(tag) = sm.tag {
                map.entry(tag).or_insert(sm.imap);
            }
        }
        map
    };
}

/// Check that `name` is addressable at all: either a reserved special name
/// or a `~`-marked label.
pub fn validate_mailbox_name(name: &str) -> Result<(), Error> {
    if name.starts_with(LABEL_MARKER) || IMAP_TO_TAG.contains_key(name) {
        Ok(())
    } else {
        Err(Error::UnsafeName)
    }
}

/// Translate an IMAP mailbox name or flag into its index tag.
///
/// Special names resolve through the table, possibly to `None` for
/// synthetic properties such as `\Seen`. Reserved-looking names outside the
/// table fail with `Error::NxFlag`. Everything else has its `~` marker
/// stripped.
pub fn imap_to_tag(name: &str) -> Result<Option<String>, Error> {
    if let Some(&tag) = IMAP_TO_TAG.get(name) {
        Ok(tag.map(str::to_owned))
    } else if name.starts_with('\\') {
        Err(Error::NxFlag)
    } else {
        Ok(Some(
            name.strip_prefix(LABEL_MARKER).unwrap_or(name).to_owned(),
        ))
    }
}

/// Translate an index tag into its IMAP name.
///
/// Total: tags without a reserved name get the `~` marker attached.
pub fn tag_to_imap(tag: &str) -> String {
    match TAG_TO_IMAP.get(tag) {
        Some(&imap) => imap.to_owned(),
        None => format!("{}{}", LABEL_MARKER, tag),
    }
}

/// Render a mailbox name as a term of the index's search syntax.
///
/// Special names backed by a tag resolve to the marked form of that tag;
/// all other names (marked labels, tag-less special names) pass through
/// literally.
pub fn query_token(name: &str) -> String {
    match IMAP_TO_TAG.get(name) {
        Some(&Some(tag)) => format!("{}{}", LABEL_MARKER, tag),
        _ => name.to_owned(),
    }
}
