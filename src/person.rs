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

//! Loose parsing of email address headers.
//!
//! Real `From`/`To` headers are full of slop, so this is a best-effort
//! extractor rather than an RFC 5322 parser: it never fails, it just
//! degrades to treating the whole input as an address. Good enough for
//! display and for feeding the search index.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // The two quote styles are spelled out as alternatives since the
    // obvious backreference form is not expressible here.
    static ref QUOTED_NAME_ADDR: Regex = Regex::new(
        r#"^(?:"([^"]*)"|'([^']*)')\s*<((\S+?)@\S+?)>"#
    ).unwrap();
    static ref NAME_ADDR: Regex =
        Regex::new(r"^(.+?)\s*<((\S+?)@\S+?)>").unwrap();
    static ref BARE_BRACKETED: Regex =
        Regex::new(r"<((\S+?)@\S+?)>").unwrap();
    static ref BARE_ADDR: Regex = Regex::new(r"((\S+?)@\S+)").unwrap();
}

/// One entry of an address header: a display name, if present, something
/// email-address-shaped, and the address's local part ("handle"), which is
/// how people usually get referred to when there is no display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Person {
    pub name: Option<String>,
    pub email: String,
    pub handle: Option<String>,
}

impl Person {
    /// Parse a single address, most structured form first.
    ///
    /// Inputs that look nothing like an address come back with the whole
    /// (trimmed) input as the email and no handle, so "addresses" such as
    /// `undisclosed-recipients:;` still display as themselves.
    pub fn from_string(raw: &str) -> Self {
        let raw = raw.trim();

        if let Some(cap) = QUOTED_NAME_ADDR.captures(raw) {
            let name = cap
                .get(1)
                .or_else(|| cap.get(2))
                .map(|m| m.as_str().to_owned());
            return Person {
                name,
                email: cap[3].to_owned(),
                handle: Some(cap[4].to_owned()),
            };
        }

        if let Some(cap) = NAME_ADDR.captures(raw) {
            return Person {
                name: Some(cap[1].to_owned()),
                email: cap[2].to_owned(),
                handle: Some(cap[3].to_owned()),
            };
        }

        if let Some(cap) = BARE_BRACKETED.captures(raw) {
            return Person {
                name: None,
                email: cap[1].to_owned(),
                handle: Some(cap[2].to_owned()),
            };
        }

        if let Some(cap) = BARE_ADDR.captures(raw) {
            return Person {
                name: None,
                email: cap[1].to_owned(),
                handle: Some(cap[2].to_owned()),
            };
        }

        Person {
            name: None,
            email: raw.to_owned(),
            handle: None,
        }
    }

    /// Parse a whole header value: comma-separated addresses, where commas
    /// inside double-quoted display names do not split.
    pub fn many_from_string(raw: &str) -> Vec<Self> {
        let raw = raw.replace(|c| '\t' == c || '\r' == c || '\n' == c, " ");
        let mut out = Vec::new();
        let mut start = 0;
        let mut in_quotes = false;

        for (ix, ch) in raw.char_indices() {
            match ch {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    if !raw[start..ix].trim().is_empty() {
                        out.push(Person::from_string(&raw[start..ix]));
                    }
                    start = ix + 1;
                },
                _ => (),
            }
        }

        if !raw[start..].trim().is_empty() {
            out.push(Person::from_string(&raw[start..]));
        }

        out
    }

    /// The name to show in message listings: the display name if there is
    /// one, else the handle, else the address itself.
    pub fn display_name(&self) -> &str {
        if let Some(ref name) = self.name {
            name
        } else if let Some(ref handle) = self.handle {
            handle
        } else {
            &self.email
        }
    }

    /// The text this person contributes to the search index. The handle is
    /// included as its own token so handle-only searches match.
    pub fn indexable_text(&self) -> String {
        self.name
            .iter()
            .chain(Some(&self.email))
            .chain(self.handle.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name {
            // Only names carrying a quote get the quoted-and-escaped
            // rendering; everything else prints as-is
            Some(ref name) if name.contains('"') => {
                write!(f, "{:?} <{}>", name, self.email)
            },
            Some(ref name) => write!(f, "{} <{}>", name, self.email),
            None => write!(f, "{}", self.email),
        }
    }
}
