/*
 * headers.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Silq, an HTTP client library.
 *
 * Silq is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Silq is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Silq.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Ordered, case-insensitive, multi-valued header map.
//!
//! Names keep the spelling they were inserted with; lookups ignore ASCII case.
//! Duplicate names are kept in insertion order, which is also iteration order.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values of `name` with a single value. The new entry takes the
    /// position of the first existing one, or is appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(first) => {
                self.entries[first] = (name, value);
                let mut i = first + 1;
                while i < self.entries.len() {
                    if self.entries[i].0.eq_ignore_ascii_case(&self.entries[first].0) {
                        self.entries.remove(i);
                    } else {
                        i += 1;
                    }
                }
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Append a value, keeping any existing values of the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value inserted for `name`.
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    /// All values for `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove every value of `name`. Returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        before - self.entries.len()
    }

    /// `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Check a header the client is about to send: non-empty token name, non-empty
/// value, no CR/LF/NUL anywhere.
pub fn validate(name: &str, value: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidHeader("empty header name".into()));
    }
    if !name.bytes().all(is_token_byte) {
        return Err(Error::InvalidHeader(format!("invalid header name {:?}", name)));
    }
    if value.is_empty() {
        return Err(Error::InvalidHeader(format!("empty value for header {}", name)));
    }
    if value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0) {
        return Err(Error::InvalidHeader(format!(
            "control character in value for header {}",
            name
        )));
    }
    Ok(())
}

/// RFC 9110 tchar.
pub(crate) fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut h = HeaderMap::new();
        h.add("Content-Type", "text/plain");
        assert_eq!(h.get_first("content-type"), Some("text/plain"));
        assert_eq!(h.get_first("CONTENT-TYPE"), Some("text/plain"));
        assert!(h.get_first("content-length").is_none());
    }

    #[test]
    fn add_keeps_duplicates_in_order() {
        let mut h = HeaderMap::new();
        h.add("Set-Cookie", "a=1");
        h.add("X-Other", "x");
        h.add("set-cookie", "b=2");
        assert_eq!(h.get_first("set-cookie"), Some("a=1"));
        assert_eq!(h.get_all("SET-COOKIE"), vec!["a=1", "b=2"]);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn set_replaces_every_value_in_place() {
        let mut h = HeaderMap::new();
        h.add("Accept", "a");
        h.add("X-Keep", "k");
        h.add("accept", "b");
        h.set("ACCEPT", "c");
        let pairs: Vec<_> = h.iter().collect();
        assert_eq!(pairs, vec![("ACCEPT", "c"), ("X-Keep", "k")]);
    }

    #[test]
    fn remove_counts_values() {
        let mut h = HeaderMap::new();
        h.add("a", "1");
        h.add("A", "2");
        assert_eq!(h.remove("a"), 2);
        assert!(h.is_empty());
    }

    #[test]
    fn validate_rejects_injection_and_empties() {
        assert!(validate("x-ok", "fine ; value").is_ok());
        assert!(validate("", "v").is_err());
        assert!(validate("bad name", "v").is_err());
        assert!(validate("x", "").is_err());
        assert!(validate("x", "a\r\nInjected: 1").is_err());
    }
}
