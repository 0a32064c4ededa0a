/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Splits a FUSE path into the handful of semantic components the rest of
//! the crate cares about: how deep it is, and what its `/`-separated
//! segments are. The decomposer knows nothing about databases; it treats
//! the path as opaque bytes between separators.

use std::fmt::Display;

/// Depth of a mount-relative path: `/` is level 0, `/db` is level 1, and so on.
pub fn level(path: &str) -> usize {
    if path == "/" {
        0
    } else {
        path.chars().filter(|&c| c == '/').count()
    }
}

/// The non-empty `/`-separated segments of `path`, in order. Consecutive
/// separators and a trailing separator produce no empty segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// The *i*-th non-empty segment of `path`, or `None` past the last one.
pub fn component(path: &str, i: usize) -> Option<&str> {
    segments(path).into_iter().nth(i)
}

/// A validated identifier (database, table, or column name) taken from a
/// path component. Identifiers can't be parameter-bound the way values can,
/// so they are lexically checked once here instead of being escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'a>(&'a str);

impl<'a> Ident<'a> {
    /// Accepts `name` only if every byte is `[A-Za-z0-9_]`, matching what a
    /// MySQL-compatible server allows inside backticks without further
    /// escaping.
    pub fn new(name: &'a str) -> Option<Self> {
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            Some(Ident(name))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

impl Display for Ident<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `true` iff the leaf component of `path` begins with `.`. Used to reject
/// hidden-file creation.
pub fn leaf_is_hidden(path: &str) -> bool {
    segments(path)
        .last()
        .is_some_and(|leaf| leaf.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_of_root_is_zero() {
        assert_eq!(level("/"), 0);
    }

    #[test]
    fn level_counts_separators() {
        assert_eq!(level("/db"), 1);
        assert_eq!(level("/db/tab"), 2);
        assert_eq!(level("/db/tab/pk"), 3);
        assert_eq!(level("/db/tab/pk/col"), 4);
    }

    #[test]
    fn segments_ignore_trailing_slash() {
        assert_eq!(segments("/db/tab/"), vec!["db", "tab"]);
    }

    #[test]
    fn segments_collapse_consecutive_slashes() {
        assert_eq!(segments("/db//tab"), vec!["db", "tab"]);
    }

    #[test]
    fn component_past_end_is_none() {
        assert_eq!(component("/db/tab", 2), None);
    }

    #[test]
    fn component_indexes_from_zero() {
        assert_eq!(component("/db/tab/pk/col", 3), Some("col"));
    }

    #[test]
    fn ident_rejects_non_word_bytes() {
        assert!(Ident::new("my_table1").is_some());
        assert!(Ident::new("my-table").is_none());
        assert!(Ident::new("my table").is_none());
        assert!(Ident::new("").is_none());
        assert!(Ident::new("drop`table").is_none());
    }

    #[test]
    fn hidden_leaf_detected() {
        assert!(leaf_is_hidden("/db/tab/pk/.swp"));
        assert!(!leaf_is_hidden("/db/tab/pk/col"));
    }
}
