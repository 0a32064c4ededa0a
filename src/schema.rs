/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Resolves a table's primary-key column and caches field-index lookups.
//!
//! A row can only be named by its primary key, so every level-3/4 path
//! needs this resolved before it can be addressed; caching avoids repeating
//! a `SHOW FIELDS` round trip on every single upcall.

use std::collections::HashMap;

use log::debug;

use crate::db::{DbClient, DbError};
use crate::sql;

/// Key under which a primary-key resolution is cached: `(database, table)`.
type CacheKey = (String, String);

/// Caches `(database, table) -> Option<primary key column>` for the process
/// lifetime, invalidated whenever the underlying schema changes.
#[derive(Default)]
pub struct SchemaReflector {
    cache: HashMap<CacheKey, Option<String>>,
}

impl SchemaReflector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the primary-key column of `table` in `database`, consulting
    /// (and populating) the cache. Returns `Ok(None)` when the table has no
    /// primary key; a server-side failure (e.g. unknown table) propagates.
    pub fn primary_key_of(
        &mut self,
        db: &mut DbClient,
        database: &str,
        table: &str,
    ) -> Result<Option<String>, DbError> {
        let key = (database.to_owned(), table.to_owned());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }
        let pk = Self::resolve_primary_key(db, table)?;
        debug!("resolved primary key of '{database}.{table}': {pk:?}");
        self.cache.insert(key, pk.clone());
        Ok(pk)
    }

    /// Directly installs a known primary-key column, used right after
    /// `CREATE TABLE` so the very next upcall doesn't pay a round trip.
    pub fn set(&mut self, database: &str, table: &str, pk: &str) {
        self.cache
            .insert((database.to_owned(), table.to_owned()), Some(pk.to_owned()));
    }

    /// Drops every cached entry for `database` (a `DROP DATABASE` or a
    /// `CREATE DATABASE` invalidates all of its tables' cached keys).
    pub fn invalidate_database(&mut self, database: &str) {
        self.cache.retain(|(db, _), _| db != database);
    }

    /// Drops the cached entry for a single table.
    pub fn invalidate_table(&mut self, database: &str, table: &str) {
        self.cache
            .remove(&(database.to_owned(), table.to_owned()));
    }

    fn resolve_primary_key(db: &mut DbClient, table: &str) -> Result<Option<String>, DbError> {
        let stmt = sql::list_columns(
            crate::path::Ident::new(table)
                .expect("table identifier already validated by the caller"),
        );
        let rowset = db.execute(&stmt)?;
        let Some(field_idx) = rowset.field_index("Field") else {
            return Ok(None);
        };
        let Some(key_idx) = rowset.field_index("Key") else {
            return Ok(None);
        };
        for row in &rowset.rows {
            let is_primary = row[key_idx]
                .as_deref()
                .map(|v| v == b"PRI")
                .unwrap_or(false);
            if is_primary {
                let name = row[field_idx]
                    .as_deref()
                    .map(|v| String::from_utf8_lossy(v).into_owned());
                return Ok(name);
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_hits_cache_without_a_connection() {
        let mut reflector = SchemaReflector::new();
        reflector.set("demo", "people", "id");
        assert_eq!(
            reflector.cache.get(&("demo".to_owned(), "people".to_owned())),
            Some(&Some("id".to_owned()))
        );
    }

    #[test]
    fn invalidate_database_drops_only_that_database() {
        let mut reflector = SchemaReflector::new();
        reflector.set("demo", "people", "id");
        reflector.set("other", "things", "id");
        reflector.invalidate_database("demo");
        assert!(
            reflector
                .cache
                .get(&("demo".to_owned(), "people".to_owned()))
                .is_none()
        );
        assert!(
            reflector
                .cache
                .get(&("other".to_owned(), "things".to_owned()))
                .is_some()
        );
    }

    #[test]
    fn invalidate_table_drops_only_that_table() {
        let mut reflector = SchemaReflector::new();
        reflector.set("demo", "people", "id");
        reflector.set("demo", "pets", "id");
        reflector.invalidate_table("demo", "people");
        assert!(
            reflector
                .cache
                .get(&("demo".to_owned(), "people".to_owned()))
                .is_none()
        );
        assert!(
            reflector
                .cache
                .get(&("demo".to_owned(), "pets".to_owned()))
                .is_some()
        );
    }
}
