/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Builds the exactly-one-statement-per-operation SQL used by the rest of
//! the crate. Identifiers (database/table/column names) are lexically
//! validated by [`crate::path::Ident`] before they ever reach this module
//! and are inlined between backticks; values (primary-key values, cell
//! contents) are never inlined — they travel as bound parameters.

use mysql::Params;
use mysql::params;

use crate::path::Ident;

/// `SHOW DATABASES`
pub fn list_databases() -> &'static str {
    "SHOW DATABASES"
}

/// `SHOW TABLES` (run after selecting the database)
pub fn list_tables() -> &'static str {
    "SHOW TABLES"
}

/// `` SELECT `pk` FROM `tab` ORDER BY `pk` ``
pub fn list_rows(tab: Ident, pk: Ident) -> String {
    format!("SELECT `{pk}` FROM `{tab}` ORDER BY `{pk}`")
}

/// `SHOW FIELDS FROM \`tab\``
pub fn list_columns(tab: Ident) -> String {
    format!("SHOW FIELDS FROM `{tab}`")
}

/// `` SELECT COUNT(*) FROM `tab` ``
pub fn count_rows(tab: Ident) -> String {
    format!("SELECT COUNT(*) FROM `{tab}`")
}

/// `` SELECT COUNT(*) FROM `tab` WHERE `pk` = :pkval ``
pub fn row_exists(tab: Ident, pk: Ident, pkval: &str) -> (String, Params) {
    (
        format!("SELECT COUNT(*) FROM `{tab}` WHERE `{pk}` = :pkval"),
        params! { "pkval" => pkval },
    )
}

/// `` SELECT `col`, LENGTH(`col`) FROM `tab` WHERE `pk` = :pkval ``
pub fn read_cell(tab: Ident, pk: Ident, col: Ident, pkval: &str) -> (String, Params) {
    (
        format!("SELECT `{col}`, LENGTH(`{col}`) FROM `{tab}` WHERE `{pk}` = :pkval"),
        params! { "pkval" => pkval },
    )
}

/// `` SELECT `col` FROM `tab` WHERE `pk` = :pkval ``
pub fn cell_exists(tab: Ident, pk: Ident, col: Ident, pkval: &str) -> (String, Params) {
    (
        format!("SELECT `{col}` FROM `{tab}` WHERE `{pk}` = :pkval"),
        params! { "pkval" => pkval },
    )
}

/// `` CREATE DATABASE `db` ``
pub fn create_database(db: Ident) -> String {
    format!("CREATE DATABASE `{db}`")
}

/// `` CREATE TABLE `tab`(id varchar(255), PRIMARY KEY(id)) ``
pub fn create_table(tab: Ident) -> String {
    format!("CREATE TABLE `{tab}`(id varchar(255), PRIMARY KEY(id))")
}

/// `` INSERT INTO `tab`(`pk`) VALUES(:pkval) ``
pub fn insert_row(tab: Ident, pk: Ident, pkval: &str) -> (String, Params) {
    (
        format!("INSERT INTO `{tab}`(`{pk}`) VALUES(:pkval)"),
        params! { "pkval" => pkval },
    )
}

/// `` ALTER TABLE `tab` ADD `col` text ``
pub fn add_column(tab: Ident, col: Ident) -> String {
    format!("ALTER TABLE `{tab}` ADD `{col}` text")
}

/// `` DROP DATABASE `db` ``
pub fn drop_database(db: Ident) -> String {
    format!("DROP DATABASE `{db}`")
}

/// `` DROP TABLE `tab` ``
pub fn drop_table(tab: Ident) -> String {
    format!("DROP TABLE `{tab}`")
}

/// `` DELETE FROM `tab` WHERE `pk` = :pkval ``
pub fn delete_row(tab: Ident, pk: Ident, pkval: &str) -> (String, Params) {
    (
        format!("DELETE FROM `{tab}` WHERE `{pk}` = :pkval"),
        params! { "pkval" => pkval },
    )
}

/// `` UPDATE `tab` SET `col` = NULL WHERE `pk` = :pkval ``
pub fn null_cell(tab: Ident, pk: Ident, col: Ident, pkval: &str) -> (String, Params) {
    (
        format!("UPDATE `{tab}` SET `{col}` = NULL WHERE `{pk}` = :pkval"),
        params! { "pkval" => pkval },
    )
}

/// `` UPDATE `tab` SET `col` = :new WHERE `pk` = :pkval ``
pub fn write_cell(tab: Ident, pk: Ident, col: Ident, pkval: &str, new: &[u8]) -> (String, Params) {
    (
        format!("UPDATE `{tab}` SET `{col}` = :new WHERE `{pk}` = :pkval"),
        params! { "new" => new, "pkval" => pkval },
    )
}

/// Appends `LIMIT 1` to a `SELECT` statement that doesn't already carry a
/// `LIMIT` clause. Non-`SELECT` statements are returned unchanged.
pub fn with_limit_one(stmt: &str) -> String {
    let upper = stmt.to_ascii_uppercase();
    if upper.contains("SELECT") && !upper.contains("LIMIT") {
        format!("{stmt} LIMIT 1")
    } else {
        stmt.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> Ident<'_> {
        Ident::new(s).unwrap()
    }

    #[test]
    fn list_rows_quotes_identifiers() {
        assert_eq!(
            list_rows(ident("people"), ident("id")),
            "SELECT `id` FROM `people` ORDER BY `id`"
        );
    }

    #[test]
    fn with_limit_one_appends_once() {
        assert_eq!(
            with_limit_one("SELECT * FROM `t`"),
            "SELECT * FROM `t` LIMIT 1"
        );
        assert_eq!(
            with_limit_one("SELECT * FROM `t` LIMIT 1"),
            "SELECT * FROM `t` LIMIT 1"
        );
    }

    #[test]
    fn with_limit_one_ignores_non_select() {
        assert_eq!(with_limit_one("SHOW FIELDS FROM `t`"), "SHOW FIELDS FROM `t`");
    }

    #[test]
    fn create_table_statement() {
        assert_eq!(
            create_table(ident("people")),
            "CREATE TABLE `people`(id varchar(255), PRIMARY KEY(id))"
        );
    }
}
