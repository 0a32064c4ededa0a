/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Thin wrapper around the synchronous `mysql` crate, exposing exactly the
//! surface the rest of the crate needs: connect, select a database, execute
//! a statement and get rows back, and read the server's errno/errmsg pair
//! when something fails.

use mysql::prelude::*;
use mysql::{Conn, Opts, OptsBuilder, Params, Row};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("database error {errno}: {errmsg}")]
pub struct DbError {
    pub errno: u16,
    pub errmsg: String,
}

impl DbError {
    fn from_mysql(err: mysql::Error) -> Self {
        match &err {
            mysql::Error::MySqlError(e) => DbError {
                errno: e.code,
                errmsg: e.message.clone(),
            },
            other => DbError {
                errno: 0,
                errmsg: other.to_string(),
            },
        }
    }
}

/// A single executed statement's result: the column names (in order) and
/// every row, each as a vector of nullable byte strings.
pub struct Rowset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Vec<u8>>>>,
}

impl Rowset {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

fn to_rowset(rows: Vec<Row>) -> Rowset {
    let columns: Vec<String> = rows
        .first()
        .map(|r| {
            r.columns_ref()
                .iter()
                .map(|c| c.name_str().into_owned())
                .collect()
        })
        .unwrap_or_default();
    let nfields = columns.len();
    let rows = rows
        .into_iter()
        .map(|mut row| {
            (0..nfields)
                .map(|i| row.take::<Option<Vec<u8>>, usize>(i).flatten())
                .collect()
        })
        .collect();
    Rowset { columns, rows }
}

/// The live connection to the database server, owned exclusively by the
/// filesystem process for its whole lifetime.
pub struct DbClient {
    conn: Conn,
}

impl DbClient {
    pub fn connect(server: &str, user: &str, password: &str) -> Result<Self, DbError> {
        let opts = Opts::from(
            OptsBuilder::new()
                .ip_or_hostname(Some(server))
                .user(Some(user))
                .pass(Some(password)),
        );
        let conn = Conn::new(opts).map_err(DbError::from_mysql)?;
        Ok(DbClient { conn })
    }

    pub fn select_database(&mut self, name: &str) -> Result<(), DbError> {
        self.conn
            .query_drop(format!("USE `{name}`"))
            .map_err(DbError::from_mysql)
    }

    /// Executes a statement with no bound parameters and returns its rows.
    pub fn execute(&mut self, stmt: &str) -> Result<Rowset, DbError> {
        self.execute_params(stmt, Params::Empty)
    }

    /// Executes a statement with bound parameters and returns its rows.
    pub fn execute_params(&mut self, stmt: &str, params: Params) -> Result<Rowset, DbError> {
        let rows: Vec<Row> = self
            .conn
            .exec(stmt, params)
            .map_err(DbError::from_mysql)?;
        Ok(to_rowset(rows))
    }
}
