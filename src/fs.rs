/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The filesystem operation state machine: implements `fuser::Filesystem`,
//! classifies every path into `{NotFound, File, Dir, DirNoPk}`, and
//! translates upcalls into the statements built by [`crate::sql`].
//!
//! `fuser` addresses everything by inode, but the tree here is a pure
//! projection of server state with no inode of its own, so this module
//! hands out inodes itself: the first `lookup`/`readdir` that mentions a
//! path assigns it one, kept for the process lifetime in `path_of`/`ino_of`.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::ops::Range;
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request,
};
use log::warn;

use crate::config::Options;
use crate::db::DbClient;
use crate::errors::{self, FsError};
use crate::path::{self, Ident};
use crate::rowset::{self, FieldSelector};
use crate::schema::SchemaReflector;
use crate::sql;

const TTL: Duration = Duration::from_secs(1);
const ROOT_INODE: u64 = 1;

/// The outcome of classifying a path, per the §4.5 state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathType {
    NotFound,
    File,
    Dir,
    /// A level-2 directory (table) with no primary key: listable, not
    /// descendable into rows.
    DirNoPk,
}

/// Builds the content bytes presented to a reader: cell text plus a single
/// trailing `\n`, never persisted into the column itself.
fn framed(text: &[u8]) -> Vec<u8> {
    let mut buf = text.to_vec();
    buf.push(b'\n');
    buf
}

/// Clamps a `(offset, size)` read request against the framed content
/// length, returning the byte range to copy (possibly empty, never past
/// the end).
fn read_range(content_len: usize, offset: i64, size: u32) -> Range<usize> {
    let offset = offset.max(0) as usize;
    if offset >= content_len {
        return 0..0;
    }
    let end = (offset + size as usize).min(content_len);
    offset..end
}

/// Splices `data` into `text` at `offset`, zero-padding any gap when the
/// write starts past the current end.
fn spliced(text: &[u8], offset: i64, data: &[u8]) -> Vec<u8> {
    let offset = offset.max(0) as usize;
    let required = (offset + data.len()).max(text.len());
    let mut buf = text.to_vec();
    buf.resize(required, 0);
    buf[offset..offset + data.len()].copy_from_slice(data);
    buf
}

/// Shrinks `text` to `size` bytes. Growing is a silent no-op, preserved
/// unchanged from the system this was modelled on.
fn truncated(text: &[u8], size: u64) -> Vec<u8> {
    let size = size as usize;
    if size >= text.len() {
        text.to_vec()
    } else {
        text[..size].to_vec()
    }
}

pub struct DbFs {
    db: DbClient,
    reflector: SchemaReflector,
    options: Options,
    path_of: HashMap<u64, String>,
    ino_of: HashMap<String, u64>,
    next_ino: u64,
}

impl DbFs {
    pub fn new(db: DbClient, options: Options) -> Self {
        let mut path_of = HashMap::new();
        let mut ino_of = HashMap::new();
        path_of.insert(ROOT_INODE, "/".to_owned());
        ino_of.insert("/".to_owned(), ROOT_INODE);
        DbFs {
            db,
            reflector: SchemaReflector::new(),
            options,
            path_of,
            ino_of,
            next_ino: ROOT_INODE + 1,
        }
    }

    fn path(&self, ino: u64) -> Option<String> {
        self.path_of.get(&ino).cloned()
    }

    fn ino_for(&mut self, path: &str) -> u64 {
        if let Some(&ino) = self.ino_of.get(path) {
            return ino;
        }
        let ino = self.next_ino;
        self.next_ino += 1;
        self.path_of.insert(ino, path.to_owned());
        self.ino_of.insert(path.to_owned(), ino);
        ino
    }

    fn child_path(parent: &str, name: &str) -> String {
        if parent == "/" {
            format!("/{name}")
        } else {
            format!("{parent}/{name}")
        }
    }

    fn classify(&mut self, err: crate::db::DbError) -> FsError {
        errors::classify_server_error(err.errno, self.options.use_correct_codes)
    }

    /// Selects the database named by `path`'s first component, so the
    /// statement that follows runs against the right schema regardless of
    /// which database a previous upcall last selected.
    fn select_db(&mut self, path: &str) -> Result<(), FsError> {
        let db = path::component(path, 0).and_then(Ident::new).ok_or(FsError::NotFound)?;
        self.db.select_database(db.as_str()).map_err(|e| self.classify(e))
    }

    /// The authoritative classifier (§4.5): decides what `path` currently is
    /// by consulting the server, one level at a time.
    fn type_of(&mut self, path: &str) -> PathType {
        let level = path::level(path);
        if level == 0 {
            return PathType::Dir;
        }
        let Some(db_name) = path::component(path, 0) else {
            return PathType::NotFound;
        };
        let Some(db_ident) = Ident::new(db_name) else {
            return PathType::NotFound;
        };
        if self.db.select_database(db_ident.as_str()).is_err() {
            return PathType::NotFound;
        }
        if level == 1 {
            return PathType::Dir;
        }
        let Some(table_name) = path::component(path, 1) else {
            return PathType::NotFound;
        };
        let Some(table_ident) = Ident::new(table_name) else {
            return PathType::NotFound;
        };
        let pk = match self.reflector.primary_key_of(&mut self.db, db_name, table_name) {
            Ok(pk) => pk,
            Err(_) => return PathType::NotFound,
        };
        if level == 2 {
            return match pk {
                Some(_) => PathType::Dir,
                None => PathType::DirNoPk,
            };
        }
        let Some(pk) = pk else {
            return PathType::NotFound;
        };
        let Some(pk_ident) = Ident::new(&pk) else {
            return PathType::NotFound;
        };
        let Some(pkval) = path::component(path, 2) else {
            return PathType::NotFound;
        };
        if level == 3 {
            let (stmt, params) = sql::row_exists(table_ident, pk_ident, pkval);
            return match self.db.execute_params(&stmt, params) {
                Ok(rowset) => {
                    let exists = rowset
                        .rows
                        .first()
                        .and_then(|row| row.first())
                        .and_then(|cell| cell.as_deref())
                        .and_then(|bytes| std::str::from_utf8(bytes).ok())
                        .and_then(|s| s.parse::<i64>().ok())
                        .is_some_and(|n| n > 0);
                    if exists { PathType::Dir } else { PathType::NotFound }
                }
                Err(_) => PathType::NotFound,
            };
        }
        if level == 4 {
            let Some(col_name) = path::component(path, 3) else {
                return PathType::NotFound;
            };
            let Some(col_ident) = Ident::new(col_name) else {
                return PathType::NotFound;
            };
            let (stmt, params) = sql::cell_exists(table_ident, pk_ident, col_ident, pkval);
            return match self.db.execute_params(&stmt, params) {
                Ok(_) => PathType::File,
                Err(_) => PathType::NotFound,
            };
        }
        PathType::NotFound
    }

    /// Whether the column named at level 4 of `path` is the table's
    /// primary key. Used to enforce invariant 8 (primary key files are
    /// read-only) and to forbid writes/unlinks on it.
    fn is_primary_key_column(&mut self, path: &str) -> bool {
        let (Some(db), Some(table), Some(col)) = (
            path::component(path, 0),
            path::component(path, 1),
            path::component(path, 3),
        ) else {
            return false;
        };
        matches!(
            self.reflector.primary_key_of(&mut self.db, db, table),
            Ok(Some(pk)) if pk == col
        )
    }

    /// Counts the children a directory reports through `getattr`'s `size`
    /// field: a deliberate, unusual choice (a count, not a byte count)
    /// preserved unchanged.
    fn dir_entry_count(&mut self, path: &str) -> i64 {
        let level = path::level(path);
        let result = match level {
            0 => self.db.execute(sql::list_databases()).map(|r| r.rows.len()),
            1 => self.db.execute(sql::list_tables()).map(|r| r.rows.len()),
            2 => {
                let Some(table) = path::component(path, 1).and_then(Ident::new) else {
                    return 0;
                };
                self.db.execute(&sql::count_rows(table)).map(|r| {
                    r.rows
                        .first()
                        .and_then(|row| row.first())
                        .and_then(|c| c.as_deref())
                        .and_then(|b| std::str::from_utf8(b).ok())
                        .and_then(|s| s.parse::<usize>().ok())
                        .unwrap_or(0)
                })
            }
            3 => {
                let Some(table) = path::component(path, 1).and_then(Ident::new) else {
                    return 0;
                };
                self.db.execute(&sql::list_columns(table)).map(|r| r.rows.len())
            }
            _ => Ok(0),
        };
        result.unwrap_or(0) as i64
    }

    /// Fetches a level-4 cell's text and byte length in a single round
    /// trip.
    fn cell_text(&mut self, path: &str) -> Result<Option<Vec<u8>>, FsError> {
        self.select_db(path)?;
        let Some(table) = path::component(path, 1).and_then(Ident::new) else {
            return Err(FsError::NotFound);
        };
        let Some(pk) = self.resolve_pk(path) else {
            return Err(FsError::NotFound);
        };
        let Some(pk_ident) = Ident::new(&pk) else {
            return Err(FsError::NotFound);
        };
        let (Some(col), Some(pkval)) = (
            path::component(path, 3).and_then(Ident::new),
            path::component(path, 2),
        ) else {
            return Err(FsError::NotFound);
        };
        let (stmt, params) = sql::read_cell(table, pk_ident, col, pkval);
        let value = rowset::value(&mut self.db, &stmt, params, FieldSelector::IndexAndLen(0, 1))
            .map_err(|e| self.classify(e))?;
        Ok(value.map(|(text, _)| text))
    }

    /// Resolves the primary-key column name for the table addressed by
    /// `path`'s first two components, as an owned value the caller can
    /// turn into a short-lived [`Ident`].
    fn resolve_pk(&mut self, path: &str) -> Option<String> {
        let db = path::component(path, 0)?;
        let table = path::component(path, 1)?;
        self.reflector.primary_key_of(&mut self.db, db, table).ok()?
    }

    fn file_mode(&mut self, path: &str) -> u32 {
        if self.options.read_only || self.is_primary_key_column(path) {
            0o444
        } else {
            0o666
        }
    }

    fn make_attr(&mut self, ino: u64, path: &str, kind: PathType) -> FileAttr {
        let now = SystemTime::now();
        let (file_type, perm, size) = match kind {
            PathType::Dir => (FileType::Directory, 0o755, self.dir_entry_count(path) as u64),
            PathType::DirNoPk => (FileType::Directory, 0o444, self.dir_entry_count(path) as u64),
            PathType::File => {
                let text = self.cell_text(path).ok().flatten().unwrap_or_default();
                (FileType::RegularFile, self.file_mode(path), text.len() as u64 + 1)
            }
            PathType::NotFound => (FileType::RegularFile, 0, 0),
        };
        FileAttr {
            ino,
            size,
            blocks: 1,
            atime: now,
            mtime: now,
            ctime: now,
            crtime: now,
            kind: file_type,
            perm,
            nlink: 1,
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
            rdev: 0,
            blksize: 512,
            flags: 0,
        }
    }
}

impl Filesystem for DbFs {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), i32> {
        Ok(())
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(parent_path) = self.path(parent) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        let child = Self::child_path(&parent_path, name);
        let kind = self.type_of(&child);
        if kind == PathType::NotFound {
            reply.error(libc::ENOENT);
            return;
        }
        let ino = self.ino_for(&child);
        let attr = self.make_attr(ino, &child, kind);
        reply.entry(&TTL, &attr, 0);
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let kind = self.type_of(&path);
        if kind == PathType::NotFound {
            reply.error(libc::ENOENT);
            return;
        }
        let attr = self.make_attr(ino, &path, kind);
        reply.attr(&TTL, &attr);
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<fuser::TimeOrNow>,
        _mtime: Option<fuser::TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(new_size) = size else {
            let kind = self.type_of(&path);
            let attr = self.make_attr(ino, &path, kind);
            reply.attr(&TTL, &attr);
            return;
        };
        if path::level(&path) != 4 {
            reply.error(libc::EPERM);
            return;
        }
        if self.options.read_only || self.is_primary_key_column(&path) {
            reply.error(libc::EPERM);
            return;
        }
        let text = match self.cell_text(&path) {
            Ok(text) => text.unwrap_or_default(),
            Err(e) => {
                reply.error(e.to_errno());
                return;
            }
        };
        let new_text = truncated(&text, new_size);
        if let Err(e) = self.write_cell(&path, &new_text) {
            reply.error(e.to_errno());
            return;
        }
        let kind = self.type_of(&path);
        let attr = self.make_attr(ino, &path, kind);
        reply.attr(&TTL, &attr);
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let Some(parent_path) = self.path(parent) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        if self.options.read_only {
            reply.error(libc::EPERM);
            return;
        }
        let child = Self::child_path(&parent_path, name);
        let level = path::level(&child);
        let result = match level {
            1 => self.mkdir_database(name),
            2 => self.mkdir_table(&parent_path, name),
            3 => self.mkdir_row(&parent_path, name),
            _ => Err(FsError::PermissionDenied),
        };
        match result {
            Ok(()) => {
                let ino = self.ino_for(&child);
                let attr = self.make_attr(ino, &child, PathType::Dir);
                reply.entry(&TTL, &attr, 0);
            }
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let Some(parent_path) = self.path(parent) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        if self.options.read_only {
            reply.error(libc::EPERM);
            return;
        }
        let child = Self::child_path(&parent_path, name);
        let level = path::level(&child);
        let result = match level {
            1 => self.rmdir_database(name),
            2 => self.rmdir_table(&parent_path, name),
            3 => self.rmdir_row(&parent_path, name),
            _ => Err(FsError::PermissionDenied),
        };
        match result {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        flags: i32,
        reply: ReplyCreate,
    ) {
        let Some(parent_path) = self.path(parent) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        if self.options.read_only {
            reply.error(libc::EPERM);
            return;
        }
        let child = Self::child_path(&parent_path, name);
        if path::leaf_is_hidden(&child) {
            reply.error(libc::EPERM);
            return;
        }
        if path::level(&child) != 4 {
            reply.error(libc::EPERM);
            return;
        }
        let Some(table) = path::component(&parent_path, 1).and_then(Ident::new) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(col) = Ident::new(name) else {
            reply.error(libc::ENOENT);
            return;
        };
        if let Some(db) = path::component(&parent_path, 0).and_then(Ident::new) {
            if self.db.select_database(db.as_str()).is_err() {
                reply.error(libc::ENOENT);
                return;
            }
        }
        if let Err(e) = self.db.execute(&sql::add_column(table, col)) {
            reply.error(self.classify(e).to_errno());
            return;
        }
        let ino = self.ino_for(&child);
        let attr = self.make_attr(ino, &child, PathType::File);
        reply.created(&TTL, &attr, 0, ino, flags as u32);
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let Some(parent_path) = self.path(parent) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        if self.options.read_only {
            reply.error(libc::EPERM);
            return;
        }
        let child = Self::child_path(&parent_path, name);
        if path::level(&child) != 4 {
            reply.error(libc::EPERM);
            return;
        }
        if let Err(e) = self.select_db(&child) {
            reply.error(e.to_errno());
            return;
        }
        if self.is_primary_key_column(&child) {
            reply.error(libc::EPERM);
            return;
        }
        let Some(table) = path::component(&child, 1).and_then(Ident::new) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(pk) = self.resolve_pk(&child) else {
            reply.error(libc::ENOENT);
            return;
        };
        let (Some(pk_ident), Some(col), Some(pkval)) = (
            Ident::new(&pk),
            path::component(&child, 3).and_then(Ident::new),
            path::component(&child, 2),
        ) else {
            reply.error(libc::ENOENT);
            return;
        };
        let (stmt, params) = sql::null_cell(table, pk_ident, col, pkval);
        match self.db.execute_params(&stmt, params) {
            Ok(_) => reply.ok(),
            Err(e) => reply.error(self.classify(e).to_errno()),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let kind = self.type_of(&path);
        match kind {
            PathType::NotFound => {
                reply.error(libc::ENOENT);
                return;
            }
            PathType::Dir | PathType::DirNoPk => {
                reply.error(libc::EISDIR);
                return;
            }
            PathType::File => {}
        }
        let wants_write = flags & libc::O_ACCMODE != libc::O_RDONLY;
        if wants_write && (self.options.read_only || self.is_primary_key_column(&path)) {
            reply.error(libc::EPERM);
            return;
        }
        reply.opened(ino, 0);
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        reply.opened(ino, 0);
    }

    fn releasedir(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _flags: i32,
        reply: ReplyEmpty,
    ) {
        reply.ok();
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let text = match self.cell_text(&path) {
            Ok(text) => text.unwrap_or_default(),
            Err(e) => {
                reply.error(e.to_errno());
                return;
            }
        };
        let content = framed(&text);
        let range = read_range(content.len(), offset, size);
        reply.data(&content[range]);
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        if path::level(&path) != 4 {
            reply.error(libc::EPERM);
            return;
        }
        if self.options.read_only || self.is_primary_key_column(&path) {
            reply.error(libc::EPERM);
            return;
        }
        let text = match self.cell_text(&path) {
            Ok(text) => text.unwrap_or_default(),
            Err(e) => {
                reply.error(e.to_errno());
                return;
            }
        };
        let new_text = spliced(&text, offset, data);
        match self.write_cell(&path, &new_text) {
            Ok(()) => reply.written(data.len() as u32),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let mut names: Vec<String> = Vec::new();
        let level = path::level(&path);
        if level >= 1 {
            let Some(db) = path::component(&path, 0).and_then(Ident::new) else {
                reply.error(libc::ENOENT);
                return;
            };
            if let Err(e) = self.db.select_database(db.as_str()) {
                reply.error(self.classify(e).to_errno());
                return;
            }
        }
        let fill_result: Result<(), FsError> = match level {
            0 => rowset::fill(&mut self.db, sql::list_databases(), "Database", |v| {
                names.push(v.to_owned())
            })
            .map_err(|e| self.classify(e)),
            1 => {
                let tables_column = format!("Tables_in_{}", path::component(&path, 0).unwrap_or(""));
                rowset::fill(&mut self.db, sql::list_tables(), &tables_column, |v| {
                    names.push(v.to_owned())
                })
                .map_err(|e| self.classify(e))
            }
            2 => (|| {
                let table = path::component(&path, 1).ok_or(FsError::NotFound)?;
                let db = path::component(&path, 0).ok_or(FsError::NotFound)?;
                let tab_ident = Ident::new(table).ok_or(FsError::NotFound)?;
                let pk = self
                    .reflector
                    .primary_key_of(&mut self.db, db, table)
                    .map_err(|e| self.classify(e))?;
                let Some(pk) = pk else {
                    return Ok(());
                };
                let pk_ident = Ident::new(&pk).ok_or(FsError::NotFound)?;
                let stmt = sql::list_rows(tab_ident, pk_ident);
                rowset::fill(&mut self.db, &stmt, &pk, |v| names.push(v.to_owned()))
                    .map_err(|e| self.classify(e))
            })(),
            3 => (|| {
                let table = path::component(&path, 1).ok_or(FsError::NotFound)?;
                let tab_ident = Ident::new(table).ok_or(FsError::NotFound)?;
                let stmt = sql::list_columns(tab_ident);
                rowset::fill(&mut self.db, &stmt, "Field", |v| names.push(v.to_owned()))
                    .map_err(|e| self.classify(e))
            })(),
            _ => Ok(()),
        };
        if let Err(e) = fill_result {
            warn!("readdir failed at '{path}': {e}");
        }

        let mut entries: Vec<(u64, FileType, String)> = vec![
            (ino, FileType::Directory, ".".to_owned()),
            (ino, FileType::Directory, "..".to_owned()),
        ];
        let child_kind = if level <= 2 { FileType::Directory } else { FileType::RegularFile };
        for name in names {
            let child_path = Self::child_path(&path, &name);
            let child_ino = self.ino_for(&child_path);
            entries.push((child_ino, child_kind, name));
        }

        for (i, (entry_ino, kind, name)) in entries.into_iter().enumerate().skip(offset as usize) {
            if reply.add(entry_ino, (i + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }
}

impl DbFs {
    fn write_cell(&mut self, path: &str, new_text: &[u8]) -> Result<(), FsError> {
        self.select_db(path)?;
        let Some(table) = path::component(path, 1).and_then(Ident::new) else {
            return Err(FsError::NotFound);
        };
        let Some(pk) = self.resolve_pk(path) else {
            return Err(FsError::NotFound);
        };
        let (Some(pk_ident), Some(col), Some(pkval)) = (
            Ident::new(&pk),
            path::component(path, 3).and_then(Ident::new),
            path::component(path, 2),
        ) else {
            return Err(FsError::NotFound);
        };
        let (stmt, params) = sql::write_cell(table, pk_ident, col, pkval, new_text);
        self.db
            .execute_params(&stmt, params)
            .map(|_| ())
            .map_err(|e| self.classify(e))
    }

    fn mkdir_database(&mut self, name: &str) -> Result<(), FsError> {
        let ident = Ident::new(name).ok_or(FsError::NotFound)?;
        self.db
            .execute(&sql::create_database(ident))
            .map(|_| ())
            .map_err(|e| self.classify(e))
    }

    fn mkdir_table(&mut self, parent_path: &str, name: &str) -> Result<(), FsError> {
        let db = path::component(parent_path, 0).ok_or(FsError::NotFound)?;
        let db_ident = Ident::new(db).ok_or(FsError::NotFound)?;
        let tab_ident = Ident::new(name).ok_or(FsError::NotFound)?;
        self.db
            .select_database(db_ident.as_str())
            .map_err(|e| self.classify(e))?;
        self.db
            .execute(&sql::create_table(tab_ident))
            .map_err(|e| self.classify(e))?;
        self.reflector.set(db, name, "id");
        Ok(())
    }

    fn mkdir_row(&mut self, parent_path: &str, pkval: &str) -> Result<(), FsError> {
        let db = path::component(parent_path, 0).ok_or(FsError::NotFound)?;
        let table = path::component(parent_path, 1).ok_or(FsError::NotFound)?;
        let tab_ident = Ident::new(table).ok_or(FsError::NotFound)?;
        self.db
            .select_database(db)
            .map_err(|e| self.classify(e))?;
        let pk = self
            .reflector
            .primary_key_of(&mut self.db, db, table)
            .map_err(|e| self.classify(e))?
            .ok_or(FsError::PermissionDenied)?;
        let pk_ident = Ident::new(&pk).ok_or(FsError::NotFound)?;
        let (stmt, params) = sql::insert_row(tab_ident, pk_ident, pkval);
        self.db
            .execute_params(&stmt, params)
            .map(|_| ())
            .map_err(|e| self.classify(e))
    }

    fn rmdir_database(&mut self, name: &str) -> Result<(), FsError> {
        let ident = Ident::new(name).ok_or(FsError::NotFound)?;
        self.db
            .execute(&sql::drop_database(ident))
            .map_err(|e| self.classify(e))?;
        self.reflector.invalidate_database(name);
        Ok(())
    }

    fn rmdir_table(&mut self, parent_path: &str, name: &str) -> Result<(), FsError> {
        let db = path::component(parent_path, 0).ok_or(FsError::NotFound)?;
        let db_ident = Ident::new(db).ok_or(FsError::NotFound)?;
        let tab_ident = Ident::new(name).ok_or(FsError::NotFound)?;
        self.db
            .select_database(db_ident.as_str())
            .map_err(|e| self.classify(e))?;
        self.db
            .execute(&sql::drop_table(tab_ident))
            .map_err(|e| self.classify(e))?;
        self.reflector.invalidate_table(db, name);
        Ok(())
    }

    fn rmdir_row(&mut self, parent_path: &str, pkval: &str) -> Result<(), FsError> {
        let db = path::component(parent_path, 0).ok_or(FsError::NotFound)?;
        let table = path::component(parent_path, 1).ok_or(FsError::NotFound)?;
        let tab_ident = Ident::new(table).ok_or(FsError::NotFound)?;
        self.db
            .select_database(db)
            .map_err(|e| self.classify(e))?;
        let pk = self
            .reflector
            .primary_key_of(&mut self.db, db, table)
            .map_err(|e| self.classify(e))?
            .ok_or(FsError::NotFound)?;
        let pk_ident = Ident::new(&pk).ok_or(FsError::NotFound)?;
        let (stmt, params) = sql::delete_row(tab_ident, pk_ident, pkval);
        self.db
            .execute_params(&stmt, params)
            .map(|_| ())
            .map_err(|e| self.classify(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framed_appends_single_newline() {
        assert_eq!(framed(b"hello"), b"hello\n");
        assert_eq!(framed(b""), b"\n");
    }

    #[test]
    fn read_range_clamps_to_content_length() {
        assert_eq!(read_range(6, 0, 100), 0..6);
        assert_eq!(read_range(6, 3, 2), 3..5);
        assert_eq!(read_range(6, 6, 10), 0..0);
        assert_eq!(read_range(6, 100, 10), 0..0);
    }

    #[test]
    fn spliced_overwrites_in_place() {
        assert_eq!(spliced(b"hello", 0, b"HE"), b"HEllo");
    }

    #[test]
    fn spliced_grows_and_zero_pads_gap() {
        assert_eq!(spliced(b"hi", 4, b"X"), b"hi\0\0X");
    }

    #[test]
    fn truncated_shrinks_only() {
        assert_eq!(truncated(b"hello", 2), b"he");
        assert_eq!(truncated(b"hi", 10), b"hi");
    }

    #[test]
    fn write_then_read_round_trips_scenario() {
        let text = b"";
        let after_write = spliced(text, 0, b"al");
        assert_eq!(after_write, b"al");
        let content = framed(&after_write);
        assert_eq!(content, b"al\n");
        let range = read_range(content.len(), 0, 3);
        assert_eq!(&content[range], b"al\n");
    }

    #[test]
    fn unlink_nulls_not_drops_scenario() {
        let content_after_null = framed(b"");
        assert_eq!(content_after_null, b"\n");
        let range = read_range(content_after_null.len(), 0, 10);
        assert_eq!(&content_after_null[range], b"\n");
    }
}
