/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The four-way POSIX error taxonomy every upcall reduces to, and the
//! single helper that classifies a database error number into one of them.

use thiserror::Error;

/// Server errno for "unknown database"/"no such table".
const ERRNO_NO_SUCH_TABLE: u16 = 1146;
/// Server errno for "access denied".
const ERRNO_ACCESS_DENIED: u16 = 1044;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("no such entry")]
    NotFound,
    #[error("is a directory")]
    IsDir,
    #[error("permission denied")]
    PermissionDenied,
    #[error("I/O error")]
    Io,
}

impl FsError {
    pub fn to_errno(self) -> i32 {
        match self {
            FsError::NotFound => libc::ENOENT,
            FsError::IsDir => libc::EISDIR,
            FsError::PermissionDenied => libc::EPERM,
            FsError::Io => libc::EIO,
        }
    }
}

/// Maps a server error number to a POSIX error, honouring `use_correct_codes`:
/// when set, access-denied (1044) surfaces as `EPERM` instead of `ENOENT`.
/// Every other failure that isn't "no such table" is an I/O error.
pub fn classify_server_error(errno: u16, use_correct_codes: bool) -> FsError {
    match errno {
        ERRNO_NO_SUCH_TABLE => FsError::NotFound,
        ERRNO_ACCESS_DENIED if use_correct_codes => FsError::PermissionDenied,
        ERRNO_ACCESS_DENIED => FsError::NotFound,
        _ => FsError::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_such_table_is_not_found() {
        assert_eq!(
            classify_server_error(ERRNO_NO_SUCH_TABLE, false),
            FsError::NotFound
        );
        assert_eq!(
            classify_server_error(ERRNO_NO_SUCH_TABLE, true),
            FsError::NotFound
        );
    }

    #[test]
    fn access_denied_depends_on_correct_codes() {
        assert_eq!(
            classify_server_error(ERRNO_ACCESS_DENIED, false),
            FsError::NotFound
        );
        assert_eq!(
            classify_server_error(ERRNO_ACCESS_DENIED, true),
            FsError::PermissionDenied
        );
    }

    #[test]
    fn unknown_errno_is_io() {
        assert_eq!(classify_server_error(9999, false), FsError::Io);
    }

    #[test]
    fn errno_to_posix_mapping() {
        assert_eq!(FsError::NotFound.to_errno(), libc::ENOENT);
        assert_eq!(FsError::IsDir.to_errno(), libc::EISDIR);
        assert_eq!(FsError::PermissionDenied.to_errno(), libc::EPERM);
        assert_eq!(FsError::Io.to_errno(), libc::EIO);
    }
}
