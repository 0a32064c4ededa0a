/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Assembles the immutable startup configuration bundle from parsed CLI
//! arguments. Consumed once at startup; there is no runtime
//! reconfiguration.

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;

use crate::args::Args;

/// The once-assembled, immutable option set every upcall consults.
pub struct Options {
    pub server: String,
    pub user: String,
    pub password: String,
    pub mountpoint: String,
    pub log_file: Option<String>,
    pub debug: bool,
    pub debug_password: bool,
    pub read_only: bool,
    pub force: bool,
    pub unmount: bool,
    pub use_correct_codes: bool,
}

impl Options {
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let password = match args.password_type.as_str() {
            "plain" => args.password,
            "b64" => decode_password(&args.password)
                .with_context(|| "failed to base64-decode password")?,
            other => anyhow::bail!("unknown password_type '{other}', expected 'plain' or 'b64'"),
        };

        let options = Options {
            server: args.server,
            user: args.user,
            password,
            mountpoint: args.mountpoint,
            log_file: args.log_file,
            debug: args.debug,
            debug_password: args.debug_password,
            read_only: args.read_only,
            force: args.force,
            unmount: args.unmount,
            use_correct_codes: args.use_correct_codes,
        };

        options.dump();
        Ok(options)
    }

    fn dump(&self) {
        if !self.debug {
            return;
        }
        debug!("server: {}", self.server);
        debug!("user: {}", self.user);
        debug!(
            "password: {}",
            if self.debug_password {
                self.password.as_str()
            } else if self.password.is_empty() {
                "not set"
            } else {
                "set"
            }
        );
        debug!("mountpoint: {}", self.mountpoint);
        debug!("log_file: {:?}", self.log_file);
        debug!("read_only: {}", self.read_only);
        debug!("force: {}", self.force);
        debug!("unmount: {}", self.unmount);
        debug!("use_correct_codes: {}", self.use_correct_codes);
    }
}

/// Decodes a base64 password, trimming a single trailing CR or LF the way a
/// password piped through `base64` on the command line commonly carries.
fn decode_password(encoded: &str) -> anyhow::Result<String> {
    let mut bytes = STANDARD.decode(encoded.trim())?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_password_strips_trailing_newline() {
        let encoded = STANDARD.encode(b"hunter2\n");
        assert_eq!(decode_password(&encoded).unwrap(), "hunter2");
    }

    #[test]
    fn decode_password_plain_roundtrip() {
        let encoded = STANDARD.encode(b"hunter2");
        assert_eq!(decode_password(&encoded).unwrap(), "hunter2");
    }
}
