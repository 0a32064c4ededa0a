/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Database server host/address
    #[arg(short, long)]
    pub server: String,

    /// Database user
    #[arg(short, long)]
    pub user: String,

    /// Database password
    #[arg(short, long)]
    pub password: String,

    /// Password encoding: "plain" or "b64"
    #[arg(short = 't', long, default_value = "plain")]
    pub password_type: String,

    /// Absolute path to mount on
    #[arg(short, long)]
    pub mountpoint: String,

    /// Path to a file to write diagnostic output to
    #[arg(short, long)]
    pub log_file: Option<String>,

    /// Enable diagnostic output
    #[arg(short = 'g', long, default_value_t = false)]
    pub debug: bool,

    /// Include the decoded password in diagnostic output
    #[arg(short = 'd', long, default_value_t = false)]
    pub debug_password: bool,

    /// Refuse all mutating operations
    #[arg(short, long, default_value_t = false)]
    pub read_only: bool,

    /// Kill a pre-existing instance on the mountpoint before mounting
    #[arg(short, long, default_value_t = false)]
    pub force: bool,

    /// Unmount the mountpoint and exit
    #[arg(short = 'n', long, default_value_t = false)]
    pub unmount: bool,

    /// Surface database access-denied errors as EPERM instead of ENOENT
    #[arg(short = 'c', long, default_value_t = false)]
    pub use_correct_codes: bool,
}
