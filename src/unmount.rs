/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Tears down a mountpoint before mounting (or in response to `--unmount`).
//! Prefers the kernel transport's own unmount primitive; only falls back to
//! a process-name match + kill when `--force` is explicitly given.

use std::process::Command;

use log::{info, warn};

/// Runs `umount <mountpoint>`, ignoring failures (a mountpoint that was
/// never mounted fails harmlessly here).
fn umount(mountpoint: &str) {
    info!("unmounting '{mountpoint}'");
    let status = Command::new("umount").arg(mountpoint).status();
    match status {
        Ok(s) if s.success() => info!("unmounted '{mountpoint}'"),
        Ok(s) => warn!("umount '{mountpoint}' exited with {s}"),
        Err(e) => warn!("failed to run umount: {e}"),
    }
}

/// Kills every other process matching `binary_name` by parsing `ps -C`
/// output, mirroring the teacher implementation's fallback. Used only under
/// `--force`: a plain `umount` is tried first.
fn kill_running_instances(binary_name: &str) {
    let Ok(output) = Command::new("ps")
        .arg("-C")
        .arg(binary_name)
        .arg("-o")
        .arg("pid=")
        .output()
    else {
        warn!("failed to list running instances of '{binary_name}'");
        return;
    };
    let my_pid = std::process::id();
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        let Ok(pid) = line.trim().parse::<u32>() else {
            continue;
        };
        if pid == my_pid {
            continue;
        }
        info!("killing pre-existing instance (pid {pid})");
        let _ = Command::new("kill")
            .arg("-9")
            .arg(pid.to_string())
            .status();
    }
}

/// Tears down `mountpoint`, trying the transport's unmount first and, when
/// `force` is set, also killing any other running instance of this binary.
pub fn teardown(mountpoint: &str, binary_name: &str, force: bool) {
    umount(mountpoint);
    if force {
        kill_running_instances(binary_name);
    }
}
