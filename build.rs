// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=SNAPCAM_VERSION");

    // Packagers without a git checkout pin the version explicitly
    let version = std::env::var("SNAPCAM_VERSION")
        .ok()
        .or_else(git_describe)
        .or_else(|| std::env::var("CARGO_PKG_VERSION").ok())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `git describe` with the tag's `v` dropped, e.g. `0.1.0-5-gabcdef1-dirty`
fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    match described.strip_prefix('v') {
        Some(stripped) => Some(stripped.to_string()),
        None => Some(described),
    }
}
