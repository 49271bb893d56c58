//! Capture source control metadata for the version string.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    if let Some(revision) = git(&["rev-parse", "HEAD"]).filter(|r| !r.is_empty()) {
        println!("cargo:rustc-env=FARM_VCS_REVISION={revision}");
    }
    if let Some(time) = git(&["log", "-1", "--format=%cI"]).filter(|t| !t.is_empty()) {
        println!("cargo:rustc-env=FARM_VCS_TIME={time}");
    }
    if let Some(status) = git(&["status", "--porcelain"]) {
        println!("cargo:rustc-env=FARM_VCS_MODIFIED={}", !status.is_empty());
    }
}
