//! Build metadata shown by `lexground --version`.

use std::process::Command;

fn main() {
    // The workspace root holds the repository; rebuild when HEAD moves.
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs/heads");

    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", commit_hash().as_deref().unwrap_or("unknown"));
    println!(
        "cargo:rustc-env=TARGET={}",
        std::env::var("TARGET").as_deref().unwrap_or("unknown")
    );
}

/// Short hash of the checked-out commit. `None` outside a git checkout
/// (release tarballs, vendored builds).
fn commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}
