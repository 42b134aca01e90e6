//! Stamps the build with the commit it came from, reported by `GET /`.
//!
//! Container and tarball builds have no `.git`, so `STOREFRONT_BUILD_HASH`
//! can supply the hash instead.

use std::process::Command;

const HASH_OVERRIDE_VAR: &str = "STOREFRONT_BUILD_HASH";

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn build_hash() -> String {
    if let Ok(hash) = std::env::var(HASH_OVERRIDE_VAR) {
        if !hash.trim().is_empty() {
            return hash.trim().to_string();
        }
    }
    let Some(hash) = git(&["rev-parse", "--short", "HEAD"]) else {
        return "unknown".to_string();
    };
    // Local edits to the sources mean the binary is not that commit.
    let dirty = git(&["status", "--porcelain", "--untracked-files=no", "--", "src"])
        .is_some_and(|changes| !changes.is_empty());
    if dirty {
        format!("{}-dirty", hash)
    } else {
        hash
    }
}

fn main() {
    println!("cargo:rustc-env=GIT_HASH={}", build_hash());

    println!("cargo:rerun-if-env-changed={}", HASH_OVERRIDE_VAR);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
    println!("cargo:rerun-if-changed=src");
}
