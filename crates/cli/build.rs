use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    set_env("GIT_COMMIT_HASH", short_commit());
    set_env("TARGET", std::env::var("TARGET").ok());
}

/// Abbreviated HEAD commit, if built from a git checkout.
fn short_commit() -> Option<String> {
    let out = Command::new("git").args(["rev-parse", "--short=7", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let hash = String::from_utf8(out.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn set_env(key: &str, value: Option<String>) {
    println!("cargo:rustc-env={key}={}", value.as_deref().unwrap_or("unknown"));
}
