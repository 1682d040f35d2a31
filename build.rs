use std::process::Command;

/// Run git in the crate directory, returning trimmed stdout on success.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    // Tagged release builds report the plain package version; anything else
    // is marked as a dev build of the commit it came from.
    let package = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let version = match git(&["describe", "--exact-match", "--tags", "HEAD"]) {
        Some(_) => package,
        None => match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) if !hash.is_empty() => format!("{package}-dev+{hash}"),
            _ => format!("{package}-dev"),
        },
    };
    println!("cargo:rustc-env=PAGEBREAK_VERSION={version}");
}
