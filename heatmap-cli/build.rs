// Embeds a version string for `heatmap --version`.
//
// A clean `vX.Y.Z` tag yields `X.Y.Z`; any other `git describe` output is
// appended to the crate version. Without git the crate version is used as is.

use std::process::Command;

fn main() {
    let pkg = env!("CARGO_PKG_VERSION");
    let version = git_describe()
        .map(|described| version_from_describe(pkg, &described))
        .unwrap_or_else(|| pkg.to_string());

    println!("cargo:rustc-env=HEATMAP_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    (!described.is_empty()).then(|| described.to_string())
}

fn version_from_describe(pkg: &str, described: &str) -> String {
    match described.strip_prefix('v') {
        // "v0.2.0" or "v0.2.0-3-gabc123": keep the tagged release
        Some(tagged) => tagged.split('-').next().unwrap_or(tagged).to_string(),
        // bare commit hash, possibly "-dirty"
        None => format!("{}-{}", pkg, described),
    }
}
