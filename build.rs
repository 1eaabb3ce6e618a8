use std::fs;
use std::path::Path;
use std::process::Command;

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

fn main() {
    // Build counter lives next to Cargo.toml
    let build_file = Path::new("BUILD_NUMBER");
    let build_number: u64 = read_trimmed(build_file)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let new_build = build_number + 1;
    fs::write(build_file, new_build.to_string()).expect("Failed to write build number");

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "debug".to_string());
    let profile_label = if profile == "release" { "release" } else { "development" };

    // VERSION file overrides the package version when present
    let version = read_trimmed(Path::new("VERSION"))
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=HARNESS_VERSION={}", version);
    println!("cargo:rustc-env=HARNESS_BUILD={}", new_build);
    println!("cargo:rustc-env=HARNESS_PROFILE={}", profile_label);
    println!("cargo:rustc-env=HARNESS_GIT_HASH={}", git_hash);

    println!("cargo:rerun-if-changed=BUILD_NUMBER");
    println!("cargo:rerun-if-changed=VERSION");
    println!("cargo:rerun-if-env-changed=PROFILE");
}
