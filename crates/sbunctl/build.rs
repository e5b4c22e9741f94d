// Build script for sbunctl - embeds version, commit and build date

use std::process::Command;

fn main() {
    // Release builds set SBUN_VERSION; local builds fall back to Cargo.toml
    let version =
        std::env::var("SBUN_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    let git_sha = std::env::var("SBUN_GIT_SHA").ok().unwrap_or_else(|| {
        Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output()
            .ok()
            .filter(|output| output.status.success())
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "none".to_string())
    });

    let build_date = std::env::var("SBUN_BUILD_DATE")
        .unwrap_or_else(|_| chrono::Utc::now().format("%Y-%m-%d").to_string());

    println!("cargo:rustc-env=SBUN_VERSION={}", version);
    println!("cargo:rustc-env=SBUN_GIT_SHA={}", git_sha);
    println!("cargo:rustc-env=SBUN_BUILD_DATE={}", build_date);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=SBUN_VERSION");
    println!("cargo:rerun-if-env-changed=SBUN_GIT_SHA");
    println!("cargo:rerun-if-env-changed=SBUN_BUILD_DATE");
}
