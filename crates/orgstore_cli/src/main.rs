//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `orgstore_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("orgstore_core ping={}", orgstore_core::ping());
    println!("orgstore_core version={}", orgstore_core::core_version());
    println!(
        "orgstore_core data_file={}",
        orgstore_core::paths::data_file().display()
    );
}
