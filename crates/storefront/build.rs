//! Build script for storefront crate.
//!
//! Computes a content hash of the stylesheet so the layout can link it as
//! `main.css?v=<hash>` and browsers refetch it only when it changes.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    hash_css();
}

/// Set `CSS_HASH` (first 8 hex chars of SHA-256 of main.css) for
/// `env!("CSS_HASH")`.
fn hash_css() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");

    println!("cargo:rerun-if-changed={}", css_path.display());

    let content = match fs::read(&css_path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
            return;
        }
    };

    let digest = Sha256::digest(&content);
    let short_hash: String = format!("{digest:x}").chars().take(8).collect();

    println!("cargo:rustc-env=CSS_HASH={short_hash}");
}
