//! Build script for the spotgate binary.
//!
//! Copies the `.env.example` template into the user's local data directory, next
//! to where `config::load_env` looks for `.env`, so a fresh install has a
//! configuration template in the expected place.

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` from the crate root to the local data directory.
///
/// Destination:
/// - Linux: `~/.local/share/spotgate/.env.example`
/// - macOS: `~/Library/Application Support/spotgate/.env.example`
/// - Windows: `%LOCALAPPDATA%/spotgate/.env.example`
///
/// The copy is a convenience: a missing template or a read-only data directory
/// only produces a cargo warning.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    if !env_example_path.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
        return Ok(());
    }

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotgate");

    if let Err(e) = copy_template(&env_example_path, &out_dir) {
        println!(
            "cargo:warning=could not copy .env.example to {}: {}",
            out_dir.display(),
            e
        );
    }

    Ok(())
}

fn copy_template(template: &PathBuf, out_dir: &PathBuf) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;
    let contents = fs::read_to_string(template)?;
    fs::write(out_dir.join(".env.example"), contents)
}
