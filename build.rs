use std::env;
use std::fs;
use std::process::Command;

use anyhow::{Context, Result};
use chrono::TimeZone;
use vergen_gitcl::{Emitter, GitclBuilder};

const LIBRARY: &str = "mpa";

fn main() -> Result<()> {
    let gitcl = GitclBuilder::default()
        .describe(true, true, Some("[0-9]*"))
        .build()?;

    let gitcl_res = Emitter::default()
        .idempotent()
        .fail_on_error()
        .add_instructions(&gitcl)
        .and_then(|emitter| emitter.emit());

    if let Err(e) = gitcl_res {
        eprintln!("error occurred while generating instructions: {e:?}");
        Emitter::default().idempotent().fail_on_error().emit()?;
    }

    // Reproducible builds pin the timestamp
    let now = match env::var("SOURCE_DATE_EPOCH") {
        Ok(val) => {
            let secs = val.parse::<i64>().context("SOURCE_DATE_EPOCH is not a number")?;
            chrono::Utc
                .timestamp_opt(secs, 0)
                .single()
                .context("SOURCE_DATE_EPOCH is out of range")?
        }
        Err(_) => chrono::Utc::now(),
    };

    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let version = version_from_metadata()
        .or_else(|_| version_from_manifest())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=MPA_VERSION={version}");

    println!("cargo:rerun-if-changed={LIBRARY}/Cargo.toml");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    Ok(())
}

/// Library version from `cargo metadata`, as a workspace member or a
/// resolved registry dependency.
fn version_from_metadata() -> Result<String> {
    let output = Command::new(env::var("CARGO").unwrap_or_else(|_| "cargo".to_string()))
        .args(["metadata", "--format-version", "1"])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    let member = metadata["packages"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|package| package["name"].as_str() == Some(LIBRARY))
        .and_then(|package| package["version"].as_str());
    if let Some(version) = member {
        return Ok(version.to_string());
    }

    // Resolved ids read "mpa 0.4.0 (registry+...)"
    let prefix = format!("{LIBRARY} ");
    let resolved = metadata["resolve"]["nodes"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|node| node["id"].as_str())
        .find_map(|id| id.strip_prefix(&prefix)?.split(' ').next());
    if let Some(version) = resolved {
        return Ok(version.to_string());
    }

    anyhow::bail!("{LIBRARY} package not found in metadata");
}

fn version_from_manifest() -> Result<String> {
    let manifest = fs::read_to_string(format!("{LIBRARY}/Cargo.toml"))?;

    manifest
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("version"))
        .find_map(|line| line.split_once('='))
        .map(|(_, value)| value.trim().trim_matches('"').trim_matches('\'').to_string())
        .with_context(|| format!("no version in {LIBRARY}/Cargo.toml"))
}
