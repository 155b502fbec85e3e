//! Metadata commands

use anyhow::{Context, Result};
use datahut::prelude::*;
use std::path::PathBuf;

pub fn get(db_path: PathBuf, key: &str) -> Result<()> {
    let hut = DataHut::open(&db_path).context("Failed to open store")?;
    match hut.fetch_meta::<serde_json::Value>(key)? {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("No value stored under '{}'", key),
    }
    Ok(())
}

pub fn set(db_path: PathBuf, key: &str, value: &str) -> Result<()> {
    let parsed: serde_json::Value =
        serde_json::from_str(value).with_context(|| format!("'{}' is not valid JSON", value))?;
    let hut = DataHut::open(&db_path).context("Failed to open store")?;
    hut.store_meta(key, &parsed)?;
    println!("✓ Stored '{}'", key);
    Ok(())
}

pub fn list(db_path: PathBuf) -> Result<()> {
    let hut = DataHut::open(&db_path).context("Failed to open store")?;
    for key in hut.meta_keys()? {
        println!("{}", key);
    }
    Ok(())
}
