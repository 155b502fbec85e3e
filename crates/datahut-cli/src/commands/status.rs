//! Status, schema and complete commands

use anyhow::{Context, Result};
use datahut::prelude::*;
use std::path::PathBuf;

pub fn execute(db_path: PathBuf) -> Result<()> {
    tracing::info!("Checking store status: {}", db_path.display());

    let hut = DataHut::open(&db_path).context("Failed to open store")?;

    let total = hut.dataset().count().context("Failed to count records")?;
    let pending = hut
        .dataset()
        .only_unprocessed()
        .count()
        .context("Failed to count unprocessed records")?;
    let keys = hut.meta_keys().context("Failed to list metadata keys")?;

    println!("\nStore Status");
    println!("{}", "=".repeat(60));
    println!("Path: {}", db_path.display());
    println!("Columns: {}", hut.schema().len());
    println!("Records: {}", total);
    println!("  Processed: {}", total - pending);
    println!("  Unprocessed: {}", pending);
    println!("Metadata Keys: {}", keys.len());

    if pending > 0 {
        println!("\n{} record(s) awaiting a transform pass", pending);
        println!("Run 'datahut complete' once they are transformed");
    } else {
        println!("\n✓ Every record is processed");
    }

    Ok(())
}

pub fn schema(db_path: PathBuf) -> Result<()> {
    let hut = DataHut::open(&db_path).context("Failed to open store")?;
    let schema = hut.schema();

    if schema.is_empty() {
        println!("No columns yet");
        return Ok(());
    }

    let width = schema.names().map(str::len).max().unwrap_or(0);
    for (name, column_type) in schema.iter() {
        println!("{:<width$}  {}", name, column_type, width = width);
    }
    Ok(())
}

pub fn complete(db_path: PathBuf) -> Result<()> {
    let hut = DataHut::open(&db_path).context("Failed to open store")?;
    let marked = hut
        .transform_complete()
        .context("Failed to mark records processed")?;
    println!("✓ Marked {} record(s) processed", marked);
    Ok(())
}
