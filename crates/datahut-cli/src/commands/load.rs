//! Load command: extract a JSON lines file into the store

use anyhow::{anyhow, Context, Result};
use datahut::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

pub fn execute(db_path: PathBuf, file: PathBuf) -> Result<()> {
    let hut = DataHut::open(&db_path).context("Failed to open store")?;
    let reader = BufReader::new(
        File::open(&file).with_context(|| format!("Failed to open {}", file.display()))?,
    );

    println!("Loading {} into {}...", file.display(), db_path.display());

    let stats = hut
        .extract(reader.lines().enumerate(), |r, (index, line)| {
            let line = line?;
            if line.trim().is_empty() {
                return Ok(());
            }
            let parsed: serde_json::Value = serde_json::from_str(&line)
                .map_err(|e| anyhow!("line {}: {}", index + 1, e))?;
            map_object(r, parsed).map_err(|e| anyhow!("line {}: {}", index + 1, e).into())
        })
        .context("Load failed")?;

    println!(
        "✓ {} line(s): {} inserted, {} duplicate(s), {} empty, {} column(s) added in {:?}",
        stats.seen, stats.inserted, stats.duplicates, stats.empty, stats.columns_added, stats.duration
    );
    Ok(())
}

/// Copy the members of a JSON object onto `r`. Arrays and objects have no
/// column type, so they are stored as their JSON text.
pub fn map_object(r: &mut Record, parsed: serde_json::Value) -> Result<()> {
    let serde_json::Value::Object(fields) = parsed else {
        return Err(anyhow!("expected a JSON object"));
    };
    for (name, value) in fields {
        let value = match value {
            composite @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Value::Text(composite.to_string())
            }
            scalar => Value::from(scalar),
        };
        r.set(name, value);
    }
    Ok(())
}
