//! Basic DataHut Usage Example
//!
//! This example demonstrates:
//! - Extracting records with batch-level and early dedup
//! - A transform pass adding a derived field
//! - Incremental passes gated by the processed flag
//! - Querying and metadata bookkeeping
//!
//! Run with: cargo run --example basic_usage

use datahut::prelude::*;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("datahut=info")
        .init();

    let temp_dir = tempfile::tempdir()?;
    let hut = DataHut::open(temp_dir.path().join("people.db"))?;

    // 1. Extract: the duplicate barney is stored once
    let people = [
        ("fred", 44),
        ("barney", 27),
        ("barney", 27),
        ("phil", 31),
        ("jane", 16),
        ("lisa", 22),
        ("mary", 23),
    ];
    let stats = hut.extract(people, |r, (name, age)| {
        r.set("name", name).set("age", age);
        Ok(())
    })?;
    println!(
        "extract: {} seen, {} inserted, {} duplicates",
        stats.seen, stats.inserted, stats.duplicates
    );

    // 2. Transform: derive eligibility, then mark the batch done
    hut.transform(false, |r| {
        let age = r.int("age")?;
        r.set("eligible", 18 < age && age < 35);
        Ok(())
    })?;
    hut.transform_complete()?;

    // 3. A later batch; early dedup skips names already present
    hut.extract(["phil", "harry"], |r, name| {
        if hut.not_unique(&Record::new().with("name", name))? {
            return Ok(());
        }
        r.set("name", name).set("age", 17);
        Ok(())
    })?;
    let incremental = hut.transform(false, |r| {
        let age = r.int("age")?;
        r.set("eligible", 18 < age && age < 35);
        Ok(())
    })?;
    println!("incremental transform visited {} record(s)", incremental.visited);

    // 4. Query
    let avg = hut.dataset().avg("age")?.unwrap_or_default();
    println!("average age: {:.2}", avg);
    for name in hut
        .dataset()
        .filter("eligible", true)
        .order_by("name")
        .values("name")?
    {
        println!("eligible: {}", name);
    }

    // 5. Metadata survives between runs alongside the records
    let fields: Vec<String> = hut.schema().names().map(String::from).collect();
    hut.store_meta("fields", &fields)?;
    println!("cached fields: {:?}", hut.fetch_meta::<Vec<String>>("fields")?);

    hut.close()
}
