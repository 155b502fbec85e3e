//! Metadata side table

use datahut::prelude::*;
use std::collections::HashMap;

#[test]
fn test_overwrite_and_missing_key() {
    let temp_dir = tempfile::tempdir().unwrap();
    let hut = DataHut::open(temp_dir.path().join("meta.db")).unwrap();

    hut.store_meta("harry", "wizard").unwrap();
    hut.store_meta("harry", "muggle").unwrap();

    assert_eq!(
        hut.fetch_meta::<String>("harry").unwrap(),
        Some("muggle".to_string())
    );
    assert_eq!(hut.fetch_meta::<String>("missing").unwrap(), None);
}

#[test]
fn test_meta_is_independent_of_records() {
    let temp_dir = tempfile::tempdir().unwrap();
    let hut = DataHut::open(temp_dir.path().join("meta.db")).unwrap();

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Cursor {
        page: u32,
        fields: Vec<String>,
    }

    let cursor = Cursor {
        page: 4,
        fields: vec!["name".into(), "age".into()],
    };
    hut.store_meta("cursor", &cursor).unwrap();

    assert!(hut.schema().is_empty());
    assert_eq!(hut.dataset().count().unwrap(), 0);
    assert_eq!(hut.fetch_meta::<Cursor>("cursor").unwrap(), Some(cursor));
}

#[test]
fn test_serialization_error_names_key() {
    let temp_dir = tempfile::tempdir().unwrap();
    let hut = DataHut::open(temp_dir.path().join("meta.db")).unwrap();

    // JSON object keys must be strings
    let mut grid = HashMap::new();
    grid.insert((1, 2), 3);

    let err = hut.store_meta("grid", &grid).unwrap_err();
    assert!(matches!(err, HutError::Serialization { ref key, .. } if key == "grid"));
    assert_eq!(hut.fetch_meta::<i64>("grid").unwrap(), None);
}

#[test]
fn test_deserialization_error_names_key() {
    let temp_dir = tempfile::tempdir().unwrap();
    let hut = DataHut::open(temp_dir.path().join("meta.db")).unwrap();

    hut.store_meta("harry", "wizard").unwrap();
    let err = hut.fetch_meta::<i64>("harry").unwrap_err();
    assert!(matches!(err, HutError::Deserialization { ref key, .. } if key == "harry"));
    assert!(err.to_string().contains("harry"));
}

#[test]
fn test_callback_may_use_meta_mid_pass() {
    let temp_dir = tempfile::tempdir().unwrap();
    let hut = DataHut::open(temp_dir.path().join("meta.db")).unwrap();

    hut.extract(["a", "b", "c"], |r, letter| {
        r.set("letter", letter);
        hut.store_meta("last_letter", letter)?;
        Ok(())
    })
    .unwrap();

    assert_eq!(
        hut.fetch_meta::<String>("last_letter").unwrap().as_deref(),
        Some("c")
    );
    assert_eq!(hut.meta_keys().unwrap(), vec!["last_letter".to_string()]);
}
