mod common;

use qf_faction::{load_library, merge_libraries, save_library, FactionLibrary, MergeChange};
use tempfile::tempdir;

#[test]
fn json_file_roundtrip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("factions.json");
    let library = FactionLibrary::new(vec![common::merchants(), common::seers()]);
    save_library(&library, &path).expect("save");
    assert_eq!(load_library(&path).expect("load"), library);
}

#[test]
fn binary_file_roundtrip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("factions.bin");
    let library = FactionLibrary::new(vec![common::millwrights()]);
    save_library(&library, &path).expect("save");
    assert_eq!(load_library(&path).expect("load"), library);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().expect("tempdir");
    let err = load_library(&dir.path().join("absent.json")).expect_err("missing");
    assert_eq!(err.code(), "io-read");
}

#[test]
fn merge_replaces_by_name_and_sorts() {
    let existing = FactionLibrary::new(vec![common::seers(), common::merchants()]);
    let updated = common::merchants().with_motto("Fresh terms");
    let incoming = vec![updated.clone(), common::millwrights()];

    let (merged, changes) = merge_libraries(&existing, &incoming, "inbox-7");

    let names: Vec<&str> = merged.factions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Granary Guilds", "Millwrights", "Moon Seers"]);
    assert_eq!(merged.get("Granary Guilds"), Some(&updated));
    assert_eq!(
        changes["Granary Guilds"],
        MergeChange::Updated {
            source: "inbox-7".into()
        }
    );
    assert_eq!(
        changes["Millwrights"],
        MergeChange::Added {
            source: "inbox-7".into()
        }
    );
    assert!(!changes.contains_key("Moon Seers"));
}

#[test]
fn later_incoming_entry_wins() {
    let existing = FactionLibrary::default();
    let first = common::seers();
    let second = common::seers().with_description("revised");
    let (merged, changes) = merge_libraries(&existing, &[first, second.clone()], "batch");
    assert_eq!(merged.factions, vec![second.clone()]);
    assert_eq!(changes.len(), 1);
    assert_eq!(
        changes[&second.name],
        MergeChange::Updated {
            source: "batch".into()
        }
    );
}
