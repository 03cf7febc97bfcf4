use fastdlis::{
    build_report,
    dlis::encode::logged_well,
    make_presenters,
    presenter::{run_presenters, CsvWriter, JsonWriter},
    progress::Silent,
    DlisLoader, Extensions,
};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn fixture() -> TempDir {
    let root = TempDir::new().unwrap();
    let good = root.path().join("1-ABC-1-RJS");
    let bad = root.path().join("3-DEF-2-SPS");
    fs::create_dir(&good).unwrap();
    fs::create_dir(&bad).unwrap();

    fs::write(good.join("runs.dlis"), logged_well("1-ABC-1-RJS", 3).unwrap()).unwrap();
    fs::write(good.join("notes.txt"), "ignored").unwrap();
    fs::write(bad.join("garbage.DLIS"), b"definitely not a storage unit label").unwrap();

    root
}

#[test]
fn report_valid_and_invalid_files() {
    let root = fixture();
    let output = root.path().join("output.json");

    let records =
        build_report(root.path(), &Extensions::default(), &DlisLoader, &mut Silent).unwrap();
    let mut presenters = make_presenters!["json" => JsonWriter(output.clone())];
    run_presenters(&mut presenters, &records).unwrap();

    let json: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);

    // ascending size puts the short garbage file first
    assert_eq!(entries[0]["file"], "garbage.DLIS");
    assert_eq!(entries[0]["well"], "3-DEF-2-SPS");
    assert_eq!(entries[0]["error"], true);
    assert_eq!(entries[0]["logical_files"], 0);
    assert!(!entries[0]["error_message"].as_str().unwrap().is_empty());

    assert_eq!(entries[1]["file"], "runs.dlis");
    assert_eq!(entries[1]["well"], "1-ABC-1-RJS");
    assert_eq!(entries[1]["error"], false);
    assert_eq!(entries[1]["error_message"], "");
    assert_eq!(entries[1]["logical_files"], 3);
}

#[test]
fn write_every_requested_format() {
    let root = fixture();
    let json = root.path().join("summary.json");
    let csv = root.path().join("summary.csv");

    let records =
        build_report(root.path(), &Extensions::default(), &DlisLoader, &mut Silent).unwrap();
    let mut presenters = make_presenters![
        "json" => JsonWriter(json.clone()),
        "csv" => CsvWriter(csv.clone()),
    ];
    run_presenters(&mut presenters, &records).unwrap();

    let csv = fs::read_to_string(csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("file,well,size,error,error_message,logical_files")
    );
    assert_eq!(lines.count(), 2);
    assert!(json.exists());
}

#[test]
fn rescan_in_the_same_order() {
    let root = fixture();
    let scan = || {
        build_report(root.path(), &Extensions::default(), &DlisLoader, &mut Silent)
            .unwrap()
            .iter()
            .map(|r| r.file().to_owned())
            .collect::<Vec<_>>()
    };

    assert_eq!(scan(), scan());
}

#[cfg(unix)]
#[test]
fn report_past_dangling_symlinks() {
    let root = fixture();
    let well = root.path().join("1-ABC-1-RJS");
    std::os::unix::fs::symlink(well.join("gone.txt"), well.join("dangling.txt")).unwrap();

    let records =
        build_report(root.path(), &Extensions::default(), &DlisLoader, &mut Silent).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].file(), "runs.dlis");
    assert_eq!(records[1].logical_files(), 3);
}
