mod common;

use std::fs;
use std::io::{Cursor, Write};

use camino::{Utf8Path, Utf8PathBuf};
use rephrase::error::CoreError;
use rephrase::model::SlotName;
use rephrase::store::{ExampleStore, FsSource, MemSource, PresetResolver, ZipSource};
use tempfile::tempdir;

fn utf8(p: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(p.to_path_buf()).unwrap()
}

#[test]
fn parses_fixture_and_keeps_row_order() {
    let rows = common::rows();
    assert_eq!(rows.len(), 21);
    assert_eq!(rows[0].sentence_id, "s1");
    assert_eq!(rows[0].slot, SlotName::S);
    assert_eq!(rows[0].subslot_id, None);
    assert_eq!(rows[6].subslot_id, Some(SlotName::M1));
    assert_eq!(rows[6].subslot_display_order, Some(1.0));
    assert!(rows[17].is_top_of_sentence_display);
}

#[test]
fn missing_display_order_defaults_to_zero() {
    let rows = ExampleStore::parse_rows(r#"[{"sentenceId":"a","slot":"V","phraseText":"go"}]"#, "t")
        .unwrap();
    assert_eq!(rows[0].display_order, 0.0);
    assert_eq!(rows[0].gloss_text, "");
}

#[test]
fn loose_field_types_and_snake_case_are_accepted() {
    let text = r#"[
        {"sentence_id": 12, "slot": "o1", "subslot_id": "c1", "phrase_text": "red", "display_order": "3.5"},
        {"sentenceId": "12", "slot": "V", "displayOrder": null, "extra": "ignored"}
    ]"#;
    let rows = ExampleStore::parse_rows(text, "t").unwrap();
    assert_eq!(rows[0].sentence_id, "12");
    assert_eq!(rows[0].slot, SlotName::O1);
    assert_eq!(rows[0].subslot_id, Some(SlotName::C1));
    assert_eq!(rows[0].display_order, 3.5);
    assert_eq!(rows[1].display_order, 0.0);
}

#[test]
fn required_fields_and_slot_names_are_checked() {
    let missing_id = r#"[{"slot":"S","phraseText":"x"}]"#;
    let err = ExampleStore::parse_rows(missing_id, "t").unwrap_err();
    assert!(format!("{:#}", err).contains("sentenceId"));

    let missing_slot = r#"[{"sentenceId":"a","slot":"  "}]"#;
    let err = ExampleStore::parse_rows(missing_slot, "t").unwrap_err();
    assert!(format!("{:#}", err).contains("slot"));

    let bad_slot = r#"[{"sentenceId":"a","slot":"Q9"}]"#;
    assert!(ExampleStore::parse_rows(bad_slot, "t").is_err());

    let bad_subslot = r#"[{"sentenceId":"a","slot":"S","subslotId":"X"}]"#;
    assert!(ExampleStore::parse_rows(bad_subslot, "t").is_err());

    assert!(ExampleStore::parse_rows("{not json", "t").is_err());
}

#[test]
fn duplicate_rows_keep_the_first() {
    let text = r#"[
        {"sentenceId":"a","slot":"S","phraseText":"first"},
        {"sentenceId":"a","slot":"S","phraseText":"second"},
        {"sentenceId":"a","slot":"S","subslotId":"V","phraseText":"sub"}
    ]"#;
    let rows = ExampleStore::parse_rows(text, "t").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].phrase_text, "first");
}

#[test]
fn failed_load_leaves_previous_rows_untouched() {
    let mut store = common::store();
    let before = store.rows().to_vec();
    let mut source = MemSource::new().with_file("broken.json", "[{\"slot\":\"S\"}]");
    let err = store
        .load_into("broken", &mut source, Utf8Path::new("broken.json"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Load { ref preset, .. } if preset == "broken"));
    assert!(err.is_user_visible());
    assert_eq!(store.rows(), before.as_slice());
    assert_eq!(store.preset_id(), Some("fixture"));

    let err = store
        .load_into("gone", &mut source, Utf8Path::new("missing.json"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Load { .. }));
    assert_eq!(store.rows().len(), before.len());
}

#[test]
fn distinct_ids_and_rows_for() {
    let store = common::store();
    assert_eq!(store.distinct_sentence_ids(), vec!["s1", "s2", "s3", "s4"]);
    assert!(store.contains_sentence("s3"));
    assert!(!store.contains_sentence("s9"));
    assert_eq!(store.rows_for("s2").count(), 3);
}

#[test]
fn loads_from_filesystem_and_zip_bundle() {
    let tmp = tempdir().unwrap();
    let json_path = utf8(&tmp.path().join("basic.json"));
    fs::write(&json_path, common::PRESET).unwrap();
    let rows = ExampleStore::load(&mut FsSource, &json_path).unwrap();
    assert_eq!(rows.len(), 21);

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::FileOptions::default();
        zip.start_file("presets/basic.json", options).unwrap();
        zip.write_all(common::PRESET.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.set_position(0);
    let mut bundle = ZipSource::new(buf).unwrap();
    assert_eq!(bundle.entries().unwrap(), vec![Utf8PathBuf::from("presets/basic.json")]);
    let rows = ExampleStore::load(&mut bundle, Utf8Path::new("/presets/basic.json")).unwrap();
    assert_eq!(rows.len(), 21);
    assert!(ExampleStore::load(&mut bundle, Utf8Path::new("presets/other.json")).is_err());
}

#[test]
fn validate_all_reports_each_file() {
    let tmp = tempdir().unwrap();
    let good = utf8(&tmp.path().join("good.json"));
    let bad = utf8(&tmp.path().join("bad.json"));
    fs::write(&good, common::PRESET).unwrap();
    fs::write(&bad, "[{\"sentenceId\":\"a\",\"slot\":\"nope\"}]").unwrap();

    let results = ExampleStore::validate_all(&[good.clone(), bad.clone()]);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, good);
    assert_eq!(*results[0].1.as_ref().unwrap(), 21);
    assert_eq!(results[1].0, bad);
    assert!(results[1].1.is_err());
}

#[test]
fn preset_resolver_prefers_earlier_search_paths() {
    let tmp = tempdir().unwrap();
    let dir1 = utf8(&tmp.path().join("p1"));
    let dir2 = utf8(&tmp.path().join("p2"));
    fs::create_dir_all(dir2.join("nested")).unwrap();
    fs::create_dir_all(&dir1).unwrap();
    fs::write(dir1.join("basic.json"), "[]").unwrap();
    fs::write(dir2.join("basic.json"), "[]").unwrap();
    fs::write(dir2.join("nested").join("questions.json"), "[]").unwrap();
    fs::write(dir2.join("notes.txt"), "").unwrap();

    let resolver = PresetResolver::new([&dir1, &dir2]);
    assert_eq!(resolver.find("basic"), Some(dir1.join("basic.json")));
    assert_eq!(resolver.find("../basic"), None);

    let res = resolver.locate(["basic", "missing", "basic"]);
    assert_eq!(res.found, vec![("basic".to_string(), dir1.join("basic.json"))]);
    assert_eq!(res.not_found, vec!["missing".to_string()]);

    let ids: Vec<String> = resolver.scan().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["basic".to_string(), "questions".to_string()]);
}
