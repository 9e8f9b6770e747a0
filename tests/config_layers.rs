use labelcommit::config::Settings;
use labelcommit::persist::PersistenceMode;
use labelcommit::pipeline::ExampleKind;

fn write_config(name: &str, body: &str) -> String {
    let path = std::env::temp_dir().join(format!("{}_{}.toml", name, std::process::id()));
    std::fs::write(&path, body).expect("write config");
    path.to_string_lossy().into_owned()
}

#[test]
fn defaults_apply_without_a_file() {
    let settings = Settings::from_file("definitely_missing_labelcommit_config").expect("settings");
    assert_eq!(settings.log_filter, "info");
    assert_eq!(settings.project.id, 1);
    assert_eq!(settings.user.id, 1);
    assert!(!settings.project.allow_overlapping);
    assert_eq!(settings.database.mode(), PersistenceMode::InMemory);
}

#[test]
fn file_values_override_defaults() {
    let path = write_config(
        "labelcommit_config_test",
        r#"
log_filter = "labelcommit=debug"

[database]
path = "imports.db"

[project]
id = 12
allow_overlapping = true
single_class_classification = true

[user]
id = 4
"#,
    );
    let settings = Settings::from_file(&path).expect("settings");
    let _ = std::fs::remove_file(&path);
    assert_eq!(settings.log_filter, "labelcommit=debug");
    assert_eq!(settings.database.mode(), PersistenceMode::File("imports.db".to_string()));
    assert_eq!(settings.project.id, 12);
    assert!(settings.project.allow_overlapping);
    assert!(settings.project.single_class_classification);
    assert_eq!(settings.user.id, 4);
}

#[test]
fn kinds_parse_from_their_names() {
    for kind in [
        ExampleKind::Category,
        ExampleKind::Span,
        ExampleKind::Text,
        ExampleKind::SpanAndCategory,
        ExampleKind::Relation,
    ] {
        assert_eq!(kind.as_str().parse::<ExampleKind>().unwrap(), kind);
    }
    assert!("ner".parse::<ExampleKind>().is_err());
    assert!(!ExampleKind::Text.derives_label_types());
}
