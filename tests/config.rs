use std::fs;

use assert_matches::assert_matches;

use herbarium_reorganizer::config::ConfigLoader;
use herbarium_reorganizer::domain::{FamilyPolicy, PrefixPolicy};
use herbarium_reorganizer::error::HerbariumError;

#[test]
fn resolve_from_explicit_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("herbarium-ro.json");
    fs::write(
        &path,
        r#"{
            "common_prefix": "Pictures/Field",
            "prefix_policy": "keep",
            "family_policy": "lenient",
            "debug_limit": 10
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();

    assert_eq!(resolved.common_prefix.as_deref(), Some("Pictures/Field"));
    assert_eq!(resolved.prefix_policy, PrefixPolicy::Keep);
    assert_eq!(resolved.family_rule.policy, FamilyPolicy::Lenient);
    assert_eq!(resolved.family_rule.sentinel, 9);
    assert_eq!(resolved.debug_limit, 10);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, HerbariumError::ConfigRead(_));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, HerbariumError::ConfigParse(_));
}
