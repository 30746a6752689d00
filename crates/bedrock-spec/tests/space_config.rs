//! Space config files loaded from disk

use bedrock_spec::{ProcSpec, SpaceConfig, SpecError};
use bedrock_test_utils::{config_file, registry, seeded_rng, WARABI_TOML};
use pretty_assertions::assert_eq;

#[test]
fn toml_file_builds_sampleable_space() {
    let file = config_file("toml", WARABI_TOML);
    let config = SpaceConfig::from_path(file.path()).unwrap();
    assert_eq!(config.families.len(), 2);

    let registry = registry();
    let factories = config.to_factories(&registry).unwrap();
    let frozen = config.build_space(&registry).unwrap().freeze().unwrap();
    let sample = frozen.sample_configuration(&mut seeded_rng(1));
    let spec = ProcSpec::from_config_with("na+sm", &sample, &factories).unwrap();
    assert!(spec
        .providers()
        .all(|p| p.family == "storage" || p.provider_type == "yokan"));
}

#[test]
fn formats_are_interchangeable() {
    let toml = SpaceConfig::from_toml_str(WARABI_TOML).unwrap();

    let json = config_file("json", &serde_json::to_string_pretty(&toml).unwrap());
    assert_eq!(SpaceConfig::from_path(json.path()).unwrap(), toml);

    let yaml = config_file("yml", &serde_yaml::to_string(&toml).unwrap());
    assert_eq!(SpaceConfig::from_path(yaml.path()).unwrap(), toml);
}

#[test]
fn bad_files_are_reported() {
    let ini = config_file("ini", "num_pools = 1");
    assert!(matches!(
        SpaceConfig::from_path(ini.path()),
        Err(SpecError::UnsupportedFormat(ext)) if ext == "ini"
    ));

    let missing = SpaceConfig::from_path("/nonexistent/space.toml").unwrap_err();
    assert!(matches!(missing, SpecError::Io { .. }));
    assert!(missing.is_config());

    let bad_options = config_file(
        "toml",
        "[[families]]\nfamily = \"storage\"\ntype = \"warabi\"\noptions = { need_persistence = true }\n",
    );
    let config = SpaceConfig::from_path(bad_options.path()).unwrap();
    let err = config.build_space(&registry()).unwrap_err();
    assert!(!err.is_config());
    assert!(err.to_string().contains("paths are required"));
}
