//! Warabi families inside full process spaces

use bedrock_space::{FrozenSpace, ParamPath};
use bedrock_spec::{ProcSpec, ProviderSpaceFactory};
use bedrock_warabi::{Backend, TransferManager, WarabiOptions, WarabiSpaceBuilder};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn storage(options: WarabiOptions, count: (i64, i64)) -> Vec<ProviderSpaceFactory> {
    let builder = WarabiSpaceBuilder::new(options).unwrap();
    vec![ProviderSpaceFactory::new("storage", builder, count)]
}

fn frozen(factories: &[ProviderSpaceFactory]) -> FrozenSpace {
    ProcSpec::space((1, 3), (2, 5), factories)
        .unwrap()
        .freeze()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_sampled_specs_respect_ranges(seed in any::<u64>()) {
        let factories = storage(WarabiOptions::default(), (1, 3));
        let space = frozen(&factories);
        let config = space.sample_configuration(&mut StdRng::seed_from_u64(seed));
        prop_assert!(space.check(&config).is_ok());

        let spec = ProcSpec::from_config_with("na+sm", &config, &factories).unwrap();
        let num_pools = config.get_int(&ParamPath::key("num_pools")).unwrap();
        prop_assert_eq!(spec.pools.len(), usize::try_from(num_pools).unwrap());
        prop_assert!((1..=3).contains(&spec.pools.len()));

        for pool in &spec.pools {
            prop_assert!((2..=5).contains(&pool.num_xstreams));
            prop_assert!((1..=3).contains(&pool.providers.len()));
            for provider in &pool.providers {
                prop_assert_eq!(provider.provider_type.as_str(), "warabi");
                let backend = provider.config["target"]["type"].as_str().unwrap();
                prop_assert!(Backend::from_name(backend).is_some());
                let target = &provider.config["target"]["config"];
                prop_assert_eq!(
                    target.get("create_if_missing_with_size").is_some(),
                    backend == "pmdk"
                );
            }
        }

        let ids: Vec<u32> = spec.providers().map(|p| p.provider_id).collect();
        let expected: Vec<u32> = (0..u32::try_from(ids.len()).unwrap()).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn prop_paths_follow_backend(seed in any::<u64>()) {
        let factories = storage(WarabiOptions::new().with_paths(["/aaa", "/bbb"]), (1, 2));
        let space = frozen(&factories);
        let config = space.sample_configuration(&mut StdRng::seed_from_u64(seed));
        let spec = ProcSpec::from_config_with("na+sm", &config, &factories).unwrap();

        for provider in spec.providers() {
            let backend = provider.config["target"]["type"].as_str().unwrap();
            let path = provider.config["target"]["config"].get("path");
            prop_assert_eq!(path.is_some(), backend != "memory");
            if let Some(path) = path {
                prop_assert!(path == "/aaa" || path == "/bbb");
            }
        }
    }
}

#[test]
fn same_seed_same_json() {
    let factories = storage(WarabiOptions::default(), (1, 3));
    let render = || {
        let config = frozen(&factories).sample_configuration(&mut StdRng::seed_from_u64(2024));
        ProcSpec::from_config_with("na+sm", &config, &factories)
            .unwrap()
            .to_json(4)
            .unwrap()
    };
    assert_eq!(render(), render());
}

#[test]
fn default_configuration_is_minimal() {
    let factories = storage(
        WarabiOptions::new().with_transfer_managers([TransferManager::Pipeline]),
        (1, 3),
    );
    let config = frozen(&factories).default_configuration();
    let spec = ProcSpec::from_config_with("na+sm", &config, &factories).unwrap();

    assert_eq!(spec.pools.len(), 1);
    assert_eq!(spec.pools[0].num_xstreams, 2);
    assert_eq!(spec.provider_count(), 1);
    assert_eq!(
        spec.pools[0].providers[0].config,
        serde_json::json!({
            "target": {"type": "memory", "config": {}},
            "transfer_manager": {
                "type": "pipeline",
                "config": {
                    "buffer_size_multiplier": 2,
                    "first_buffer_size": 1024,
                    "num_buffers_per_pool": 8,
                    "num_pools": 1
                }
            }
        })
    );
}

#[test]
fn zero_storage_providers() {
    let factories = storage(WarabiOptions::default(), (0, 0));
    let space = frozen(&factories);
    assert!(space
        .parameters()
        .all(|p| !p.path().to_string().contains("family")));

    let config = space.sample_configuration(&mut StdRng::seed_from_u64(3));
    let spec = ProcSpec::from_config_with("na+sm", &config, &factories).unwrap();
    assert_eq!(spec.provider_count(), 0);
}

#[test]
fn generic_materialization_keeps_raw_keys() {
    let factories = storage(
        WarabiOptions::new()
            .with_types([Backend::Memory])
            .with_transfer_managers([TransferManager::Default]),
        (1, 1),
    );
    let config = frozen(&factories).default_configuration();
    let spec = ProcSpec::from_config("na+sm", &config).unwrap();
    assert_eq!(
        spec.pools[0].providers[0].config,
        serde_json::json!({
            "target": {"type": "memory"},
            "transfer_manager": {"type": "__default__"}
        })
    );
}
