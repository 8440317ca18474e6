use satmesh::config::SimulationConfig;
use satmesh::simulation::build_registry;
use std::path::Path;
use std::time::Duration;

fn bundled_config() -> SimulationConfig {
    SimulationConfig::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("config.json")).unwrap()
}

#[test]
fn test_bundled_config_is_valid() {
    let config = bundled_config();
    config.validate().unwrap();
    assert_eq!(config.satellites.len(), 4);
    assert_eq!(config.vessels.len(), 3);
}

#[test]
fn test_bundled_topology_is_symmetric() {
    let config = bundled_config();
    let registry = build_registry(&config).unwrap();

    for id in registry.node_ids() {
        let node = registry.get(&id).unwrap();
        for (neighbor, link) in &node.links {
            assert_eq!(registry.link(neighbor, &id), Some(*link));
        }
    }

    let link = registry.link("sat-4", "sat-3").unwrap();
    assert_eq!(link.latency, Duration::from_millis(150));
    assert_eq!(link.loss_probability, 0.2);
    assert_eq!(registry.ground_uplink("sat-1"), Some(false));
    assert_eq!(registry.ground_uplink("sat-2"), Some(true));
}
