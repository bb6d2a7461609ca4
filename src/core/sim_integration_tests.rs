use crate::core::diagnostics::DiagnosticKind;
use crate::core::mapper::Mapper;
use crate::core::models::{NodeField, SourceRecord};
use crate::storage::config::ConfigManager;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn inventory_node(certname: &str, fqdn: Option<&str>) -> SourceRecord {
    let mut facts = json!({
        "os": {"family": "RedHat", "name": "Rocky", "release": {"full": "9.3"}},
        "processors": {"isa": "x86_64"},
        "networking": {"interfaces": {"eth0": {"ip": "10.0.0.5"}}},
        "datacenter": "fra1"
    });
    if let Some(fqdn) = fqdn {
        facts["networking"]["fqdn"] = json!(fqdn);
    }
    SourceRecord::with_facts(certname, facts)
}

const CONFIG: &str = r#"{
  "mappings": {
    "hostname": {"path": "facts.networking.fqdn"},
    "username": {"default": "rundeck"},
    "osFamily": {"path": "facts.os.family"},
    "osName": {"path": "facts.os.name"},
    "osVersion": {"path": "facts.os.release.full"},
    "osArch": {"path": "facts.processors.isa"},
    "ip": {"path": "facts.networking.interfaces(eth0).ip"},
    "datacenter": {"default": "ams1", "path": "facts.datacenter"},
    "tags": {"path": "facts.roles"},
    "attributes": {}
  },
  "options": {"nodename_fallback": true}
}"#;

#[test]
fn sim_config_file_to_node_definition() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config").join("config.json");
    write_file(&config_path, CONFIG);

    let (mapper, config) = ConfigManager::new(config_path).load_mapper().unwrap();

    // 声明顺序必须与配置文件一致
    let names: Vec<&str> = config.mappings.iter().map(|(n, _)| n).collect();
    assert_eq!(names[0], "hostname");
    assert_eq!(names[names.len() - 1], "attributes");

    let record = inventory_node("web-01", Some("web-01.example.com"));
    let outcome = mapper.map_record(&record, &config.mappings);

    // datacenter 同时声明了 default 和 path
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].kind(), DiagnosticKind::ConfigurationConflict);
    assert_eq!(outcome.diagnostics[0].field(), Some("datacenter"));

    let node = outcome.node.unwrap();
    assert_eq!(node.get(NodeField::Hostname), Some("web-01.example.com"));
    assert_eq!(node.get(NodeField::Nodename), Some("web-01.example.com"));
    assert_eq!(node.get(NodeField::Username), Some("rundeck"));
    assert_eq!(node.get(NodeField::OsFamily), Some("RedHat"));
    assert_eq!(node.get(NodeField::OsName), Some("Rocky"));
    assert_eq!(node.get(NodeField::OsVersion), Some("9.3"));
    assert_eq!(node.get(NodeField::OsArch), Some("x86_64"));
    assert_eq!(node.property("ip"), Some("10.0.0.5"));
    assert_eq!(node.property("datacenter"), None);
    assert!(node.tags.is_empty());
    assert!(node.attributes.is_empty());
    assert_eq!(node.missing_required_fields(), vec!["tags"]);
}

#[test]
fn sim_batch_with_partial_facts() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    write_file(&config_path, CONFIG);

    let (mapper, config) = ConfigManager::new(config_path).load_mapper().unwrap();
    let records = vec![
        inventory_node("web-01", Some("web-01.example.com")),
        inventory_node("db-01", None),
    ];

    let outcomes = mapper.map_all(&records, &config.mappings);
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| !o.is_rejected()));

    // 没有 fqdn 的节点 hostname 为空，nodename 回退到 certname
    let db = outcomes[1].node.as_ref().unwrap();
    assert_eq!(db.hostname, None);
    assert_eq!(db.nodename.as_deref(), Some("db-01"));
    assert_eq!(db.missing_required_fields(), vec!["hostname", "tags"]);
}

#[test]
fn sim_same_input_same_output() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    write_file(&config_path, CONFIG);

    let (_, config) = ConfigManager::new(config_path).load_mapper().unwrap();
    let record = inventory_node("web-01", Some("web-01.example.com"));

    // 不同的引擎实例互不影响
    let a = Mapper::default().map_record(&record, &config.mappings);
    let b = Mapper::default().map_record(&record, &config.mappings);
    assert_eq!(a, b);
    assert_eq!(a.node.as_ref().unwrap().nodename, None);
}

#[test]
fn sim_concurrent_mapping() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    write_file(&config_path, CONFIG);

    let (mapper, config) = ConfigManager::new(config_path).load_mapper().unwrap();

    let hosts: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mapper = &mapper;
                let mappings = &config.mappings;
                s.spawn(move || {
                    let fqdn = format!("node-{i}.example.com");
                    let record = inventory_node(&format!("node-{i}"), Some(fqdn.as_str()));
                    mapper.transform(&record, mappings).unwrap().hostname.unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(
        hosts,
        (0..4).map(|i| format!("node-{i}.example.com")).collect::<Vec<_>>()
    );
}
