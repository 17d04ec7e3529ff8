//! Configuration reload tests.

use search_router::config::{apply_server_updates, load_config, ConfigWatcher, RouterConfig};
use search_router::{ClientBuilder, ServerStatus};
use std::fs;
use std::time::Duration;
use tokio::sync::mpsc;

mod common;

use common::ScriptedExecutor;

#[tokio::test]
async fn test_server_updates_are_applied() {
    let client = ClientBuilder::new(ScriptedExecutor::default())
        .servers(["http://a", "http://b"])
        .build();
    client.registry().set_status("http://b", ServerStatus::Disabled);

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(RouterConfig {
        servers: vec!["http://b".into(), "http://c".into()],
        ..RouterConfig::default()
    })
    .unwrap();
    drop(tx);

    apply_server_updates(client.clone(), rx).await;

    assert_eq!(client.registry().addresses(), ["http://b", "http://c"]);
    assert_eq!(client.registry().status("http://b"), Some(ServerStatus::Disabled));
    assert_eq!(client.query("q".into()).await, Ok("q@http://c".to_string()));
}

#[tokio::test]
async fn test_watcher_reloads_valid_changes_only() {
    let path = std::env::temp_dir().join(format!("search-router-watch-{}.toml", std::process::id()));
    fs::write(&path, "servers = [\"http://a:8983/solr\"]\n").unwrap();
    let initial = load_config(&path).unwrap();

    let client = ClientBuilder::new(ScriptedExecutor::default())
        .from_config(&initial)
        .build();

    let (watcher, rx) = ConfigWatcher::new(&path);
    let _guard = watcher.run().unwrap();
    let updater = tokio::spawn(apply_server_updates(client.clone(), rx));

    // Invalid content is rejected and the running list stays.
    fs::write(&path, "servers = []\n").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(client.registry().addresses(), ["http://a:8983/solr"]);

    fs::write(&path, "servers = [\"http://a:8983/solr\", \"http://b:8983/solr\"]\n").unwrap();
    let mut reloaded = false;
    for _ in 0..50 {
        if client.registry().len() == 2 {
            reloaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(reloaded, "watcher never applied the new server list");

    updater.abort();
    let _ = fs::remove_file(&path);
}
