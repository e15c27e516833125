use super::support::{agent, reference, thing, Direction, RecordingProtocol};
use std::sync::Arc;
use std::time::Duration;
use twinlink::config::FeedConfig;
use twinlink::events::ChangeNotification;
use twinlink::protocol::ProtocolSet;
use twinlink::service::AgentService;
use twinlink::store::MemoryAssetStore;

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn published_changes_are_applied_while_running() {
    let simulator = RecordingProtocol::new("simulator");
    let protocols = Arc::new(ProtocolSet::new());
    protocols.register(simulator.clone()).unwrap();
    let store = Arc::new(MemoryAssetStore::new());
    store.merge(thing("asset-a", &[("temp", "agent-x", "cfg1")]));
    let service = AgentService::new(store.clone(), protocols, &FeedConfig::default());

    service.start().await.unwrap();
    assert!(service.registry().is_empty());

    let agent_x = agent("agent-x", &[("cfg1", "simulator")]);
    store.merge(agent_x.clone());
    service
        .change_feed()
        .publish(ChangeNotification::created(agent_x));

    wait_until(|| service.registry().contains(&reference("agent-x", "cfg1"))).await;
    assert!(simulator.bound().contains(&reference("asset-a", "temp")));

    service.stop().await;
    assert!(service.registry().is_empty());
    assert!(simulator.bound().is_empty());
    assert_eq!(
        simulator.calls().last().map(|call| call.direction),
        Some(Direction::Unlink)
    );
}

#[tokio::test]
async fn start_links_persisted_agents_and_is_idempotent() {
    let simulator = RecordingProtocol::new("simulator");
    let protocols = Arc::new(ProtocolSet::new());
    protocols.register(simulator.clone()).unwrap();
    let store = Arc::new(MemoryAssetStore::from_assets(vec![
        agent("agent-x", &[("cfg1", "simulator")]),
        thing("asset-a", &[("temp", "agent-x", "cfg1")]),
    ]));
    let service = AgentService::new(store, protocols, &FeedConfig::default());

    service.start().await.unwrap();
    service.start().await.unwrap();

    assert!(service.is_running());
    assert_eq!(service.registry().len(), 1);
    assert_eq!(simulator.calls().len(), 1);

    service.stop().await;
    service.stop().await;
    assert!(!service.is_running());
    assert_eq!(simulator.calls().len(), 2);
}
