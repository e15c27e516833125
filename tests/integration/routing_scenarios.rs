use super::support::{agent, linked, reference, RecordingProtocol};
use serde_json::json;
use std::sync::Arc;
use twinlink::asset::{Asset, AssetType, Attribute};
use twinlink::config::FeedConfig;
use twinlink::error::ApiError;
use twinlink::events::{AttributeStateEvent, ProcessingStatus};
use twinlink::protocol::ProtocolSet;
use twinlink::service::AgentService;
use twinlink::store::MemoryAssetStore;

async fn started_service() -> AgentService {
    let store = Arc::new(MemoryAssetStore::from_assets(vec![agent(
        "agent-x",
        &[("cfg1", "simulator")],
    )]));
    let protocols = Arc::new(ProtocolSet::new());
    protocols.register(RecordingProtocol::new("simulator")).unwrap();
    let service = AgentService::new(store, protocols, &FeedConfig::default());
    service.start().await.unwrap();
    service
}

fn asset_a() -> Asset {
    Asset::new("asset-a", "Asset A", AssetType::Thing)
}

#[tokio::test]
async fn twin_write_with_resolved_link_is_dispatched_once() {
    let service = started_service().await;
    let mut writes = service.dispatch_channel().subscribe();
    let attribute = linked("temp", "agent-x", "cfg1").with_value(json!(22.0));
    let timestamp = attribute.value_timestamp;
    let mut event = AttributeStateEvent::southbound(asset_a(), attribute);

    service.process_state_event(&mut event);

    assert_eq!(event.status(), &ProcessingStatus::Handled);
    let command = writes.try_recv().unwrap();
    assert_eq!(command.attribute, reference("asset-a", "temp"));
    assert_eq!(command.value, Some(json!(22.0)));
    assert_eq!(Some(command.timestamp), timestamp);
    assert!(writes.try_recv().is_err());
    service.stop().await;
}

#[tokio::test]
async fn twin_write_with_dangling_link_is_error() {
    let service = started_service().await;
    let mut writes = service.dispatch_channel().subscribe();
    let attribute = linked("temp", "agent-x", "cfg-missing").with_value(json!(22.0));
    let mut event = AttributeStateEvent::southbound(asset_a(), attribute);

    service.process_state_event(&mut event);

    assert_eq!(
        event.status(),
        &ProcessingStatus::Error(ApiError::InvalidAgentLink {
            attribute: reference("asset-a", "temp"),
        })
    );
    assert!(writes.try_recv().is_err());
    service.stop().await;
}

#[tokio::test]
async fn protocol_originated_updates_are_never_dispatched() {
    let service = started_service().await;
    let mut writes = service.dispatch_channel().subscribe();

    for attribute in [
        linked("temp", "agent-x", "cfg1").with_value(json!(1)),
        linked("temp", "agent-x", "cfg-missing").with_value(json!(2)),
        Attribute::new("label").with_value(json!("plain")),
    ] {
        let mut event = AttributeStateEvent::northbound(asset_a(), attribute);
        service.process_state_event(&mut event);
        assert_eq!(event.status(), &ProcessingStatus::Unprocessed);
    }

    assert!(writes.try_recv().is_err());
    service.stop().await;
}
