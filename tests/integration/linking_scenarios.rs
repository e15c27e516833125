use super::support::{agent, reference, thing, Call, Direction, Harness, RecordingProtocol};
use chrono::{TimeZone, Utc};
use serde_json::json;
use twinlink::asset::{Asset, AssetType, Attribute, AttributeRef, MetaItem};
use twinlink::error::ApiError;
use twinlink::events::ChangeNotification;
use twinlink::protocol::ProtocolSet;

#[tokio::test]
async fn agent_create_binds_existing_linked_attribute() {
    let simulator = RecordingProtocol::new("simulator");
    let harness = Harness::new(&[simulator.clone()]);
    harness.store.merge(thing("asset-a", &[("temp", "agent-x", "cfg1")]));
    let agent_x = agent("agent-x", &[("cfg1", "simulator")]);
    harness.store.merge(agent_x.clone());

    harness
        .reactor
        .process(&ChangeNotification::created(agent_x))
        .await
        .unwrap();

    let registered = harness.registry().lookup(&reference("agent-x", "cfg1")).unwrap();
    assert_eq!(registered.protocol_name(), Some("simulator"));
    assert_eq!(
        simulator.calls(),
        vec![Call {
            direction: Direction::Link,
            configuration: reference("agent-x", "cfg1"),
            attributes: vec![reference("asset-a", "temp")],
        }]
    );
}

#[tokio::test]
async fn removing_configuration_unbinds_its_attributes() {
    let simulator = RecordingProtocol::new("simulator");
    let harness = Harness::new(&[simulator.clone()]);
    harness.store.merge(thing("asset-a", &[("temp", "agent-x", "cfg1")]));
    let before = agent("agent-x", &[("cfg1", "simulator")]);
    harness.store.merge(before.clone());
    harness
        .reactor
        .process(&ChangeNotification::created(before.clone()))
        .await
        .unwrap();

    let mut after = before.clone();
    after.remove_attribute("cfg1");
    harness.store.merge(after.clone());
    harness
        .reactor
        .process(&ChangeNotification::updated(&before, after).unwrap())
        .await
        .unwrap();

    assert!(harness.registry().lookup(&reference("agent-x", "cfg1")).is_none());
    let unlinks: Vec<Call> = simulator
        .calls()
        .into_iter()
        .filter(|call| call.direction == Direction::Unlink)
        .collect();
    assert_eq!(
        unlinks,
        vec![Call {
            direction: Direction::Unlink,
            configuration: reference("agent-x", "cfg1"),
            attributes: vec![reference("asset-a", "temp")],
        }]
    );
}

#[tokio::test]
async fn linking_twice_keeps_one_registration() {
    let simulator = RecordingProtocol::new("simulator");
    let harness = Harness::new(&[simulator.clone()]);
    harness.store.merge(thing(
        "asset-a",
        &[("temp", "agent-x", "cfg1"), ("level", "agent-x", "cfg1")],
    ));
    let configuration = agent("agent-x", &[("cfg1", "simulator")])
        .protocol_configurations()
        .remove(0);

    harness.engine.link_configuration(configuration.clone()).await.unwrap();
    harness.engine.link_configuration(configuration).await.unwrap();

    assert_eq!(harness.registry().len(), 1);
    let calls = simulator.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(calls[0].attributes.len(), 2);
}

#[tokio::test]
async fn protocol_failure_does_not_stop_other_configurations() {
    let broken = RecordingProtocol::failing("broken");
    let simulator = RecordingProtocol::new("simulator");
    let harness = Harness::new(&[broken.clone(), simulator.clone()]);
    harness.store.merge(thing(
        "asset-a",
        &[("temp", "agent-x", "cfg1"), ("level", "agent-x", "cfg2")],
    ));
    harness
        .store
        .merge(agent("agent-x", &[("cfg1", "broken"), ("cfg2", "simulator")]));

    let linked = harness.engine.link_all_agents().await.unwrap();

    assert_eq!(linked, 2);
    assert_eq!(harness.registry().len(), 2);
    assert_eq!(broken.calls().len(), 1);
    assert_eq!(simulator.calls()[0].attributes, vec![reference("asset-a", "level")]);
}

#[tokio::test]
async fn unknown_protocol_leaves_attributes_unbound() {
    let simulator = RecordingProtocol::new("simulator");
    let harness = Harness::new(&[simulator.clone()]);
    harness.store.merge(thing("asset-a", &[("temp", "agent-x", "cfg1")]));
    let agent_x = agent("agent-x", &[("cfg1", "modbus")]);

    harness
        .reactor
        .process(&ChangeNotification::created(agent_x))
        .await
        .unwrap();

    assert!(harness.registry().contains(&reference("agent-x", "cfg1")));
    assert!(simulator.calls().is_empty());
}

#[tokio::test]
async fn value_timestamp_refresh_issues_no_calls() {
    let simulator = RecordingProtocol::new("simulator");
    let harness = Harness::new(&[simulator.clone()]);
    harness
        .reactor
        .process(&ChangeNotification::created(agent("agent-x", &[("cfg1", "simulator")])))
        .await
        .unwrap();

    let sample = |day| {
        Asset::new("asset-a", "asset-a", AssetType::Thing).with_attribute(
            Attribute::new("temp")
                .with_value_at(json!(20.5), Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap())
                .with_meta(MetaItem::agent_link(&AttributeRef::new("agent-x", "cfg1"))),
        )
    };
    harness
        .reactor
        .process(&ChangeNotification::updated(&sample(1), sample(2)).unwrap())
        .await
        .unwrap();

    assert!(simulator.calls().is_empty());
}

#[tokio::test]
async fn agent_delete_unbinds_and_unregisters() {
    let simulator = RecordingProtocol::new("simulator");
    let harness = Harness::new(&[simulator.clone()]);
    harness.store.merge(thing("asset-a", &[("temp", "agent-x", "cfg1")]));
    let agent_x = agent("agent-x", &[("cfg1", "simulator")]);
    harness
        .reactor
        .process(&ChangeNotification::created(agent_x.clone()))
        .await
        .unwrap();

    harness
        .reactor
        .process(&ChangeNotification::deleted(agent_x))
        .await
        .unwrap();

    assert!(harness.registry().is_empty());
    assert!(simulator.bound().is_empty());
}

#[test]
fn empty_protocol_name_is_rejected_at_registration() {
    let protocols = ProtocolSet::new();
    let result = protocols.register(RecordingProtocol::new(""));
    assert!(matches!(result, Err(ApiError::EmptyProtocolName { .. })));
    assert!(protocols.is_empty());
}
