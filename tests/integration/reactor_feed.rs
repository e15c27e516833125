use super::support::{agent, reference, thing, Harness, RecordingProtocol};
use twinlink::events::{BusReceiver, ChangeFeed, ChangeNotification};

/// A one-slot feed whose agent create was overwritten before anyone read it.
/// The feed is dropped, so the reactor stops once it drains the receiver.
fn overflowed(harness: &Harness) -> BusReceiver<ChangeNotification> {
    let agent_x = agent("agent-x", &[("cfg1", "simulator")]);
    harness.store.merge(agent_x.clone());
    harness.store.merge(thing("asset-a", &[("temp", "agent-x", "cfg1")]));

    let feed = ChangeFeed::new(1);
    let receiver = feed.subscribe();
    feed.publish(ChangeNotification::created(agent_x));
    feed.publish(ChangeNotification::created(thing("asset-b", &[])));
    feed.publish(ChangeNotification::created(thing("asset-c", &[])));
    receiver
}

#[tokio::test]
async fn lagged_feed_resyncs_from_store() {
    let simulator = RecordingProtocol::new("simulator");
    let harness = Harness::new(&[simulator.clone()]);
    let receiver = overflowed(&harness);

    harness.reactor.run(receiver).await;

    assert!(harness.registry().contains(&reference("agent-x", "cfg1")));
    assert!(simulator.bound().contains(&reference("asset-a", "temp")));
}

#[tokio::test]
async fn lagged_feed_without_resync_loses_the_agent() {
    let simulator = RecordingProtocol::new("simulator");
    let mut harness = Harness::new(&[simulator.clone()]);
    harness.reactor = twinlink::reactor::ChangeReactor::new(harness.engine.clone())
        .with_resync_on_lag(false);
    let receiver = overflowed(&harness);

    harness.reactor.run(receiver).await;

    assert!(harness.registry().is_empty());
    assert!(simulator.calls().is_empty());
}
