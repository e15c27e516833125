//! Agent Service
//!
//! Composition root for the linking core. Owns the binding registry, the
//! protocol set, the change feed and the dispatch channel, and runs the change
//! reactor as a background task between `start` and `stop`.

use crate::config::FeedConfig;
use crate::error::ApiError;
use crate::events::{AttributeStateEvent, ChangeFeed, DispatchChannel};
use crate::linking::LinkingEngine;
use crate::protocol::ProtocolSet;
use crate::reactor::ChangeReactor;
use crate::registry::BindingRegistry;
use crate::router::AttributeRouter;
use crate::store::AssetStore;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct AgentService {
    protocols: Arc<ProtocolSet>,
    engine: Arc<LinkingEngine>,
    reactor: Arc<ChangeReactor>,
    router: AttributeRouter,
    changes: ChangeFeed,
    running: RwLock<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AgentService {
    pub fn new(store: Arc<dyn AssetStore>, protocols: Arc<ProtocolSet>, config: &FeedConfig) -> Self {
        let registry = Arc::new(BindingRegistry::new());
        let engine = Arc::new(LinkingEngine::new(
            Arc::clone(&registry),
            Arc::clone(&protocols),
            store,
        ));
        let reactor = Arc::new(
            ChangeReactor::new(Arc::clone(&engine)).with_resync_on_lag(config.resync_on_lag),
        );
        let router = AttributeRouter::new(registry, DispatchChannel::new(config.dispatch_capacity));

        Self {
            protocols,
            engine,
            reactor,
            router,
            changes: ChangeFeed::new(config.change_capacity),
            running: RwLock::new(false),
            task: Mutex::new(None),
        }
    }

    /// Rebuild bindings from the store and start consuming change notifications
    ///
    /// Must be called from within a tokio runtime. Starting twice is a no-op.
    pub async fn start(&self) -> Result<(), ApiError> {
        {
            let mut running = self.running.write();
            if *running {
                return Ok(());
            }
            *running = true;
        }

        // Subscribe before discovery so no notification published meanwhile is lost
        let receiver = self.changes.subscribe();
        let linked = match self.engine.link_all_agents().await {
            Ok(linked) => linked,
            Err(e) => {
                *self.running.write() = false;
                return Err(e);
            }
        };

        {
            // A stop that ran during discovery wins; at most one reactor task exists
            let mut task = self.task.lock();
            if !*self.running.read() || task.is_some() {
                return Ok(());
            }
            let reactor = Arc::clone(&self.reactor);
            *task = Some(tokio::spawn(async move { reactor.run(receiver).await }));
        }

        info!(
            configurations = linked,
            protocols = self.protocols.len(),
            "Agent service started"
        );
        Ok(())
    }

    /// Stop the reactor and unlink every registered configuration
    pub async fn stop(&self) {
        {
            let mut running = self.running.write();
            if !*running {
                return;
            }
            *running = false;
        }

        let task = self.task.lock().take();
        if let Some(handle) = task {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Change reactor task failed");
                }
            }
        }
        self.engine.unlink_all().await;
        info!("Agent service stopped");
    }

    pub fn is_running(&self) -> bool {
        *self.running.read()
    }

    /// Route an attribute state event from the twin-update pipeline
    pub fn process_state_event(&self, event: &mut AttributeStateEvent) {
        self.router.process(event);
    }

    /// Feed persistence change notifications are published on
    pub fn change_feed(&self) -> &ChangeFeed {
        &self.changes
    }

    /// Channel protocol I/O subscribes to for outbound writes
    pub fn dispatch_channel(&self) -> &DispatchChannel {
        self.router.dispatch()
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        self.engine.registry()
    }

    pub fn protocols(&self) -> &Arc<ProtocolSet> {
        &self.protocols
    }

    pub fn engine(&self) -> &Arc<LinkingEngine> {
        &self.engine
    }

    pub fn reactor(&self) -> &Arc<ChangeReactor> {
        &self.reactor
    }
}
