//! Attribute Update Router
//!
//! Forwards twin-originated attribute writes to the protocol bound to the
//! attribute. Northbound events are never sent back out.

use crate::error::ApiError;
use crate::events::{AttributeStateEvent, DispatchChannel};
use crate::registry::BindingRegistry;
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub struct AttributeRouter {
    registry: Arc<BindingRegistry>,
    dispatch: DispatchChannel,
}

impl AttributeRouter {
    pub fn new(registry: Arc<BindingRegistry>, dispatch: DispatchChannel) -> Self {
        Self { registry, dispatch }
    }

    pub fn dispatch(&self) -> &DispatchChannel {
        &self.dispatch
    }

    /// Route one state event, recording the outcome on the event
    pub fn process(&self, event: &mut AttributeStateEvent) {
        if event.is_northbound() {
            trace!(attribute = %event.reference(), "Ignoring northbound event");
            return;
        }

        let Some(target) = event.attribute.agent_link() else {
            return;
        };

        if self.registry.lookup(&target).is_none() {
            let attribute = event.reference();
            warn!(
                attribute = %attribute,
                configuration = %target,
                "Attribute has an invalid agent link"
            );
            event.set_error(ApiError::InvalidAgentLink { attribute });
            return;
        }

        match event.write_command() {
            Some(command) => {
                debug!(
                    attribute = %command.attribute,
                    configuration = %target,
                    "Sending to actuator topic"
                );
                self.dispatch.publish(command);
            }
            None => warn!(
                attribute = %event.reference(),
                "Attribute has no value timestamp, nothing to send"
            ),
        }
        event.set_handled();
    }
}
