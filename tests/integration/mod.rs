//! Integration tests for agent linking and attribute routing

mod linking_scenarios;
mod reactor_feed;
mod routing_scenarios;
mod service_lifecycle;
mod support;
