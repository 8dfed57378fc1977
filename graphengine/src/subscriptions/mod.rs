//! Subscription registration and event delivery (§4.6, §3.5).

pub mod registry;

pub use registry::{SubscribeParams, SubscriptionCallback, SubscriptionKey, SubscriptionRegistry};
