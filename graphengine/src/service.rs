//! The top-level facade (§6.2): a `Service<S>` owns the root `Object<S>`
//! for each operation type it supports plus, when a subscription root is
//! registered, the [`SubscriptionRegistry`] that tracks live subscribers.
//! Everything here composes the `resolve` and `subscriptions` modules; it
//! adds no execution logic of its own.

use std::collections::HashMap;

use crate::ast::Document;
use crate::error::{RequestError, RequestResult};
use crate::resolve::{resolve, Object, OperationRoots, ResolveMode, Response};
use crate::subscriptions::{SubscribeParams, SubscriptionCallback, SubscriptionKey, SubscriptionRegistry};
use crate::value::Value;
use indexmap::IndexMap;

/// The root objects a service registers, one per operation type it
/// supports (§6.2's `operations_map`). A service need not support all
/// three; `resolve` against an unregistered operation type fails with
/// [`RequestError::UnsupportedOperation`].
#[derive(Default)]
pub struct Operations<S> {
    pub query: Option<Object<S>>,
    pub mutation: Option<Object<S>>,
    pub subscription: Option<Object<S>>,
}

pub struct Service<S> {
    operations: Operations<S>,
    subscriptions: Option<SubscriptionRegistry<S>>,
}

impl<S> Service<S>
where
    S: Send + Sync + 'static,
{
    /// Builds a service from its operation roots. When a subscription root
    /// is present it also becomes the subscription registry's default
    /// event root (the object `deliver` falls back to when a call omits an
    /// explicit one).
    pub fn new(operations: Operations<S>) -> Self {
        let subscriptions = operations.subscription.clone().map(SubscriptionRegistry::new);
        Service { operations, subscriptions }
    }

    /// Runs `resolve()`'s pipeline (§4.5) against whichever root matches
    /// the document's selected operation type. `mode` selects whether
    /// sibling fields resolve concurrently (§5).
    pub async fn resolve(
        &self,
        mode: ResolveMode,
        state: &S,
        document: &Document,
        operation_name: &str,
        variables: HashMap<String, Value>,
    ) -> RequestResult<Response> {
        let roots = OperationRoots {
            query: self.operations.query.as_ref(),
            mutation: self.operations.mutation.as_ref(),
            subscription: self.operations.subscription.as_ref(),
        };
        resolve(&roots, state, document, operation_name, variables, mode).await
    }

    /// Registers a new subscription (§4.6). Fails if the service was built
    /// without a subscription root.
    pub fn subscribe(&self, params: SubscribeParams<S>, callback: SubscriptionCallback) -> RequestResult<SubscriptionKey> {
        self.registry()?.subscribe(params, callback)
    }

    /// Removes a subscription registered by [`Service::subscribe`]. A
    /// service with no subscription root has nothing to unsubscribe from,
    /// so this is a no-op rather than an error.
    pub fn unsubscribe(&self, key: SubscriptionKey) {
        if let Some(registry) = &self.subscriptions {
            registry.unsubscribe(key);
        }
    }

    /// Delivers an event to every subscription registered under `tag`. A
    /// service with no subscription root has no subscribers, so this is a
    /// no-op rather than an error.
    pub async fn deliver(&self, mode: ResolveMode, tag: &str, event_root: Option<&Object<S>>) {
        if let Some(registry) = &self.subscriptions {
            registry.deliver(mode, tag, event_root).await;
        }
    }

    /// Delivers only to subscriptions whose recorded arguments equal
    /// `filter_arguments` exactly.
    pub async fn deliver_filtered(
        &self,
        mode: ResolveMode,
        tag: &str,
        filter_arguments: &IndexMap<String, Value>,
        event_root: Option<&Object<S>>,
    ) {
        if let Some(registry) = &self.subscriptions {
            registry.deliver_filtered(mode, tag, filter_arguments, event_root).await;
        }
    }

    /// Delivers to subscriptions whose recorded arguments all satisfy
    /// `fuzzy_filter`.
    pub async fn deliver_fuzzy(
        &self,
        mode: ResolveMode,
        tag: &str,
        fuzzy_filter: impl Fn(&str, &Value) -> bool,
        event_root: Option<&Object<S>>,
    ) {
        if let Some(registry) = &self.subscriptions {
            registry.deliver_fuzzy(mode, tag, fuzzy_filter, event_root).await;
        }
    }

    fn registry(&self) -> RequestResult<&SubscriptionRegistry<S>> {
        self.subscriptions
            .as_ref()
            .ok_or_else(|| RequestError::schema_exception("this service was not registered with a subscription root"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{FieldContext, FieldResolverFn};
    use crate::value::Value;
    use futures::future::BoxFuture;
    use std::sync::Arc;

    fn hello_query() -> Object<()> {
        let resolver: FieldResolverFn<()> = Arc::new(|_ctx: FieldContext<'_, ()>| -> BoxFuture<'_, Result<Value, crate::error::ExecutionError>> {
            Box::pin(async move { Ok(Value::String("world".to_owned())) })
        });
        Object::new("Query").field("hello", resolver)
    }

    #[tokio::test]
    async fn resolves_against_the_registered_query_root() {
        let service = Service::new(Operations { query: Some(hello_query()), mutation: None, subscription: None });
        let document = crate::parser::parse_document_source("{ hello }", 0).unwrap();
        let response = service.resolve(ResolveMode::Deferred, &(), &document, "", HashMap::new()).await.unwrap();
        assert!(response.errors.is_empty());
        let crate::value::Value::Map(data) = response.data.unwrap() else { panic!("expected a map") };
        assert_eq!(data.get_field_value("hello"), Some(&Value::String("world".to_owned())));
    }

    #[tokio::test]
    async fn rejects_a_mutation_when_no_mutation_root_is_registered() {
        let service = Service::new(Operations { query: Some(hello_query()), mutation: None, subscription: None });
        let document = crate::parser::parse_document_source("mutation { hello }", 0).unwrap();
        let err = service.resolve(ResolveMode::Deferred, &(), &document, "", HashMap::new()).await.unwrap_err();
        assert!(matches!(err, RequestError::UnsupportedOperation { .. }));
    }

    #[test]
    fn subscribe_without_a_subscription_root_fails() {
        let service = Service::new(Operations { query: Some(hello_query()), mutation: None, subscription: None });
        let document = crate::parser::parse_document_source("subscription { hello }", 0).unwrap();
        let err = service
            .subscribe(
                SubscribeParams { state: Arc::new(()), document, operation_name: String::new(), variables: HashMap::new() },
                Arc::new(|_| {}),
            )
            .unwrap_err();
        assert!(matches!(err, RequestError::SchemaException { .. }));
    }
}
