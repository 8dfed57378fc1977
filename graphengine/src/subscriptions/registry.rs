//! The subscription registry (§4.6): `subscribe`/`unsubscribe`/`deliver`.
//!
//! Registrations are keyed by TAG (the subscription's root field name).
//! Delivery takes a read lock over a tag's subscriber list, clones out the
//! handles it needs, and releases the lock before invoking any callback
//! (§5's shared-resource policy), so a callback that itself subscribes or
//! unsubscribes cannot deadlock against the delivering call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use indexmap::IndexMap;

use crate::ast::{self, Document, OperationType};
use crate::error::{ExecutionError, RequestError, RequestResult};
use crate::resolve::request::{build_variables, collect_fragments, to_directive_set};
use crate::resolve::{DirectiveState, FragmentMap, Object, ResolveMode, Response};
use crate::value::Value;
use crate::value_visitor::{self, Variables};

/// An opaque handle returned by [`SubscriptionRegistry::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionKey(u64);

pub struct SubscribeParams<S> {
    pub state: Arc<S>,
    pub document: Document,
    pub operation_name: String,
    pub variables: HashMap<String, Value>,
}

pub type SubscriptionCallback = Arc<dyn Fn(Response) + Send + Sync>;

struct Registration<S> {
    key: SubscriptionKey,
    state: Arc<S>,
    field: ast::Field,
    fragments: FragmentMap,
    variables: Variables,
    operation_directives: crate::resolve::directives::DirectiveSet,
    arguments: IndexMap<String, Value>,
    callback: SubscriptionCallback,
}

/// `Registry::new`'s `default_root` is used whenever a `deliver*` call omits
/// an explicit event root object ("the subscription root originally
/// registered with the service", §4.6).
pub struct SubscriptionRegistry<S> {
    default_root: Object<S>,
    next_key: AtomicU64,
    by_tag: RwLock<HashMap<String, Vec<Registration<S>>>>,
    key_tags: RwLock<HashMap<SubscriptionKey, String>>,
}

impl<S> SubscriptionRegistry<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(default_root: Object<S>) -> Self {
        SubscriptionRegistry {
            default_root,
            next_key: AtomicU64::new(1),
            by_tag: RwLock::new(HashMap::new()),
            key_tags: RwLock::new(HashMap::new()),
        }
    }

    /// Validates that `params.operation_name` names a subscription operation
    /// with exactly one root field, records that field's name as the TAG,
    /// and stores its argument expressions as a literal map.
    pub fn subscribe(&self, params: SubscribeParams<S>, callback: SubscriptionCallback) -> RequestResult<SubscriptionKey> {
        let operation = select_subscription_operation(&params.document, &params.operation_name)?;
        let variables = build_variables(operation, &params.variables)?;

        let mut fields = operation.selection_set.iter().filter_map(|s| match s {
            ast::Selection::Field(field) => Some(field),
            _ => None,
        });
        let field = fields
            .next()
            .ok_or_else(|| RequestError::schema_exception("a subscription operation must select exactly one root field"))?;
        if fields.next().is_some() {
            return Err(RequestError::schema_exception("a subscription operation must select exactly one root field"));
        }

        let mut arguments = IndexMap::new();
        for arg in field.item.arguments.iter() {
            let value = value_visitor::visit_value(&arg.value.item, arg.value.span, &variables)
                .map_err(|err| RequestError::schema_exception(err.to_string()))?;
            arguments.insert(arg.name.item.clone(), value);
        }

        let key = SubscriptionKey(self.next_key.fetch_add(1, Ordering::Relaxed));
        let tag = field.item.name.item.clone();
        let registration = Registration {
            key,
            state: params.state,
            field: field.item.clone(),
            fragments: collect_fragments(&params.document),
            variables,
            operation_directives: to_directive_set(&operation.directives),
            arguments,
            callback,
        };

        self.by_tag.write().expect("subscription registry lock poisoned").entry(tag.clone()).or_default().push(registration);
        self.key_tags.write().expect("subscription registry lock poisoned").insert(key, tag);
        Ok(key)
    }

    pub fn unsubscribe(&self, key: SubscriptionKey) {
        let tag = self.key_tags.write().expect("subscription registry lock poisoned").remove(&key);
        if let Some(tag) = tag {
            if let Some(subscribers) = self.by_tag.write().expect("subscription registry lock poisoned").get_mut(&tag) {
                subscribers.retain(|r| r.key != key);
            }
        }
    }

    /// Pushes a default event to every subscription registered under `tag`.
    pub async fn deliver(&self, mode: ResolveMode, tag: &str, event_root: Option<&Object<S>>) {
        self.deliver_matching(mode, tag, event_root, |_| true).await
    }

    /// Delivers only to subscriptions whose recorded argument map equals
    /// `filter_arguments`.
    pub async fn deliver_filtered(&self, mode: ResolveMode, tag: &str, filter_arguments: &IndexMap<String, Value>, event_root: Option<&Object<S>>) {
        self.deliver_matching(mode, tag, event_root, |args| args == filter_arguments).await
    }

    /// Delivers to subscriptions whose recorded arguments return `true` from
    /// `fuzzy_filter` for every argument; a rejection on any argument
    /// suppresses delivery without invoking the resolver.
    pub async fn deliver_fuzzy(
        &self,
        mode: ResolveMode,
        tag: &str,
        fuzzy_filter: impl Fn(&str, &Value) -> bool,
        event_root: Option<&Object<S>>,
    ) {
        self.deliver_matching(mode, tag, event_root, |args| args.iter().all(|(name, value)| fuzzy_filter(name, value)))
            .await
    }

    async fn deliver_matching(
        &self,
        mode: ResolveMode,
        tag: &str,
        event_root: Option<&Object<S>>,
        matches: impl Fn(&IndexMap<String, Value>) -> bool,
    ) {
        let matching: Vec<_> = {
            let registrations = self.by_tag.read().expect("subscription registry lock poisoned");
            registrations
                .get(tag)
                .into_iter()
                .flatten()
                .filter(|r| matches(&r.arguments))
                .map(|r| (r.state.clone(), r.field.clone(), r.fragments.clone(), r.variables.clone(), r.operation_directives.clone(), r.callback.clone()))
                .collect()
        };

        let root = event_root.unwrap_or(&self.default_root);
        let deliveries = matching.into_iter().map(|(state, field, fragments, variables, operation_directives, callback)| {
            deliver_one(root, state, field, fragments, variables, operation_directives, mode, callback)
        });

        match mode {
            ResolveMode::Deferred => {
                for delivery in deliveries {
                    delivery.await;
                }
            }
            ResolveMode::Async => {
                join_all(deliveries).await;
            }
        }
    }
}

async fn deliver_one<S>(
    root: &Object<S>,
    state: Arc<S>,
    field: ast::Field,
    fragments: FragmentMap,
    variables: Variables,
    operation_directives: crate::resolve::directives::DirectiveSet,
    mode: ResolveMode,
    callback: SubscriptionCallback,
) where
    S: Send + Sync + 'static,
{
    let directive_state = DirectiveState { operation: operation_directives, ..Default::default() }.with_field(&field.directives);

    let mut errors: Vec<ExecutionError> = Vec::new();
    let value = match &field.selection_set {
        Some(selection_set) => {
            root.resolve(selection_set, &fragments, &variables, &directive_state, state.as_ref(), mode, &mut errors).await
        }
        // A leaf-field subscription has no child selection to resolve against
        // the event object; the engine has no way to serialize the event
        // value itself without a return-type handle at this layer.
        None => Value::Null,
    };

    let mut data = crate::value::Object::new();
    data.add_field(field.response_key(), value);
    callback(Response { data: Some(Value::Map(data)), errors });
}

fn select_subscription_operation<'a>(document: &'a Document, operation_name: &str) -> RequestResult<&'a ast::Operation> {
    let operation = crate::resolve::request::select_operation(document, operation_name)?;
    if operation.operation_type != OperationType::Subscription {
        return Err(RequestError::schema_exception("the named operation is not a subscription"));
    }
    Ok(operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::FieldContext;
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    fn task_object() -> Object<()> {
        Object::new("Task")
            .field(
                "id",
                Arc::new(|_ctx: FieldContext<'_, ()>| -> BoxFuture<'_, Result<Value, ExecutionError>> {
                    Box::pin(async move { Ok(Value::String("fakeTaskId".to_owned())) })
                }),
            )
            .field(
                "title",
                Arc::new(|_ctx: FieldContext<'_, ()>| -> BoxFuture<'_, Result<Value, ExecutionError>> {
                    Box::pin(async move { Ok(Value::String("Don't forget".to_owned())) })
                }),
            )
    }

    fn subscribe_to_node_change(registry: &SubscriptionRegistry<()>, id_literal: &str, log: Arc<Mutex<Vec<Response>>>) -> SubscriptionKey {
        let source = format!("subscription {{ changedNode: nodeChange(id: \"{id_literal}\") {{ changedId: id title }} }}");
        let document = crate::parser::parse_document_source(&source, 0).unwrap();
        let callback: SubscriptionCallback = Arc::new(move |response| log.lock().unwrap().push(response));
        registry
            .subscribe(
                SubscribeParams { state: Arc::new(()), document, operation_name: String::new(), variables: HashMap::new() },
                callback,
            )
            .unwrap()
    }

    #[tokio::test]
    async fn deliver_filtered_only_invokes_matching_subscriber() {
        let registry = SubscriptionRegistry::new(Object::new("Subscription"));
        let log = Arc::new(Mutex::new(Vec::new()));
        subscribe_to_node_change(&registry, "ZmFrZVRhc2tJZA==", log.clone());

        let mut mismatched = IndexMap::new();
        mismatched.insert("id".to_owned(), Value::String("ZmFrZUFwcG9pbnRtZW50SWQ=".to_owned()));
        registry.deliver_filtered(ResolveMode::Deferred, "nodeChange", &mismatched, Some(&task_object())).await;
        assert!(log.lock().unwrap().is_empty());

        let mut matched = IndexMap::new();
        matched.insert("id".to_owned(), Value::String("ZmFrZVRhc2tJZA==".to_owned()));
        registry.deliver_filtered(ResolveMode::Deferred, "nodeChange", &matched, Some(&task_object())).await;
        let delivered = log.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].errors.is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_prevents_further_delivery() {
        let registry = SubscriptionRegistry::new(Object::new("Subscription"));
        let log = Arc::new(Mutex::new(Vec::new()));
        let key = subscribe_to_node_change(&registry, "ZmFrZVRhc2tJZA==", log.clone());
        registry.unsubscribe(key);

        registry.deliver(ResolveMode::Deferred, "nodeChange", Some(&task_object())).await;
        assert!(log.lock().unwrap().is_empty());
    }
}
