//! Process-wide event bus
//!
//! Modules subscribe exactly once during registration and stay subscribed
//! for the process lifetime. Payloads cross the bus as serialized
//! [`EventData`] so handlers in different crates never need a shared
//! concrete type; typed handlers deserialize on delivery. Dispatch is
//! concurrent and a failing handler never prevents the others from
//! running.

use crate::error::EventError;
use crate::net::PlayerId;
use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, error};

/// Trait all bus events implement.
pub trait Event: Send + Sync + Debug + 'static {
    /// Event type name used for routing and payload checks.
    fn event_type() -> &'static str
    where
        Self: Sized;
}

/// Serialized event payload that can cross module boundaries safely.
#[derive(Debug, Clone)]
pub struct EventData {
    data: Arc<Vec<u8>>,
    type_name: String,
}

impl EventData {
    pub fn new<T: Event + Serialize>(event: &T) -> Result<Self, EventError> {
        let data = serde_json::to_vec(event)
            .map_err(|e| EventError::SerializationFailed(e.to_string()))?;
        Ok(Self {
            data: Arc::new(data),
            type_name: T::event_type().to_string(),
        })
    }

    pub fn deserialize<T: Event + for<'de> Deserialize<'de>>(&self) -> Result<T, EventError> {
        if self.type_name != T::event_type() {
            return Err(EventError::InvalidEventFormat(format!(
                "expected {}, got {}",
                T::event_type(),
                self.type_name
            )));
        }
        serde_json::from_slice(&self.data)
            .map_err(|e| EventError::DeserializationFailed(e.to_string()))
    }
}

/// Type-erased handler stored in the bus.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &EventData) -> Result<(), EventError>;
    fn handler_name(&self) -> &str;
}

struct TypedEventHandler<T, F>
where
    T: Event + for<'de> Deserialize<'de>,
    F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<fn(T)>,
}

#[async_trait]
impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event + for<'de> Deserialize<'de>,
    F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
{
    async fn handle(&self, event_data: &EventData) -> Result<(), EventError> {
        let event = event_data.deserialize::<T>()?;
        (self.handler)(event)
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Central event routing table.
pub struct EventBus {
    handlers: DashMap<String, SmallVec<[Arc<dyn EventHandler>; 2]>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    fn key(namespace: &str, event_name: &str) -> String {
        format!("{namespace}:{event_name}")
    }

    /// Register a typed handler for `namespace:event_name`.
    pub fn on<T, F>(&self, namespace: &str, event_name: &str, handler: F)
    where
        T: Event + for<'de> Deserialize<'de>,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let key = Self::key(namespace, event_name);
        let typed = TypedEventHandler {
            handler,
            name: format!("{key}::{}", T::event_type()),
            _phantom: std::marker::PhantomData,
        };
        self.handlers
            .entry(key.clone())
            .or_default()
            .push(Arc::new(typed));
        debug!("registered handler for {key}");
    }

    /// Emit an event to every handler registered for its key. Handlers run
    /// concurrently; failures are logged and do not stop the others.
    pub async fn emit<T>(&self, namespace: &str, event_name: &str, event: &T) -> Result<(), EventError>
    where
        T: Event + Serialize,
    {
        let key = Self::key(namespace, event_name);
        let event_data = Arc::new(EventData::new(event)?);

        let handlers = self.handlers.get(&key).map(|entry| entry.value().clone());
        let Some(handlers) = handlers else {
            return Ok(());
        };

        let mut futures = FuturesUnordered::new();
        for handler in handlers {
            let data = event_data.clone();
            futures.push(async move {
                if let Err(e) = handler.handle(&data).await {
                    error!("handler {} failed: {e}", handler.handler_name());
                }
            });
        }
        while futures.next().await.is_some() {}
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Core events
// ============================================================================

/// A client registered the settings channel and is ready for pushes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConnectedEvent {
    pub player: PlayerId,
}

impl Event for PlayerConnectedEvent {
    fn event_type() -> &'static str {
        "player_connected"
    }
}

/// A client disconnected; its cached views must be dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDisconnectedEvent {
    pub player: PlayerId,
}

impl Event for PlayerDisconnectedEvent {
    fn event_type() -> &'static str {
        "player_disconnected"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ping {
        seq: u32,
    }

    impl Event for Ping {
        fn event_type() -> &'static str {
            "ping"
        }
    }

    #[tokio::test]
    async fn delivers_to_all_registered_handlers() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = hits.clone();
            bus.on("core", "ping", move |event: Ping| {
                assert_eq!(event.seq, 7);
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        bus.emit("core", "ping", &Ping { seq: 7 }).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(bus.handler_count(), 3);
    }

    #[tokio::test]
    async fn emit_without_handlers_is_a_no_op() {
        let bus = EventBus::new();
        bus.emit("core", "ping", &Ping { seq: 1 }).await.unwrap();
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_others() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        bus.on("core", "ping", |_: Ping| {
            Err(EventError::HandlerFailed("boom".into()))
        });
        let hits2 = hits.clone();
        bus.on("core", "ping", move |_: Ping| {
            hits2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit("core", "ping", &Ping { seq: 2 }).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
