//! Event dispatcher
//!
//! Routes decoded gateway frames to registered handlers.
//!
//! Every catalogue event has a route from construction, so frames decode even
//! when nobody listens (the Ready snapshot still reaches the cache). Handler
//! failures and panics are contained per handler and reported to that
//! handler's error callbacks first, then to the dispatcher-wide ones.

use std::any::{Any, TypeId};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chat_cache::{SharedState, StoreError};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Deserialize;

use super::Context;
use crate::error::{BoxError, HandlerError};
use crate::events::{
    AuthenticatedEvent, ChannelCreateEvent, ChannelDeleteEvent, ChannelStartTypingEvent,
    ChannelStopTypingEvent, ChannelUpdateEvent, DeleteAllSessionsEvent, DeleteSessionEvent,
    EmojiCreateEvent, EmojiDeleteEvent, ErrorEvent, GatewayEvent, GatewayEventType,
    MessageDeleteEvent, MessageEvent, MessageUpdateEvent, PongEvent, ReadyEvent,
    ServerDeleteEvent, ServerMemberJoinEvent, ServerMemberLeaveEvent, ServerMemberUpdateEvent,
    ServerUpdateEvent, UserUpdateEvent,
};
use crate::protocol::{CodecError, Frame};

type AnyEvent = Arc<dyn Any + Send + Sync>;
type DecodeFn = fn(&Frame) -> Result<AnyEvent, CodecError>;
type HandlerFn = dyn Fn(&Context, &(dyn Any + Send + Sync)) -> Result<(), BoxError> + Send + Sync;

/// Callback receiving handler failures
pub type ErrorCallback = Arc<dyn Fn(&Context, &HandlerError) + Send + Sync>;

/// Observer of every frame before routing
pub type RawSink = Arc<dyn Fn(&Frame) + Send + Sync>;

struct HandlerSlot {
    call: Box<HandlerFn>,
    on_error: RwLock<Vec<ErrorCallback>>,
}

struct Route {
    type_id: TypeId,
    decode: DecodeFn,
    handlers: Vec<Arc<HandlerSlot>>,
}

impl Route {
    fn new<E: GatewayEvent>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            decode: decode_as::<E>,
            handlers: Vec::new(),
        }
    }
}

fn decode_as<E: GatewayEvent>(frame: &Frame) -> Result<AnyEvent, CodecError> {
    Ok(Arc::new(frame.decode::<E>()?))
}

/// Handle to a registered handler, used to attach error callbacks
pub struct Registration {
    slot: Arc<HandlerSlot>,
}

impl Registration {
    /// Called when this handler fails or panics
    pub fn on_error<F>(self, callback: F) -> Self
    where
        F: Fn(&Context, &HandlerError) + Send + Sync + 'static,
    {
        self.slot.on_error.write().push(Arc::new(callback));
        self
    }
}

/// Discriminator-keyed dispatch table
pub struct EventDispatcher {
    routes: DashMap<String, Route>,
    raw_sinks: RwLock<Vec<RawSink>>,
    error_callbacks: RwLock<Vec<ErrorCallback>>,
    state: Option<Arc<SharedState>>,
}

impl EventDispatcher {
    /// Dispatcher with the built-in catalogue registered and no cache
    pub fn new() -> Self {
        let dispatcher = Self {
            routes: DashMap::new(),
            raw_sinks: RwLock::new(Vec::new()),
            error_callbacks: RwLock::new(Vec::new()),
            state: None,
        };
        dispatcher.register_catalogue();
        dispatcher
    }

    /// Seed `state` from Ready snapshots
    #[must_use]
    pub fn with_cache(mut self, state: Arc<SharedState>) -> Self {
        self.state = Some(state);
        self
    }

    #[inline]
    pub fn cache(&self) -> Option<&Arc<SharedState>> {
        self.state.as_ref()
    }

    fn register_catalogue(&self) {
        self.register::<AuthenticatedEvent>();
        self.register::<ReadyEvent>();
        self.register::<PongEvent>();
        self.register::<ErrorEvent>();
        self.register::<DeleteSessionEvent>();
        self.register::<DeleteAllSessionsEvent>();
        self.register::<MessageEvent>();
        self.register::<MessageUpdateEvent>();
        self.register::<MessageDeleteEvent>();
        self.register::<ChannelCreateEvent>();
        self.register::<ChannelUpdateEvent>();
        self.register::<ChannelDeleteEvent>();
        self.register::<ChannelStartTypingEvent>();
        self.register::<ChannelStopTypingEvent>();
        self.register::<ServerUpdateEvent>();
        self.register::<ServerDeleteEvent>();
        self.register::<ServerMemberJoinEvent>();
        self.register::<ServerMemberLeaveEvent>();
        self.register::<ServerMemberUpdateEvent>();
        self.register::<UserUpdateEvent>();
        self.register::<EmojiCreateEvent>();
        self.register::<EmojiDeleteEvent>();
    }

    // === Registration ===

    /// Add a decode route for `E`.
    ///
    /// Registering a different payload type under an existing discriminator
    /// replaces the route and drops its handlers.
    pub fn register<E: GatewayEvent>(&self) {
        let mut route = self
            .routes
            .entry(E::TYPE.to_string())
            .or_insert_with(Route::new::<E>);
        if route.type_id != TypeId::of::<E>() {
            tracing::warn!(event_type = E::TYPE, "Replacing event route with a new payload type");
            *route = Route::new::<E>();
        }
    }

    #[must_use]
    pub fn is_registered(&self, event_type: &str) -> bool {
        self.routes.contains_key(event_type)
    }

    #[must_use]
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.routes
            .get(event_type)
            .map_or(0, |route| route.handlers.len())
    }

    /// Register a handler for events of type `E`
    pub fn on<E, F>(&self, handler: F) -> Registration
    where
        E: GatewayEvent,
        F: Fn(&Context, &E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register::<E>();

        let slot = Arc::new(HandlerSlot {
            call: Box::new(move |ctx, event| match event.downcast_ref::<E>() {
                Some(event) => handler(ctx, event),
                None => Err(format!("payload is not a {} event", E::TYPE).into()),
            }),
            on_error: RwLock::new(Vec::new()),
        });

        if let Some(mut route) = self.routes.get_mut(E::TYPE) {
            route.handlers.push(Arc::clone(&slot));
        }

        Registration { slot }
    }

    /// Called for every handler failure, after the handler's own callbacks
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&Context, &HandlerError) + Send + Sync + 'static,
    {
        self.error_callbacks.write().push(Arc::new(callback));
    }

    /// Observe every inbound frame before routing
    pub fn on_raw<F>(&self, sink: F)
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.raw_sinks.write().push(Arc::new(sink));
    }

    // === Dispatch ===

    /// Feed one inbound frame through sinks, envelopes, handlers and the cache
    pub fn handle(&self, frame: &Frame) {
        let sinks = self.raw_sinks.read().clone();
        for sink in &sinks {
            if catch_unwind(AssertUnwindSafe(|| sink(frame))).is_err() {
                tracing::warn!(event_type = %frame.event_type(), "Raw sink panicked");
            }
        }

        self.route(frame);
    }

    fn route(&self, frame: &Frame) {
        match frame.event_type().parse::<GatewayEventType>() {
            Ok(GatewayEventType::Bulk) => self.dispatch_batch(frame),
            Ok(GatewayEventType::Auth) => self.dispatch_auth(frame),
            _ => {
                if let Some(event) = self.dispatch(frame) {
                    self.write_cache(frame.event_type(), event);
                }
            }
        }
    }

    fn dispatch_batch(&self, frame: &Frame) {
        let items = match frame.batch_items() {
            Ok(items) => items,
            Err(source) => {
                tracing::warn!(error = %source, "Malformed batch");
                self.report_decode_error(frame, source);
                return;
            }
        };

        tracing::trace!(items = items.len(), "Dispatching batch");
        for (index, item) in items.into_iter().enumerate() {
            match item {
                Some(item) => self.route(&item),
                None => tracing::warn!(index, "Batch item without a type, skipped"),
            }
        }
    }

    fn dispatch_auth(&self, frame: &Frame) {
        #[derive(Deserialize)]
        struct AuthEnvelope {
            event_type: String,
        }

        let envelope: AuthEnvelope = match frame.decode() {
            Ok(envelope) => envelope,
            Err(source) => {
                tracing::warn!(error = %source, "Malformed auth event");
                self.report_decode_error(frame, source);
                return;
            }
        };

        if matches!(
            envelope.event_type.parse::<GatewayEventType>(),
            Ok(kind) if kind.is_envelope()
        ) {
            tracing::warn!(event_type = %envelope.event_type, "Nested envelope in auth event, dropped");
            return;
        }

        self.dispatch(&frame.retyped(envelope.event_type));
    }

    /// Decode and invoke handlers; returns the decoded event
    fn dispatch(&self, frame: &Frame) -> Option<AnyEvent> {
        let (decode, handlers) = match self.routes.get(frame.event_type()) {
            Some(route) => (route.decode, route.handlers.clone()),
            None => {
                tracing::debug!(event_type = %frame.event_type(), "Unknown event type, dropped");
                return None;
            }
        };

        let event = match decode(frame) {
            Ok(event) => event,
            Err(source) => {
                tracing::warn!(event_type = %frame.event_type(), error = %source, "Failed to decode event");
                self.report_decode_error(frame, source);
                return None;
            }
        };

        tracing::trace!(event_type = %frame.event_type(), handlers = handlers.len(), "Dispatching event");

        let ctx = Context::new(frame.clone());
        for slot in &handlers {
            let outcome = catch_unwind(AssertUnwindSafe(|| (slot.call)(&ctx, event.as_ref())));
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => HandlerError::Failed(e),
                Err(panic) => HandlerError::Panicked(panic_message(panic.as_ref())),
            };

            tracing::warn!(event_type = %frame.event_type(), error = %error, "Event handler failed");
            let own = slot.on_error.read().clone();
            self.report(&ctx, &own, &error);
            let shared = self.error_callbacks.read().clone();
            self.report(&ctx, &shared, &error);
        }

        Some(event)
    }

    fn report_decode_error(&self, frame: &Frame, source: CodecError) {
        let ctx = Context::new(frame.clone());
        let error = HandlerError::Decode {
            event_type: frame.event_type().to_string(),
            source,
        };
        let shared = self.error_callbacks.read().clone();
        self.report(&ctx, &shared, &error);
    }

    fn report(&self, ctx: &Context, callbacks: &[ErrorCallback], error: &HandlerError) {
        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(ctx, error))).is_err() {
                tracing::error!(event_type = %ctx.event_type(), "Error callback panicked");
            }
        }
    }

    // === Cache ===

    fn write_cache(&self, event_type: &str, event: AnyEvent) {
        if event_type != ReadyEvent::TYPE {
            return;
        }
        let Some(state) = self.state.clone() else {
            return;
        };
        let Ok(ready) = Arc::downcast::<ReadyEvent>(event) else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { seed_from_ready(&state, &ready) });
            }
            Err(_) => seed_from_ready(&state, &ready),
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("routes", &self.routes.len())
            .field("raw_sinks", &self.raw_sinks.read().len())
            .field("cache", &self.state.is_some())
            .finish()
    }
}

/// Copy a Ready snapshot into every store
fn seed_from_ready(state: &SharedState, ready: &ReadyEvent) {
    let mut failed = 0usize;
    let mut note = |result: Result<(), StoreError>| match result {
        Ok(()) | Err(StoreError::Disabled) => {}
        Err(e) => {
            failed += 1;
            tracing::debug!(error = %e, "Skipped cache entry");
        }
    };

    for user in &ready.users {
        note(state.add_user(user.clone()));
    }
    for server in &ready.servers {
        note(state.add_server(server.clone()));
    }
    for channel in &ready.channels {
        note(state.add_channel(channel.clone()));
    }
    for member in &ready.members {
        note(state.add_member(member.clone()));
    }
    for emoji in &ready.emojis {
        note(state.add_emoji(emoji.clone()));
    }

    tracing::debug!(entities = ready.len(), failed, "Cache seeded from Ready");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_common::WireEncoding;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn frame(value: &serde_json::Value) -> Frame {
        let event_type = value["type"].as_str().unwrap_or_default().to_string();
        Frame::new(serde_json::to_vec(value).unwrap(), WireEncoding::Json, event_type)
    }

    fn message(content: &str) -> serde_json::Value {
        json!({"type": "Message", "_id": "m1", "channel": "c1", "author": "u1", "content": content})
    }

    #[test]
    fn test_catalogue_is_registered() {
        let dispatcher = EventDispatcher::new();
        assert!(dispatcher.is_registered("Ready"));
        assert!(dispatcher.is_registered("ServerMemberUpdate"));
        assert!(!dispatcher.is_registered("Bulk"));
        assert_eq!(dispatcher.handler_count("Message"), 0);
    }

    #[test]
    fn test_handler_receives_typed_event() {
        let dispatcher = EventDispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        dispatcher.on::<MessageEvent, _>(move |ctx, event| {
            assert_eq!(ctx.event_type(), "Message");
            sink.lock().push(event.0.content.clone());
            Ok(())
        });

        dispatcher.handle(&frame(&message("hello")));
        assert_eq!(*seen.lock(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_batch_dispatches_in_order() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        dispatcher.on::<ChannelStartTypingEvent, _>(move |_, e| {
            o.lock().push(format!("typing:{}", e.user));
            Ok(())
        });
        let o = Arc::clone(&order);
        dispatcher.on::<MessageDeleteEvent, _>(move |_, e| {
            o.lock().push(format!("delete:{}", e.id));
            Ok(())
        });

        dispatcher.handle(&frame(&json!({
            "type": "Bulk",
            "v": [
                {"type": "ChannelStartTyping", "id": "c1", "user": "u1"},
                {"content": "no type"},
                {"type": "MessageDelete", "id": "m9", "channel": "c1"}
            ]
        })));

        assert_eq!(
            *order.lock(),
            vec!["typing:u1".to_string(), "delete:m9".to_string()]
        );
    }

    #[test]
    fn test_auth_routes_to_inner_type_only() {
        let dispatcher = EventDispatcher::new();
        let deleted = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&deleted);
        dispatcher.on::<DeleteSessionEvent, _>(move |_, e| {
            assert_eq!(e.session_id, "sess1");
            d.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        dispatcher.handle(&frame(&json!({
            "type": "Auth",
            "event_type": "DeleteSession",
            "user_id": "u1",
            "session_id": "sess1"
        })));

        assert_eq!(deleted.load(Ordering::SeqCst), 1);
        assert!(!dispatcher.is_registered("Auth"));
    }

    #[test]
    fn test_failing_handler_does_not_block_siblings() {
        let dispatcher = EventDispatcher::new();
        let own_errors = Arc::new(AtomicUsize::new(0));
        let shared_errors = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let own = Arc::clone(&own_errors);
        dispatcher
            .on::<MessageEvent, _>(|_, _| Err("handler refused".into()))
            .on_error(move |_, err| {
                assert!(matches!(err, HandlerError::Failed(_)));
                own.fetch_add(1, Ordering::SeqCst);
            });
        dispatcher.on::<MessageEvent, _>(|_, _| panic!("boom"));
        let c = Arc::clone(&calls);
        dispatcher.on::<MessageEvent, _>(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let shared = Arc::clone(&shared_errors);
        dispatcher.on_error(move |_, _| {
            shared.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.handle(&frame(&message("one")));
        dispatcher.handle(&frame(&message("two")));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(own_errors.load(Ordering::SeqCst), 2);
        // Both failing handlers report to the shared callbacks on each frame
        assert_eq!(shared_errors.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_panic_message_is_reported() {
        let dispatcher = EventDispatcher::new();
        let message_seen = Arc::new(Mutex::new(String::new()));
        let m = Arc::clone(&message_seen);
        dispatcher
            .on::<PongEvent, _>(|_, _| panic!("pong handler exploded"))
            .on_error(move |_, err| {
                if let HandlerError::Panicked(msg) = err {
                    m.lock().clone_from(msg);
                }
            });

        dispatcher.handle(&frame(&json!({"type": "Pong", "data": 1})));
        assert_eq!(*message_seen.lock(), "pong handler exploded");
    }

    #[test]
    fn test_raw_sinks_see_every_frame() {
        let dispatcher = EventDispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        dispatcher.on_raw(move |frame| s.lock().push(frame.event_type().to_string()));

        dispatcher.handle(&frame(&json!({"type": "LabelMe"})));
        dispatcher.handle(&frame(&json!({"type": "ServerDelete", "id": "s1"})));

        assert_eq!(
            *seen.lock(),
            vec!["LabelMe".to_string(), "ServerDelete".to_string()]
        );
    }

    #[test]
    fn test_decode_failure_reaches_shared_callbacks() {
        let dispatcher = EventDispatcher::new();
        let errors = Arc::new(AtomicUsize::new(0));
        let e = Arc::clone(&errors);
        dispatcher.on_error(move |ctx, err| {
            assert_eq!(ctx.event_type(), "ServerDelete");
            assert!(matches!(err, HandlerError::Decode { .. }));
            e.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.handle(&frame(&json!({"type": "ServerDelete"})));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_event_type() {
        #[derive(Deserialize)]
        struct LabelMe {
            label: String,
        }
        impl GatewayEvent for LabelMe {
            const TYPE: &'static str = "LabelMe";
        }

        let dispatcher = EventDispatcher::new();
        let seen = Arc::new(Mutex::new(String::new()));
        let s = Arc::clone(&seen);
        dispatcher.on::<LabelMe, _>(move |_, e| {
            s.lock().clone_from(&e.label);
            Ok(())
        });

        dispatcher.handle(&frame(&json!({"type": "LabelMe", "label": "x"})));
        assert_eq!(*seen.lock(), "x");
    }

    #[test]
    fn test_ready_seeds_cache_without_runtime() {
        let state = Arc::new(SharedState::new());
        let dispatcher = EventDispatcher::new().with_cache(Arc::clone(&state));

        dispatcher.handle(&frame(&json!({
            "type": "Ready",
            "users": [{"_id": "u1", "username": "alice"}],
            "servers": [{"_id": "s1", "owner": "u1", "name": "Home"}],
            "channels": [],
            "members": [{"_id": {"server": "s1", "user": "u1"}, "joined_at": 1_700_000_000_000_i64}],
            "emojis": [{"_id": "e1", "parent": {"type": "Server", "id": "s1"}, "creator_id": "u1", "name": "wave"}]
        })));

        assert_eq!(state.get_user("u1").unwrap().username, "alice");
        assert!(state.get_server("s1").is_ok());
        assert!(state.get_member("s1", "u1").is_ok());
        assert!(state.get_emoji("e1").is_ok());
    }

    #[tokio::test]
    async fn test_ready_seeds_cache_in_background() {
        let state = Arc::new(SharedState::new());
        let dispatcher = EventDispatcher::new().with_cache(Arc::clone(&state));

        dispatcher.handle(&frame(&json!({
            "type": "Ready",
            "users": [{"_id": "u1", "username": "alice"}, {"_id": "u2", "username": "bob"}],
            "servers": []
        })));

        for _ in 0..50 {
            if state.users().len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(state.get_user("u2").is_ok());
    }

    #[test]
    fn test_binary_frames_dispatch() {
        let dispatcher = EventDispatcher::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        dispatcher.on::<ChannelDeleteEvent, _>(move |ctx, e| {
            assert_eq!(ctx.encoding(), WireEncoding::Binary);
            assert_eq!(e.id, "c1");
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let raw = rmp_serde::to_vec_named(&json!({"type": "ChannelDelete", "id": "c1"})).unwrap();
        dispatcher.handle(&Frame::new(raw, WireEncoding::Binary, "ChannelDelete"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
