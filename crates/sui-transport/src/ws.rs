//! WebSocket subscription client.
//!
//! One socket, one tracked subscription. The socket is owned by a single
//! spawned I/O task; the [`SubscriptionClient`] handle talks to it over an mpsc
//! channel and observes its [`ConnectionState`] through a watch channel, so the
//! subscription id and the reconnect counter live in exactly one task.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Subscribed
//!                                   ^            |
//!                                   +-- drop, backoff, resubscribe
//! any state -> Closed (close(), cancellation, or reconnect attempts exhausted)
//! ```
//!
//! Only notifications whose `params.subscription` equals the tracked id reach
//! the event channel. Subscribing again replaces the tracked id; the previous
//! server-side subscription is left running and its notifications are dropped.
//! `unsubscribe` is best-effort: the request is sent and tracking cleared
//! without waiting for the server's acknowledgment.

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::backoff::ReconnectPolicy;
use crate::jsonrpc::{decode_response, JsonRpcRequest, RpcError, SuiRequest};
use sui_steps_types::env_utils::env_var_or;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WS_METHOD: &str = "websocket";

/// Lifecycle of the subscription socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Subscribed,
    Closed,
}

/// Which stream a subscription follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    Event,
    Transaction,
}

impl SubscriptionKind {
    fn subscribe_request(&self, filter: Value) -> SuiRequest {
        match self {
            SubscriptionKind::Event => SuiRequest::SubscribeEvent { filter },
            SubscriptionKind::Transaction => SuiRequest::SubscribeTransaction { filter },
        }
    }

    fn unsubscribe_request(&self, subscription: Value) -> SuiRequest {
        match self {
            SubscriptionKind::Event => SuiRequest::UnsubscribeEvent { subscription },
            SubscriptionKind::Transaction => SuiRequest::UnsubscribeTransaction { subscription },
        }
    }

    pub fn subscribe_method(&self) -> &'static str {
        self.subscribe_request(Value::Null).method()
    }
}

/// Delivered on the event channel returned by [`SubscriptionClient::connect`].
#[derive(Debug, Clone)]
pub enum SubscriptionEvent {
    /// A notification for the tracked subscription.
    Notification { subscription: Value, result: Value },
    /// The socket dropped; reconnect attempt `attempt` (1-based) starts after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnect attempt `attempt` succeeded; the tracked filter is being re-sent.
    Reconnected { attempt: u32 },
    /// Terminal: reconnect attempts are exhausted. No further events follow.
    Failed(RpcError),
}

/// Connection settings for a subscription client.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub subscribe_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl SubscriptionConfig {
    const DEFAULT_SUBSCRIBE_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            connect_timeout: Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
            subscribe_timeout: Duration::from_secs(Self::DEFAULT_SUBSCRIBE_TIMEOUT_SECS),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Settings with timeouts and reconnect policy taken from the environment.
    pub fn from_env(url: &str) -> Self {
        Self {
            url: url.to_string(),
            connect_timeout: Duration::from_secs(env_var_or(
                "SUI_STEPS_CONNECT_TIMEOUT_SECS",
                Self::DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
            subscribe_timeout: Duration::from_secs(env_var_or(
                "SUI_STEPS_SUBSCRIBE_TIMEOUT_SECS",
                Self::DEFAULT_SUBSCRIBE_TIMEOUT_SECS,
            )),
            reconnect: ReconnectPolicy::from_env(),
        }
    }

    pub fn with_subscribe_timeout(mut self, timeout: Duration) -> Self {
        self.subscribe_timeout = timeout;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

enum Command {
    Subscribe {
        kind: SubscriptionKind,
        filter: Value,
        reply: oneshot::Sender<Result<Value, RpcError>>,
    },
    Unsubscribe,
    /// Forget subscribe requests whose caller stopped waiting.
    Sweep,
}

/// Handle to a live subscription socket.
pub struct SubscriptionClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    subscribe_timeout: Duration,
}

impl SubscriptionClient {
    /// Open the socket. Resolves once it is open; fails if it cannot be opened.
    pub async fn connect(
        config: SubscriptionConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SubscriptionEvent>), RpcError> {
        Self::connect_with_cancel(config, CancellationToken::new()).await
    }

    /// Like [`connect`](Self::connect); cancelling `cancel` behaves like [`close`](Self::close).
    pub async fn connect_with_cancel(
        config: SubscriptionConfig,
        cancel: CancellationToken,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SubscriptionEvent>), RpcError> {
        let cancel = cancel.child_token();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let socket = match open(&config.url, config.connect_timeout).await {
            Ok(socket) => socket,
            Err(e) => {
                state_tx.send_replace(ConnectionState::Closed);
                return Err(e);
            }
        };
        state_tx.send_replace(ConnectionState::Connected);
        info!(url = %config.url, "subscription socket open");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = IoTask {
            url: config.url.clone(),
            connect_timeout: config.connect_timeout,
            policy: config.reconnect,
            commands: command_rx,
            events: event_tx,
            state: state_tx,
            cancel: cancel.clone(),
            next_id: 1,
            pending: HashMap::new(),
            tracked: None,
        };
        tokio::spawn(task.run(socket));

        Ok((
            Self {
                commands: command_tx,
                state: state_rx,
                cancel,
                subscribe_timeout: config.subscribe_timeout,
            },
            event_rx,
        ))
    }

    /// Subscribe to events matching `filter`; returns the subscription id.
    pub async fn subscribe_event(&self, filter: Value) -> Result<Value, RpcError> {
        self.subscribe(SubscriptionKind::Event, filter).await
    }

    /// Subscribe to transactions matching `filter`; returns the subscription id.
    pub async fn subscribe_transaction(&self, filter: Value) -> Result<Value, RpcError> {
        self.subscribe(SubscriptionKind::Transaction, filter).await
    }

    async fn subscribe(&self, kind: SubscriptionKind, filter: Value) -> Result<Value, RpcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Subscribe {
                kind,
                filter,
                reply: reply_tx,
            })
            .map_err(|_| RpcError::Closed)?;

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(RpcError::Closed),
            reply = tokio::time::timeout(self.subscribe_timeout, reply_rx) => match reply {
                Err(_) => Err(RpcError::Timeout {
                    method: kind.subscribe_method().to_string(),
                    after: self.subscribe_timeout,
                }),
                Ok(Err(_)) => Err(RpcError::Closed),
                Ok(Ok(outcome)) => outcome,
            },
        };
        // The reply receiver is gone by now, so the task can drop the request.
        if matches!(outcome, Err(RpcError::Timeout { .. })) {
            let _ = self.commands.send(Command::Sweep);
        }
        outcome
    }

    /// Send the unsubscribe request for the tracked subscription and forget it.
    ///
    /// Best-effort: the server's acknowledgment is not awaited or checked.
    pub fn unsubscribe(&self) {
        let _ = self.commands.send(Command::Unsubscribe);
    }

    /// Close the socket. No reconnects or error events follow.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Wait until the I/O task has finished.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == ConnectionState::Closed).await;
    }
}

impl Drop for SubscriptionClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn open(url: &str, connect_timeout: Duration) -> Result<Socket, RpcError> {
    match tokio::time::timeout(connect_timeout, connect_async(url)).await {
        Err(_) => Err(RpcError::Timeout {
            method: WS_METHOD.to_string(),
            after: connect_timeout,
        }),
        Ok(Err(e)) => Err(RpcError::transport(WS_METHOD, e)),
        Ok(Ok((socket, _response))) => Ok(socket),
    }
}

async fn send_request(socket: &mut Socket, id: u64, request: &SuiRequest) -> Result<(), String> {
    let envelope = JsonRpcRequest::new(id, request.method(), request.params());
    let text = serde_json::to_string(&envelope).map_err(|e| e.to_string())?;
    socket
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| e.to_string())
}

struct Pending {
    kind: SubscriptionKind,
    filter: Value,
    /// `None` for resubscriptions issued by the task itself.
    reply: Option<oneshot::Sender<Result<Value, RpcError>>>,
}

/// Remove entries whose caller dropped its reply receiver; returns how many.
/// Resubscriptions have no caller and wait for their ack.
fn sweep_abandoned(pending: &mut HashMap<u64, Pending>) -> usize {
    let before = pending.len();
    pending.retain(|_, p| !p.reply.as_ref().is_some_and(|r| r.is_closed()));
    before - pending.len()
}

struct Tracked {
    kind: SubscriptionKind,
    filter: Value,
    subscription: Value,
}

enum Exit {
    Shutdown,
    Dropped(String),
}

enum Reconnect {
    Connected(Socket),
    Cancelled,
    Exhausted(RpcError),
}

struct IoTask {
    url: String,
    connect_timeout: Duration,
    policy: ReconnectPolicy,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SubscriptionEvent>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    next_id: u64,
    pending: HashMap<u64, Pending>,
    tracked: Option<Tracked>,
}

impl IoTask {
    async fn run(mut self, mut socket: Socket) {
        loop {
            match self.drive(&mut socket).await {
                Exit::Shutdown => {
                    let _ = socket.close(None).await;
                    break;
                }
                Exit::Dropped(reason) => {
                    warn!(url = %self.url, %reason, "subscription socket dropped");
                    self.fail_pending(&reason);
                    self.set_state(ConnectionState::Disconnected);
                    match self.reconnect().await {
                        Reconnect::Connected(new_socket) => {
                            socket = new_socket;
                            if let Err(e) = self.resubscribe(&mut socket).await {
                                debug!(error = %e, "resubscribe send failed");
                            }
                        }
                        Reconnect::Cancelled => break,
                        Reconnect::Exhausted(err) => {
                            warn!(url = %self.url, error = %err, "giving up on subscription socket");
                            let _ = self.events.send(SubscriptionEvent::Failed(err));
                            break;
                        }
                    }
                }
            }
        }
        self.tracked = None;
        self.pending.clear();
        self.set_state(ConnectionState::Closed);
    }

    async fn drive(&mut self, socket: &mut Socket) -> Exit {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Exit::Shutdown,
                command = self.commands.recv() => match command {
                    None => return Exit::Shutdown,
                    Some(command) => {
                        if let Err(e) = self.handle_command(socket, command).await {
                            return Exit::Dropped(e);
                        }
                    }
                },
                message = socket.next() => match message {
                    Some(Ok(Message::Text(text))) => self.handle_text(&text),
                    Some(Ok(Message::Close(_))) | None => {
                        return Exit::Dropped("closed by peer".to_string())
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Exit::Dropped(e.to_string()),
                },
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    async fn handle_command(&mut self, socket: &mut Socket, command: Command) -> Result<(), String> {
        match command {
            Command::Subscribe {
                kind,
                filter,
                reply,
            } => {
                self.sweep();
                let id = self.take_id();
                let request = kind.subscribe_request(filter.clone());
                debug!(id, method = request.method(), "subscribing");
                self.pending.insert(
                    id,
                    Pending {
                        kind,
                        filter,
                        reply: Some(reply),
                    },
                );
                send_request(socket, id, &request).await
            }
            Command::Unsubscribe => {
                let Some(tracked) = self.tracked.take() else {
                    return Ok(());
                };
                let id = self.take_id();
                let request = tracked.kind.unsubscribe_request(tracked.subscription);
                self.set_state(ConnectionState::Connected);
                send_request(socket, id, &request).await
            }
            Command::Sweep => {
                self.sweep();
                Ok(())
            }
        }
    }

    fn sweep(&mut self) {
        let swept = sweep_abandoned(&mut self.pending);
        if swept > 0 {
            debug!(swept, "dropped abandoned subscribe requests");
        }
    }

    fn handle_text(&mut self, text: &str) {
        let Ok(message) = serde_json::from_str::<Value>(text) else {
            trace!("dropping non-JSON frame");
            return;
        };

        if let Some(id) = message.get("id").and_then(Value::as_u64) {
            if let Some(pending) = self.pending.remove(&id) {
                self.resolve(pending, message);
            }
            return;
        }

        let Some(params) = message.get("params") else {
            return;
        };
        let subscription = params.get("subscription");
        match (&self.tracked, subscription) {
            (Some(tracked), Some(subscription)) if *subscription == tracked.subscription => {
                let _ = self.events.send(SubscriptionEvent::Notification {
                    subscription: subscription.clone(),
                    result: params.get("result").cloned().unwrap_or(Value::Null),
                });
            }
            _ => trace!(?subscription, "dropping notification for untracked subscription"),
        }
    }

    fn resolve(&mut self, pending: Pending, response: Value) {
        let method = pending.kind.subscribe_method();
        match decode_response(method, response) {
            Ok(subscription) => {
                let caller_gone = pending.reply.as_ref().is_some_and(|r| r.is_closed());
                if !caller_gone {
                    info!(%subscription, method, "subscribed");
                    self.tracked = Some(Tracked {
                        kind: pending.kind,
                        filter: pending.filter,
                        subscription: subscription.clone(),
                    });
                    self.set_state(ConnectionState::Subscribed);
                }
                if let Some(reply) = pending.reply {
                    let _ = reply.send(Ok(subscription));
                }
            }
            Err(e) => {
                warn!(error = %e, "subscribe rejected");
                if let Some(reply) = pending.reply {
                    let _ = reply.send(Err(e));
                }
            }
        }
    }

    fn fail_pending(&mut self, reason: &str) {
        for (_, pending) in self.pending.drain() {
            if let Some(reply) = pending.reply {
                let _ = reply.send(Err(RpcError::transport(
                    pending.kind.subscribe_method(),
                    format!("connection lost: {reason}"),
                )));
            }
        }
    }

    async fn reconnect(&mut self) -> Reconnect {
        let mut attempt = 0u32;
        let mut last_error = String::from("connection lost");

        while let Some(delay) = self.policy.delay(attempt) {
            if self.cancel.is_cancelled() {
                return Reconnect::Cancelled;
            }
            let _ = self.events.send(SubscriptionEvent::Reconnecting {
                attempt: attempt + 1,
                delay,
            });
            info!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "reconnecting");

            tokio::select! {
                _ = self.cancel.cancelled() => return Reconnect::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }

            self.set_state(ConnectionState::Connecting);
            let opened = tokio::select! {
                _ = self.cancel.cancelled() => return Reconnect::Cancelled,
                opened = open(&self.url, self.connect_timeout) => opened,
            };
            match opened {
                Ok(socket) => {
                    self.set_state(ConnectionState::Connected);
                    let _ = self.events.send(SubscriptionEvent::Reconnected {
                        attempt: attempt + 1,
                    });
                    return Reconnect::Connected(socket);
                }
                Err(e) => {
                    debug!(attempt = attempt + 1, error = %e, "reconnect attempt failed");
                    last_error = e.to_string();
                    self.set_state(ConnectionState::Disconnected);
                }
            }
            attempt += 1;
        }

        Reconnect::Exhausted(RpcError::transport(
            WS_METHOD,
            format!(
                "reconnect failed after {} attempts: {last_error}",
                self.policy.max_attempts
            ),
        ))
    }

    /// Re-send the tracked filter on a fresh socket; tracking updates on the ack.
    async fn resubscribe(&mut self, socket: &mut Socket) -> Result<(), String> {
        let Some(tracked) = &self.tracked else {
            return Ok(());
        };
        let kind = tracked.kind;
        let filter = tracked.filter.clone();
        let id = self.take_id();
        let request = kind.subscribe_request(filter.clone());
        self.pending.insert(
            id,
            Pending {
                kind,
                filter,
                reply: None,
            },
        );
        send_request(socket, id, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    type ServerSocket = WebSocketStream<TcpStream>;

    async fn listen() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    async fn accept(listener: &TcpListener) -> ServerSocket {
        let (stream, _) = listener.accept().await.unwrap();
        accept_async(stream).await.unwrap()
    }

    async fn recv_json(ws: &mut ServerSocket) -> Value {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("server expected a text frame, got {other:?}"),
            }
        }
    }

    async fn send_json(ws: &mut ServerSocket, value: Value) {
        ws.send(Message::Text(value.to_string().into())).await.unwrap();
    }

    fn fast_config(url: &str) -> SubscriptionConfig {
        SubscriptionConfig::new(url)
            .with_subscribe_timeout(Duration::from_secs(5))
            .with_reconnect(ReconnectPolicy::new(Duration::from_millis(10), 3))
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<SubscriptionEvent>) -> Option<SubscriptionEvent> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within timeout")
    }

    #[tokio::test]
    async fn test_connect_fails_before_open() {
        let (listener, url) = listen().await;
        drop(listener);
        let err = SubscriptionClient::connect(fast_config(&url)).await.err().unwrap();
        assert!(matches!(err, RpcError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_subscribe_and_forward_tracked_notifications() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            let request = recv_json(&mut ws).await;
            assert_eq!(request["method"], "suix_subscribeEvent");
            assert_eq!(request["params"], json!([{"Sender": "0xa"}]));
            send_json(&mut ws, json!({"jsonrpc": "2.0", "id": request["id"], "result": 42})).await;
            for (sub, n) in [(42, 1), (99, 2), (42, 3)] {
                send_json(
                    &mut ws,
                    json!({"jsonrpc": "2.0", "method": "suix_subscribeEvent",
                           "params": {"subscription": sub, "result": {"n": n}}}),
                )
                .await;
            }
            // Hold the socket until the client goes away.
            while ws.next().await.is_some() {}
        });

        let (client, mut events) = SubscriptionClient::connect(fast_config(&url)).await.unwrap();
        let id = client.subscribe_event(json!({"Sender": "0xa"})).await.unwrap();
        assert_eq!(id, json!(42));
        assert_eq!(client.state(), ConnectionState::Subscribed);

        let mut seen = Vec::new();
        for _ in 0..2 {
            match next_event(&mut events).await {
                Some(SubscriptionEvent::Notification {
                    subscription,
                    result,
                }) => {
                    assert_eq!(subscription, json!(42));
                    seen.push(result["n"].as_i64().unwrap());
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(seen, vec![1, 3]);

        client.close();
        client.closed().await;
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_times_out() {
        let (listener, url) = listen().await;
        let _server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            while ws.next().await.is_some() {}
        });

        let config = fast_config(&url).with_subscribe_timeout(Duration::from_millis(100));
        let (client, _events) = SubscriptionClient::connect(config).await.unwrap();
        let err = client
            .subscribe_transaction(json!({"FromAddress": "0xa"}))
            .await
            .unwrap_err();
        match err {
            RpcError::Timeout { method, after } => {
                assert_eq!(method, "suix_subscribeTransaction");
                assert_eq!(after, Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        client.close();
    }

    #[test]
    fn test_sweep_drops_abandoned_subscribes() {
        let entry = |reply| Pending {
            kind: SubscriptionKind::Event,
            filter: json!("All"),
            reply,
        };
        let (waiting_tx, _waiting_rx) = oneshot::channel();
        let (gone_tx, gone_rx) = oneshot::channel();
        drop(gone_rx);

        let mut pending = HashMap::new();
        pending.insert(1, entry(Some(waiting_tx)));
        pending.insert(2, entry(Some(gone_tx)));
        pending.insert(3, entry(None));

        assert_eq!(sweep_abandoned(&mut pending), 1);
        let mut left: Vec<u64> = pending.keys().copied().collect();
        left.sort_unstable();
        assert_eq!(left, vec![1, 3]);
        assert_eq!(sweep_abandoned(&mut pending), 0);
    }

    #[tokio::test]
    async fn test_late_ack_after_timeout_is_ignored() {
        let (listener, url) = listen().await;
        let _server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            let first = recv_json(&mut ws).await;
            tokio::time::sleep(Duration::from_millis(300)).await;
            send_json(&mut ws, json!({"jsonrpc": "2.0", "id": first["id"], "result": 5})).await;
            let second = recv_json(&mut ws).await;
            send_json(&mut ws, json!({"jsonrpc": "2.0", "id": second["id"], "result": 6})).await;
            while ws.next().await.is_some() {}
        });

        let config = fast_config(&url).with_subscribe_timeout(Duration::from_millis(100));
        let (client, _events) = SubscriptionClient::connect(config).await.unwrap();
        let err = client.subscribe_event(json!("All")).await.unwrap_err();
        assert!(matches!(err, RpcError::Timeout { .. }));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(client.state(), ConnectionState::Connected);

        let id = client.subscribe_event(json!("All")).await.unwrap();
        assert_eq!(id, json!(6));
        assert_eq!(client.state(), ConnectionState::Subscribed);
        client.close();
    }

    #[tokio::test]
    async fn test_subscribe_remote_error() {
        let (listener, url) = listen().await;
        let _server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            let request = recv_json(&mut ws).await;
            send_json(
                &mut ws,
                json!({"jsonrpc": "2.0", "id": request["id"],
                       "error": {"code": -32602, "message": "bad filter"}}),
            )
            .await;
            while ws.next().await.is_some() {}
        });

        let (client, _events) = SubscriptionClient::connect(fast_config(&url)).await.unwrap();
        let err = client.subscribe_event(json!({"Bogus": 1})).await.unwrap_err();
        assert!(matches!(err, RpcError::Remote { code: -32602, .. }));
        assert_eq!(client.state(), ConnectionState::Connected);
        client.close();
    }

    #[tokio::test]
    async fn test_reconnect_exhaustion_reports_terminal_error() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move {
            let ws = accept(&listener).await;
            drop(ws);
            drop(listener);
        });

        let (client, mut events) = SubscriptionClient::connect(fast_config(&url)).await.unwrap();
        server.await.unwrap();

        let mut delays = Vec::new();
        loop {
            match next_event(&mut events).await {
                Some(SubscriptionEvent::Reconnecting { attempt, delay }) => {
                    assert_eq!(attempt as usize, delays.len() + 1);
                    delays.push(delay);
                }
                Some(SubscriptionEvent::Failed(err)) => {
                    assert!(err.to_string().contains("3 attempts"));
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(delays.len(), 3);
        assert!(delays.windows(2).all(|w| w[0] < w[1]));

        assert!(next_event(&mut events).await.is_none());
        client.closed().await;
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_suppresses_reconnect() {
        let (listener, url) = listen().await;
        let (drop_tx, drop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let ws = accept(&listener).await;
            let _ = drop_rx.await;
            drop(ws);
        });

        let (client, mut events) = SubscriptionClient::connect(fast_config(&url)).await.unwrap();
        client.close();
        let _ = drop_tx.send(());
        server.await.unwrap();

        assert!(next_event(&mut events).await.is_none());
        client.closed().await;
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_reconnect_resends_tracked_filter() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move {
            let mut first = accept(&listener).await;
            let request = recv_json(&mut first).await;
            send_json(&mut first, json!({"jsonrpc": "2.0", "id": request["id"], "result": 1})).await;
            drop(first);

            let mut second = accept(&listener).await;
            let resent = recv_json(&mut second).await;
            assert_eq!(resent["method"], "suix_subscribeEvent");
            assert_eq!(resent["params"], json!([{"MoveModule": {"package": "0x2", "module": "coin"}}]));
            send_json(&mut second, json!({"jsonrpc": "2.0", "id": resent["id"], "result": 2})).await;
            send_json(
                &mut second,
                json!({"jsonrpc": "2.0", "method": "suix_subscribeEvent",
                       "params": {"subscription": 1, "result": "stale"}}),
            )
            .await;
            send_json(
                &mut second,
                json!({"jsonrpc": "2.0", "method": "suix_subscribeEvent",
                       "params": {"subscription": 2, "result": "fresh"}}),
            )
            .await;
            while second.next().await.is_some() {}
        });

        let (client, mut events) = SubscriptionClient::connect(fast_config(&url)).await.unwrap();
        let id = client
            .subscribe_event(json!({"MoveModule": {"package": "0x2", "module": "coin"}}))
            .await
            .unwrap();
        assert_eq!(id, json!(1));

        assert!(matches!(
            next_event(&mut events).await,
            Some(SubscriptionEvent::Reconnecting { attempt: 1, .. })
        ));
        assert!(matches!(
            next_event(&mut events).await,
            Some(SubscriptionEvent::Reconnected { attempt: 1 })
        ));
        match next_event(&mut events).await {
            Some(SubscriptionEvent::Notification {
                subscription,
                result,
            }) => {
                assert_eq!(subscription, json!(2));
                assert_eq!(result, json!("fresh"));
            }
            other => panic!("unexpected event {other:?}"),
        }

        client.close();
        client.closed().await;
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unsubscribe_is_fire_and_forget() {
        let (listener, url) = listen().await;
        let (seen_tx, seen_rx) = oneshot::channel::<Value>();
        let _server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            let request = recv_json(&mut ws).await;
            send_json(&mut ws, json!({"jsonrpc": "2.0", "id": request["id"], "result": 7})).await;
            let unsubscribe = recv_json(&mut ws).await;
            let _ = seen_tx.send(unsubscribe);
            // Never acknowledge; notifications for 7 keep arriving and must be dropped.
            send_json(
                &mut ws,
                json!({"jsonrpc": "2.0", "method": "suix_subscribeEvent",
                       "params": {"subscription": 7, "result": {}}}),
            )
            .await;
            while ws.next().await.is_some() {}
        });

        let (client, mut events) = SubscriptionClient::connect(fast_config(&url)).await.unwrap();
        client.subscribe_event(json!("All")).await.unwrap();
        client.unsubscribe();

        let unsubscribe = tokio::time::timeout(Duration::from_secs(5), seen_rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unsubscribe["method"], "suix_unsubscribeEvent");
        assert_eq!(unsubscribe["params"], json!([7]));

        assert!(
            tokio::time::timeout(Duration::from_millis(200), events.recv())
                .await
                .is_err(),
            "no notification after unsubscribe"
        );
        assert_eq!(client.state(), ConnectionState::Connected);
        client.close();
    }
}
