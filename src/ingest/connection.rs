use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnAck, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions,
    Packet, QoS,
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use super::pipeline::IngestPipeline;

/// Broker session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            2 => Self::Connected,
            1 => Self::Connecting,
            _ => Self::Disconnected,
        }
    }
}

/// Connection parameters for the ingest subscription.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    /// Subscription filter with the device id as the single-level wildcard.
    pub topic: String,
    /// Base client identity; a random suffix is appended per instance.
    pub client_id: String,
    pub keep_alive: Duration,
    /// Fixed delay between reconnect attempts while disconnected.
    pub reconnect_interval: Duration,
}

/// Flags crossing the network task / supervisor boundary. All reads and
/// writes are sequentially consistent so a reconnect is never scheduled
/// against a session that is already mid-establishment.
#[derive(Default)]
struct Shared {
    state: AtomicU8,
    running: AtomicBool,
    /// Wakes the parked network task for the next connection attempt.
    retry: Notify,
    shutdown: CancellationToken,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::SeqCst);
    }
}

/// Maintains the broker subscription that feeds the ingestion pipeline.
///
/// Three concerns, each on its own task: network I/O (polling the rumqttc
/// event loop), a supervising loop that schedules a reconnect at a fixed
/// interval while the session is down, and per-message handler invocations,
/// spawned independently so a slow insert can never stall polling or
/// reconnection.
pub struct MqttIngestService {
    settings: MqttSettings,
    pipeline: Arc<IngestPipeline>,
    shared: Arc<Shared>,
    tasks: Vec<JoinHandle<()>>,
}

impl MqttIngestService {
    pub fn new(settings: MqttSettings, pipeline: Arc<IngestPipeline>) -> Self {
        Self {
            settings,
            pipeline,
            shared: Arc::new(Shared::default()),
            tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Opens the broker session and spawns the network and supervising
    /// tasks. Returns immediately; connection establishment continues in
    /// the background and is retried forever until `stop`.
    pub fn start(&mut self) {
        if self.shared.running() {
            return;
        }

        let client_id = unique_client_id(&self.settings.client_id);
        info!(
            client_id = %client_id,
            host = %self.settings.host,
            port = self.settings.port,
            "starting MQTT ingest service"
        );

        let mut options = MqttOptions::new(&client_id, &self.settings.host, self.settings.port);
        options.set_keep_alive(self.settings.keep_alive);
        options.set_clean_session(true);

        let (client, event_loop) = AsyncClient::new(options, 64);

        self.shared.set_running(true);
        self.shared.set_state(ConnectionState::Connecting);

        self.tasks.push(tokio::spawn(network_loop(
            event_loop,
            client,
            self.settings.topic.clone(),
            Arc::clone(&self.pipeline),
            Arc::clone(&self.shared),
        )));
        self.tasks.push(tokio::spawn(supervise_reconnect(
            Arc::clone(&self.shared),
            self.settings.reconnect_interval,
        )));
    }

    /// Cooperative shutdown. Flips the running flag and cancels both loops;
    /// the network task closes the session cleanly if one is open. Both
    /// loops observe the signal within one reconnect interval.
    pub async fn stop(&mut self) {
        info!("stopping MQTT ingest service");
        self.shared.set_running(false);
        self.shared.shutdown.cancel();

        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        self.shared.set_state(ConnectionState::Disconnected);
        info!("MQTT ingest service stopped");
    }
}

async fn network_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    topic: String,
    pipeline: Arc<IngestPipeline>,
    shared: Arc<Shared>,
) {
    loop {
        if !shared.running() {
            break;
        }

        let shutting_down = tokio::select! {
            _ = shared.shutdown.cancelled() => true,
            event = event_loop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        on_connack(&client, &topic, &shared, &ack);
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        debug!(topic = %publish.topic, payload_size = publish.payload.len(), "message received");
                        let pipeline = Arc::clone(&pipeline);
                        tokio::spawn(async move {
                            pipeline.handle_message(&publish.topic, &publish.payload).await;
                        });
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        debug!(topic = %topic, "subscription acknowledged");
                    }
                    Ok(event) => {
                        trace!(?event, "mqtt event");
                    }
                    Err(e) => {
                        let previous = shared.state();
                        shared.set_state(ConnectionState::Disconnected);
                        log_connection_error(&e, previous);

                        // Park until the supervisor schedules the next attempt.
                        tokio::select! {
                            _ = shared.retry.notified() => {}
                            _ = shared.shutdown.cancelled() => {}
                        }
                    }
                }
                false
            }
        };

        if shutting_down {
            if shared.state() == ConnectionState::Connected {
                if let Err(e) = client.disconnect().await {
                    debug!(error = %e, "disconnect request failed, session already down");
                } else {
                    // One bounded poll flushes the DISCONNECT packet.
                    let _ = time::timeout(Duration::from_secs(1), event_loop.poll()).await;
                    info!("disconnected from MQTT broker");
                }
            }
            break;
        }
    }
    debug!("network loop stopped");
}

/// Ticks at the fixed reconnect interval and, whenever the session is down,
/// moves it to Connecting and wakes the network task for one attempt. Never
/// gives up; the interval never grows.
async fn supervise_reconnect(shared: Arc<Shared>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "reconnect supervisor started");
    let mut ticker = time::interval(interval);
    // interval() yields its first tick immediately; skip it so attempts are
    // spaced a full interval apart.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if !shared.running() {
                    break;
                }
                if shared.state() == ConnectionState::Disconnected {
                    info!("attempting to reconnect to MQTT broker");
                    shared.set_state(ConnectionState::Connecting);
                    shared.retry.notify_one();
                }
            }
        }
    }
    debug!("reconnect supervisor stopped");
}

fn on_connack(client: &AsyncClient, topic: &str, shared: &Shared, ack: &ConnAck) {
    if ack.code == ConnectReturnCode::Success {
        shared.set_state(ConnectionState::Connected);
        info!("connected to MQTT broker");
        // Sessions are clean, so the filter must be re-issued on every
        // (re)connection.
        if let Err(e) = client.try_subscribe(topic, QoS::AtMostOnce) {
            error!(topic = %topic, error = %e, "failed to queue subscribe request");
        } else {
            info!(topic = %topic, "subscribing");
        }
    } else {
        shared.set_state(ConnectionState::Disconnected);
        error!(code = ?ack.code, cause = refusal_cause(ack.code), "MQTT broker refused connection");
    }
}

fn log_connection_error(error: &ConnectionError, previous: ConnectionState) {
    match error {
        ConnectionError::ConnectionRefused(code) => {
            error!(code = ?code, cause = refusal_cause(*code), "MQTT broker refused connection");
        }
        e if previous == ConnectionState::Connected => {
            warn!(error = %e, "unexpected disconnection from MQTT broker");
        }
        e => {
            error!(error = %e, "MQTT connection attempt failed");
        }
    }
}

/// Human-readable cause for each CONNACK refusal code.
fn refusal_cause(code: ConnectReturnCode) -> &'static str {
    match code {
        ConnectReturnCode::RefusedProtocolVersion => "incorrect protocol version",
        ConnectReturnCode::BadClientId => "invalid client identifier",
        ConnectReturnCode::ServiceUnavailable => "server unavailable",
        ConnectReturnCode::BadUserNamePassword => "bad user name or password",
        ConnectReturnCode::NotAuthorized => "not authorized",
        ConnectReturnCode::Success => "success",
    }
}

/// Appends a random 8-character suffix so concurrently running instances
/// never collide on the broker.
fn unique_client_id(base: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{base}_{}", &suffix[..8])
}
