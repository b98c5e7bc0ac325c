//! The command session: one broker connection from connect to stop.
//!
//! A poller task owns the rumqttc [`EventLoop`] and only polls it,
//! forwarding what the session cares about over a channel. The session
//! task handles one command at a time, so handlers never overlap, while
//! the event loop keeps draining the client's request queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pimqtt_core::constants::{LIVENESS_OFFLINE, LIVENESS_ONLINE, VERSION};
use pimqtt_core::{Response, StartupInfo, Topics};
use pimqtt_settings::PimqttSettings;
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet,
    Transport,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::camera::Camera;
use crate::dispatcher::{CommandDispatcher, DispatchOutcome};
use crate::errors::SessionError;
use crate::identity;
use crate::images::ImageCache;
use crate::publisher::{Publisher, QOS};
use crate::state::SessionState;
use crate::status::CPU_SAMPLE_WINDOW;

/// Capacity of the client request queue.
const REQUEST_CAPACITY: usize = 16;

/// How long a graceful stop waits for the disconnect to go out.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Slack on top of the longest command and the drain when waiting for a stop.
const STOP_SLACK: Duration = Duration::from_secs(1);

/// What the poller forwards to the session task.
#[derive(Debug)]
enum LoopEvent {
    ConnAck,
    Command(Vec<u8>),
    Failed(ConnectionError),
    Closed,
}

/// One MQTT command session.
pub struct CommandSession {
    settings: PimqttSettings,
    node_id: String,
    client_id: String,
    dispatcher: CommandDispatcher,
    state: SessionState,
}

impl CommandSession {
    /// Build a session from validated settings and the camera capability.
    pub fn new(settings: PimqttSettings, camera: Option<Arc<dyn Camera>>) -> Self {
        let node_id = identity::node_id();
        let client_id = identity::client_id(settings.broker.client_id_prefix.as_deref(), &node_id);
        let topics = Topics::new(
            settings.topics.command.clone(),
            &settings.topics.response,
            &settings.topics.camera,
            &settings.topics.liveness,
            &node_id,
        );
        let dispatcher =
            CommandDispatcher::new(topics, camera, ImageCache::from_settings(&settings.images))
                .with_allow_die(settings.commands.allow_die);
        Self {
            settings,
            node_id,
            client_id,
            dispatcher,
            state: SessionState::default(),
        }
    }

    /// MQTT client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Node identifier used for the liveness topic.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// How long a stop request may take: the slowest command still running
    /// (a capture at its timeout) plus the disconnect drain.
    pub fn stop_timeout(&self) -> Duration {
        self.settings.camera.timeout().max(CPU_SAMPLE_WINDOW) + DRAIN_TIMEOUT + STOP_SLACK
    }

    /// Topics in use.
    pub fn topics(&self) -> &Topics {
        self.dispatcher.topics()
    }

    /// Connection options: keepalive, last-will, and the TLS and auth
    /// choices taken straight from the broker settings.
    pub fn mqtt_options(&self) -> Result<MqttOptions, SessionError> {
        let broker = &self.settings.broker;
        let mut options = MqttOptions::new(&self.client_id, &broker.host, broker.port);
        let _ = options
            .set_keep_alive(broker.keep_alive())
            .set_clean_session(true)
            .set_max_packet_size(broker.max_packet_bytes, broker.max_packet_bytes)
            .set_last_will(LastWill::new(
                self.topics().liveness(),
                LIVENESS_OFFLINE,
                QOS,
                true,
            ));
        if broker.auth {
            let _ = options.set_credentials(&broker.username, &broker.password);
        }
        if broker.tls {
            let _ = options.set_transport(tls_transport(broker.ca_file.as_deref())?);
        }
        Ok(options)
    }

    /// Connect and serve commands until `shutdown` fires or the connection
    /// fails.
    ///
    /// Returns `Ok(())` after an operator stop. A broker that cannot be
    /// reached yields [`SessionError::Connect`]; losing an established
    /// connection yields [`SessionError::ConnectionLost`]. There is no
    /// reconnect.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), SessionError> {
        let options = self.mqtt_options()?;
        let broker = &self.settings.broker;
        info!(
            host = %broker.host,
            port = broker.port,
            tls = broker.tls,
            auth = broker.auth,
            client_id = %self.client_id,
            "connecting to broker"
        );
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (tx, mut events) = mpsc::unbounded_channel();
        let mut poller = tokio::spawn(drive(eventloop, self.topics().command().to_owned(), tx));
        self.state.transition(SessionState::Connecting)?;

        let result = self.serve(&client, &mut events, &shutdown).await;
        match result {
            Ok(()) => self.stop(&client, &mut poller).await,
            Err(err) => {
                poller.abort();
                if self.state != SessionState::Disconnected {
                    self.state.transition(SessionState::Disconnected)?;
                }
                Err(err)
            }
        }
    }

    /// The receive loop. Returns `Ok(())` when a stop is requested.
    async fn serve(
        &mut self,
        client: &AsyncClient,
        events: &mut mpsc::UnboundedReceiver<LoopEvent>,
        shutdown: &CancellationToken,
    ) -> Result<(), SessionError> {
        loop {
            let event = tokio::select! {
                () = shutdown.cancelled() => return Ok(()),
                event = events.recv() => event,
            };
            match event {
                Some(LoopEvent::ConnAck) => {
                    self.state.transition(SessionState::Connected)?;
                    self.on_connected(client).await?;
                }
                Some(LoopEvent::Command(payload)) => {
                    if self.state != SessionState::Connected {
                        debug!("ignoring command received before connect");
                        continue;
                    }
                    if self.dispatcher.dispatch(&payload, client).await? == DispatchOutcome::Abort {
                        error!("aborting on die command");
                        std::process::abort();
                    }
                }
                Some(LoopEvent::Failed(err)) => {
                    let was_connected = self.state == SessionState::Connected;
                    self.state.transition(SessionState::Disconnected)?;
                    if was_connected {
                        error!(error = %err, "connection to broker lost");
                        return Err(SessionError::ConnectionLost(err));
                    }
                    error!(error = %err, "failed to connect to broker");
                    return Err(SessionError::Connect(err));
                }
                Some(LoopEvent::Closed) | None => {
                    self.state.transition(SessionState::Disconnected)?;
                    return Err(SessionError::ConnectionLost(ConnectionError::RequestsDone));
                }
            }
        }
    }

    /// Subscribe, mark the node online, and announce the session.
    async fn on_connected(&self, client: &AsyncClient) -> Result<(), SessionError> {
        let topics = self.topics();
        client.subscribe(topics.command(), QOS).await?;
        Publisher::publish(client, topics.liveness(), LIVENESS_ONLINE.into(), true).await?;

        let startup = Response::Startup(StartupInfo {
            client_id: self.client_id.clone(),
            node_id: self.node_id.clone(),
            version: VERSION.to_owned(),
            started_at: Utc::now().to_rfc3339(),
            camera: self.dispatcher.camera_enabled(),
        });
        self.dispatcher.respond(&startup, client).await?;
        info!(
            command_topic = topics.command(),
            liveness_topic = topics.liveness(),
            camera = self.dispatcher.camera_enabled(),
            "session connected"
        );
        Ok(())
    }

    /// Operator stop: mark offline, unsubscribe, disconnect, and give the
    /// poller a bounded time to flush.
    async fn stop(
        &mut self,
        client: &AsyncClient,
        poller: &mut JoinHandle<()>,
    ) -> Result<(), SessionError> {
        let was_connected = self.state == SessionState::Connected;
        self.state.transition(SessionState::ShuttingDown)?;
        info!("stopping session");

        if was_connected {
            let topics = self.topics();
            if let Err(err) =
                Publisher::publish(client, topics.liveness(), LIVENESS_OFFLINE.into(), true).await
            {
                warn!(error = %err, "failed to publish offline marker");
            }
            if let Err(err) = client.unsubscribe(topics.command()).await {
                warn!(error = %err, "failed to unsubscribe");
            }
            if let Err(err) = client.disconnect().await {
                warn!(error = %err, "failed to request disconnect");
            }
            if tokio::time::timeout(DRAIN_TIMEOUT, &mut *poller).await.is_err() {
                warn!("disconnect not flushed after {DRAIN_TIMEOUT:?}");
                poller.abort();
            }
        } else {
            poller.abort();
        }

        self.state.transition(SessionState::Disconnected)?;
        info!("session stopped");
        Ok(())
    }
}

/// Poll the event loop until it fails or the disconnect goes out.
async fn drive(
    mut eventloop: EventLoop,
    command_topic: String,
    events: mpsc::UnboundedSender<LoopEvent>,
) {
    loop {
        let forward = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                debug!(?ack, "connection acknowledged");
                LoopEvent::ConnAck
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if publish.topic != command_topic {
                    debug!(topic = %publish.topic, "ignoring message on foreign topic");
                    continue;
                }
                LoopEvent::Command(publish.payload.to_vec())
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                let _ = events.send(LoopEvent::Closed);
                return;
            }
            Ok(_) => continue,
            Err(err) => {
                let _ = events.send(LoopEvent::Failed(err));
                return;
            }
        };
        if events.send(forward).is_err() {
            return;
        }
    }
}

fn tls_transport(ca_file: Option<&str>) -> Result<Transport, SessionError> {
    match ca_file {
        Some(path) => {
            let ca = std::fs::read(path)
                .map_err(|err| SessionError::Tls(format!("cannot read CA file {path}: {err}")))?;
            Ok(Transport::tls(ca, None, None))
        }
        None => Ok(Transport::tls_with_default_config()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
