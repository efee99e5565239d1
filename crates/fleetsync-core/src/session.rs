// ── Session ──
//
// Lifecycle owner for one panel connection: the store, the REST client,
// the push event channel, and the background pump that folds channel
// events into the store in delivery order.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fleetsync_api::PanelClient;
use fleetsync_api::models::RecordId;
use fleetsync_api::websocket::{ChannelEvent, ConnectionState, EventChannel};

use crate::command::{Command, CommandResult};
use crate::config::SessionConfig;
use crate::dispatch::handle_channel_event;
use crate::error::CoreError;
use crate::model::{AttackJob, Server};
use crate::store::DataStore;
use crate::stream::StoreStream;

// ── Session ──────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Owns the store for its
/// whole lifetime; nothing is process-global.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    store: Arc<DataStore>,
    client: PanelClient,
    connection_state: watch::Sender<ConnectionState>,
    channel: Mutex<Option<EventChannel>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Create a session from configuration. Does NOT connect; call
    /// [`start()`](Self::start) to open the event channel.
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        let client = PanelClient::new(config.base_url.clone(), &config.transport())?;
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                store: Arc::new(DataStore::new()),
                client,
                connection_state,
                channel: Mutex::new(None),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Open the push event channel and start the pump task.
    ///
    /// Returns once the tasks are spawned; the first connection attempt
    /// happens in the background and is retried forever at the configured
    /// fixed delay. A no-op if the channel is disabled or already running.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::SessionClosed);
        }
        if !self.inner.config.event_channel_enabled {
            debug!("event channel disabled, not starting");
            return Ok(());
        }

        let mut channel_slot = self.inner.channel.lock().await;
        if channel_slot.is_some() {
            return Ok(());
        }

        let config = &self.inner.config;
        let url = config.event_url()?;
        let token = config.transport().admin_token_header()?;

        let (channel, events) = EventChannel::spawn(
            url.clone(),
            config.reconnect(),
            self.inner.cancel.child_token(),
            token,
        );

        let pump = tokio::spawn(pump_task(
            Arc::clone(&self.inner.store),
            events,
            channel.state(),
            self.inner.connection_state.clone(),
            self.inner.cancel.clone(),
        ));
        self.inner.task_handles.lock().await.push(pump);
        *channel_slot = Some(channel);

        info!(url = %url, "event channel started");
        Ok(())
    }

    /// Stop background tasks, drop the store's contents, and mark the
    /// session disconnected. Further commands fail with
    /// [`CoreError::SessionClosed`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let channel = self.inner.channel.lock().await.take();
        if let Some(ref channel) = channel {
            channel.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        if let Some(channel) = channel {
            channel.join().await;
        }

        self.inner.store.set_connection_status(false);
        self.inner.store.clear();
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("session shut down");
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a command against the panel and apply its result to the
    /// store. Failures are logged and returned unchanged.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::SessionClosed);
        }

        let name = cmd.name();
        let result = route_command(&self.inner.client, &self.inner.store, cmd).await;
        if let Err(ref e) = result {
            warn!(command = name, error = %e, "command failed");
        }
        result
    }

    // ── One-shot convenience ─────────────────────────────────────────

    /// One-shot: build a session, run the closure, shut down.
    ///
    /// The event channel is disabled since a single request-response
    /// cycle needs no live updates.
    pub async fn oneshot<F, Fut, T, E>(config: SessionConfig, f: F) -> Result<T, E>
    where
        F: FnOnce(Session) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: From<CoreError>,
    {
        let mut cfg = config;
        cfg.event_channel_enabled = false;

        let session = Session::new(cfg)?;
        let result = f(session.clone()).await;
        session.shutdown().await;
        result
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to event channel state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to store changes.
    pub fn subscribe(&self) -> StoreStream {
        self.inner.store.subscribe()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Apply channel events to the store strictly in delivery order, and
/// mirror the channel's connection state onto the session's.
async fn pump_task(
    store: Arc<DataStore>,
    mut events: mpsc::Receiver<ChannelEvent>,
    mut channel_state: watch::Receiver<ConnectionState>,
    session_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    let mut state_open = true;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                handle_channel_event(&store, &event);
            }
            changed = channel_state.changed(), if state_open => {
                if changed.is_err() {
                    state_open = false;
                    continue;
                }
                let state = *channel_state.borrow_and_update();
                session_state.send_replace(state);
            }
        }
    }

    debug!("event pump exiting");
}

// ── Command routing ──────────────────────────────────────────────────

async fn route_command(
    client: &PanelClient,
    store: &DataStore,
    cmd: Command,
) -> Result<CommandResult, CoreError> {
    match cmd {
        // ── Servers ──────────────────────────────────────────────

        Command::LoadServers => {
            let servers: Vec<Server> = client
                .list_servers()
                .await?
                .into_iter()
                .map(Server::from)
                .collect();
            store.set_servers(servers);
            debug!(servers = store.server_stats().total, "servers loaded");
            Ok(CommandResult::Servers(store.all_servers()))
        }

        Command::AddServer(new) => {
            let server = Server::from(client.create_server(&new).await?);
            store.add_server(server.clone());
            Ok(CommandResult::Server(Arc::new(server)))
        }

        Command::DeleteServer { id } => {
            client.delete_server(&RecordId::from(&id)).await?;
            store.remove_server(&id);
            Ok(CommandResult::Ok)
        }

        // ── Attack jobs ──────────────────────────────────────────

        Command::LoadAttacks => {
            let attacks: Vec<AttackJob> = client
                .list_attacks()
                .await?
                .into_iter()
                .map(AttackJob::from)
                .collect();
            store.set_attacks(attacks);
            debug!(attacks = store.attack_stats().total, "attacks loaded");
            Ok(CommandResult::Attacks(store.all_attacks()))
        }

        Command::CreateAttack(new) => {
            let job = AttackJob::from(client.create_attack(&new).await?);
            store.add_attack(job.clone());
            Ok(CommandResult::Attack(Arc::new(job)))
        }

        Command::StopAttack { id } => {
            client.stop_attack(&RecordId::from(&id)).await?;
            Ok(CommandResult::Ok)
        }
    }
}
