use std::{collections::BTreeMap, sync::Arc};

use tessera_assemble::{
    AssemblerOptions, AssemblyError, AssemblyHandle, AssemblyState, BufferAssembler,
};
use tessera_catalog::{ChunkCatalog, ChunkList, ChunkSource};
use tessera_core::{AssemblyStatus, SessionId, StreamGroup};
use tessera_events::{EventBus, PlaybackEvent};
use tessera_media::{MediaEnvironment, MediaLease};
use tessera_net::Net;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::PlaybackResult;

/// One displayed group: its assembler task and the lease on its target.
struct ActiveGroup<E: MediaEnvironment> {
    cancel: CancellationToken,
    task: Option<AssemblyHandle>,
    state: watch::Receiver<AssemblyState>,
    lease: Arc<MediaLease<E::Target>>,
}

/// Coordinates buffer assemblers for the groups currently on screen.
///
/// Groups run independently. Replacing a group (switch, restart, new
/// session) always tears the old one down first: cancel, wait for the
/// task to stop, then release its media target. Teardown is idempotent.
pub struct PlaybackSession<S, E: MediaEnvironment, N> {
    catalog: ChunkCatalog<S>,
    env: E,
    net: N,
    options: AssemblerOptions,
    events: EventBus,
    cancel: CancellationToken,
    session: Option<SessionId>,
    active: BTreeMap<StreamGroup, ActiveGroup<E>>,
}

impl<S, E, N> PlaybackSession<S, E, N>
where
    S: ChunkSource,
    E: MediaEnvironment + Clone,
    N: Net + Clone + 'static,
{
    pub fn new(
        catalog: ChunkCatalog<S>,
        env: E,
        net: N,
        options: AssemblerOptions,
        events: EventBus,
    ) -> Self {
        Self {
            catalog,
            env,
            net,
            options,
            events,
            cancel: CancellationToken::new(),
            session: None,
            active: BTreeMap::new(),
        }
    }

    /// Derive every assembler's cancellation from `cancel`.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Start (or restart) `group` of `session`.
    ///
    /// A different session tears down every group first. Returns a receiver
    /// for the group's state.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Catalog`](crate::PlaybackError::Catalog) when the
    /// listing cannot be fetched. The group's state then reads `Failed` with
    /// [`AssemblyError::CatalogUnavailable`].
    pub async fn start(
        &mut self,
        session: SessionId,
        group: StreamGroup,
    ) -> PlaybackResult<watch::Receiver<AssemblyState>> {
        self.enter_session(session.clone()).await;
        self.stop_group(group).await;

        match self.catalog.fetch_chunks(&session, group).await {
            Ok(list) => Ok(self.launch(&session, list)),
            Err(error) => {
                warn!(%session, %group, %error, "chunk listing unavailable");
                self.record_failure(group, &error.to_string());
                Err(error.into())
            }
        }
    }

    /// Display exactly `groups` of `session` side by side, with one listing
    /// call. Groups not listed are torn down.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start); every requested group reads `Failed`.
    pub async fn show(&mut self, session: SessionId, groups: &[StreamGroup]) -> PlaybackResult<()> {
        self.enter_session(session.clone()).await;
        for group in StreamGroup::ALL {
            self.stop_group(group).await;
        }

        let listing = match self.catalog.fetch_all(&session).await {
            Ok(listing) => listing,
            Err(error) => {
                warn!(%session, %error, "chunk listing unavailable");
                for &group in groups {
                    self.record_failure(group, &error.to_string());
                }
                return Err(error.into());
            }
        };
        for &group in groups {
            self.launch(&session, listing.group(group).clone());
        }
        Ok(())
    }

    /// Replace whatever is displayed with `group` of the current session.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::NoSession`](crate::PlaybackError::NoSession) before
    /// any `start`, otherwise as [`start`](Self::start).
    pub async fn switch_group(
        &mut self,
        group: StreamGroup,
    ) -> PlaybackResult<watch::Receiver<AssemblyState>> {
        let Some(session) = self.session.clone() else {
            return Err(crate::PlaybackError::NoSession);
        };
        for active in self.active_groups() {
            if active != group {
                self.stop_group(active).await;
            }
        }
        self.start(session, group).await
    }

    /// Tear down one group. Returns whether anything was running.
    pub async fn stop_group(&mut self, group: StreamGroup) -> bool {
        let Some(active) = self.active.remove(&group) else {
            return false;
        };
        active.cancel.cancel();
        if let Some(task) = active.task {
            task.join().await;
        }
        let released = active.lease.release();
        debug!(%group, released, "group torn down");
        self.events.publish(PlaybackEvent::TornDown { group });
        true
    }

    /// Tear down every group. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        let mut any = false;
        for group in self.active_groups() {
            any |= self.stop_group(group).await;
        }
        if any {
            info!(session = ?self.session, "playback stopped");
            self.events.publish(PlaybackEvent::Stopped);
        }
    }

    pub fn state(&self, group: StreamGroup) -> Option<AssemblyState> {
        self.active.get(&group).map(|a| a.state.borrow().clone())
    }

    pub fn states(&self) -> BTreeMap<StreamGroup, AssemblyState> {
        self.active
            .iter()
            .map(|(group, a)| (*group, a.state.borrow().clone()))
            .collect()
    }

    pub fn subscribe(&self, group: StreamGroup) -> Option<watch::Receiver<AssemblyState>> {
        self.active.get(&group).map(|a| a.state.clone())
    }

    pub fn active_groups(&self) -> Vec<StreamGroup> {
        self.active.keys().copied().collect()
    }

    async fn enter_session(&mut self, session: SessionId) {
        if self.session.as_ref() != Some(&session) {
            if let Some(previous) = &self.session {
                debug!(%previous, next = %session, "switching session");
            }
            self.stop().await;
            self.session = Some(session);
        }
    }

    fn launch(&mut self, session: &SessionId, list: ChunkList) -> watch::Receiver<AssemblyState> {
        let group = list.group;
        let assembler = BufferAssembler::new(
            group,
            self.env.clone(),
            self.net.clone(),
            self.options.clone(),
            self.events.clone(),
        );
        let cancel = self.cancel.child_token();
        let lease = Arc::new(MediaLease::new());
        let handle = assembler.spawn(list.chunks, Arc::clone(&lease), cancel.clone());
        let state = handle.subscribe();

        info!(%session, %group, "playback started");
        self.events.publish(PlaybackEvent::Started {
            session: session.clone(),
            group,
        });
        self.active.insert(
            group,
            ActiveGroup {
                cancel,
                task: Some(handle),
                state: state.clone(),
                lease,
            },
        );
        state
    }

    fn record_failure(&mut self, group: StreamGroup, reason: &str) {
        let mut failed = AssemblyState::new(group);
        failed.status = AssemblyStatus::Failed;
        failed.last_error = Some(AssemblyError::CatalogUnavailable(reason.to_string()));
        let (_, state) = watch::channel(failed);
        self.active.insert(
            group,
            ActiveGroup {
                cancel: self.cancel.child_token(),
                task: None,
                state,
                lease: Arc::new(MediaLease::new()),
            },
        );
    }
}

impl<S, E: MediaEnvironment, N> Drop for PlaybackSession<S, E, N> {
    fn drop(&mut self) {
        for active in self.active.values() {
            active.cancel.cancel();
            active.lease.release();
        }
    }
}
