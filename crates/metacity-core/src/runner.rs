//! The single-writer simulation loop.
//!
//! [`run_simulation`] owns the [`GameState`]. Everything else talks to it
//! through a [`SimulationHandle`]:
//!
//! - **Actions** are queued on an `mpsc` channel and applied one at a time,
//!   with an optional `oneshot` reply carrying the [`Outcome`].
//! - **Snapshots** of every applied state are published on a `watch`
//!   channel, so readers never block the loop.
//! - **Summaries** are broadcast for live dashboards.
//! - **Timers** come from the [`Scheduler`]. Ticks, proposal execution and
//!   autosaves are skipped while the state is still loading.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::action::Action;
use crate::clock::Clock;
use crate::reducer::{Outcome, Reducer, Transition};
use crate::scheduler::{ScheduledEvent, Scheduler};
use crate::state::{GameState, ResourceSummary};

/// Capacity of the summary broadcast channel.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const SUMMARY_CAPACITY: usize = 256;

/// Errors surfaced to callers of a [`SimulationHandle`].
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The simulation loop has stopped.
    #[error("simulation command channel closed")]
    ChannelClosed,
}

/// A message for the simulation loop.
#[derive(Debug)]
pub enum Command {
    /// Apply an action.
    Dispatch {
        /// The action.
        action: Action,
        /// Where to send the outcome, if the caller wants it.
        reply: Option<oneshot::Sender<Outcome>>,
    },
    /// Stop the loop and return the final state.
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle and inbox
// ---------------------------------------------------------------------------

/// Cloneable client of a running simulation.
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Arc<GameState>>,
    summaries: broadcast::Sender<ResourceSummary>,
}

/// The loop's side of the channels created by [`channel`].
#[derive(Debug)]
pub struct SimulationInbox {
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<Arc<GameState>>,
    summaries: broadcast::Sender<ResourceSummary>,
}

/// Create a connected handle and inbox, seeded with `initial` as the first
/// published snapshot.
pub fn channel(initial: &GameState, capacity: usize) -> (SimulationHandle, SimulationInbox) {
    let (command_tx, command_rx) = mpsc::channel(capacity.max(1));
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial.clone()));
    let (summary_tx, _) = broadcast::channel(SUMMARY_CAPACITY);
    (
        SimulationHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            summaries: summary_tx.clone(),
        },
        SimulationInbox {
            commands: command_rx,
            snapshots: snapshot_tx,
            summaries: summary_tx,
        },
    )
}

impl SimulationHandle {
    /// Apply `action` and wait for its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ChannelClosed`] if the loop has stopped.
    pub async fn submit(&self, action: Action) -> Result<Outcome, RunnerError> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(Command::Dispatch {
                action,
                reply: Some(reply),
            })
            .await
            .map_err(|_closed| RunnerError::ChannelClosed)?;
        outcome.await.map_err(|_closed| RunnerError::ChannelClosed)
    }

    /// Queue `action` without waiting for it to be applied.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ChannelClosed`] if the loop has stopped.
    pub async fn dispatch(&self, action: Action) -> Result<(), RunnerError> {
        self.commands
            .send(Command::Dispatch {
                action,
                reply: None,
            })
            .await
            .map_err(|_closed| RunnerError::ChannelClosed)
    }

    /// Ask the loop to stop.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ChannelClosed`] if the loop has already stopped.
    pub async fn shutdown(&self) -> Result<(), RunnerError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_closed| RunnerError::ChannelClosed)
    }

    /// The most recently published state.
    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Watch published states.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Arc<GameState>> {
        self.snapshots.clone()
    }

    /// Receive a summary after every applied action.
    pub fn subscribe_summaries(&self) -> broadcast::Receiver<ResourceSummary> {
        self.summaries.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Side effects the loop triggers on scheduled events.
///
/// Hooks run on the loop task and must return quickly; slow work such as
/// network calls belongs on a task the hook spawns or signals.
pub trait SimulationHooks: Send {
    /// Called on every autosave event with the current state.
    fn on_autosave(&mut self, _state: &GameState) {}

    /// Called on every flavor refresh event with the current state.
    fn on_flavor_refresh(&mut self, _state: &GameState) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHooks;

impl SimulationHooks for NoOpHooks {}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Run the simulation until a [`Command::Shutdown`] arrives or every
/// handle is dropped, then return the final state.
pub async fn run_simulation(
    mut state: GameState,
    reducer: &Reducer,
    mut scheduler: Scheduler,
    clock: &dyn Clock,
    mut inbox: SimulationInbox,
    hooks: &mut dyn SimulationHooks,
) -> GameState {
    info!(
        tick_interval_ms = reducer.rules().tick_interval_ms,
        buildings = state.buildings.len(),
        "Simulation starting"
    );

    loop {
        let wait = scheduler
            .next_deadline()
            .map(|deadline| {
                deadline
                    .signed_duration_since(clock.now())
                    .to_std()
                    .unwrap_or_default()
            });

        tokio::select! {
            command = inbox.commands.recv() => match command {
                Some(Command::Dispatch { action, reply }) => {
                    let (next, outcome) = apply(state, reducer, &action, clock.now(), &inbox);
                    state = next;
                    if let Some(reply) = reply
                        && reply.send(outcome).is_err()
                    {
                        debug!(action = action.kind(), "Caller dropped outcome receiver");
                    }
                }
                Some(Command::Shutdown) => {
                    info!("Simulation shutdown requested");
                    break;
                }
                None => {
                    info!("All simulation handles dropped");
                    break;
                }
            },
            () = sleep_for(wait) => {
                let now = clock.now();
                for event in scheduler.poll(now) {
                    state = fire(state, event, reducer, now, &inbox, hooks);
                }
            }
        }
    }

    info!(
        currency = %state.ledger.currency(),
        buildings = state.buildings.len(),
        "Simulation stopped"
    );
    state
}

async fn sleep_for(wait: Option<std::time::Duration>) {
    match wait {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending::<()>().await,
    }
}

fn fire(
    state: GameState,
    event: ScheduledEvent,
    reducer: &Reducer,
    now: DateTime<Utc>,
    inbox: &SimulationInbox,
    hooks: &mut dyn SimulationHooks,
) -> GameState {
    if state.is_loading {
        debug!(?event, "Scheduled event skipped while loading");
        return state;
    }
    match event {
        ScheduledEvent::Tick => apply(state, reducer, &Action::Tick { now }, now, inbox).0,
        ScheduledEvent::ExecuteProposals => {
            apply(state, reducer, &Action::ExecuteProposals, now, inbox).0
        }
        ScheduledEvent::Autosave => {
            hooks.on_autosave(&state);
            state
        }
        ScheduledEvent::FlavorRefresh => {
            hooks.on_flavor_refresh(&state);
            state
        }
    }
}

fn apply(
    state: GameState,
    reducer: &Reducer,
    action: &Action,
    now: DateTime<Utc>,
    inbox: &SimulationInbox,
) -> (GameState, Outcome) {
    let Transition { state, outcome } = reducer.apply(state, action, now);
    if outcome.is_applied() {
        inbox.snapshots.send_replace(Arc::new(state.clone()));
        // Zero receivers is normal when no dashboard is connected.
        inbox.summaries.send(state.summary()).unwrap_or(0);
    }
    (state, outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use metacity_types::{ActorId, BuildingType, Position, RejectionReason};

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{TimingConfig, WorldConfig};

    fn quiet_timing() -> TimingConfig {
        TimingConfig {
            tick_interval_ms: 0,
            autosave_interval_ms: 0,
            proposal_duration_ms: 180_000,
            flavor_refresh_ms: 0,
        }
    }

    #[derive(Default)]
    struct CountingHooks {
        autosaves: usize,
    }

    impl SimulationHooks for CountingHooks {
        fn on_autosave(&mut self, _state: &GameState) {
            self.autosaves = self.autosaves.saturating_add(1);
        }
    }

    #[tokio::test]
    async fn submitted_actions_are_applied_in_order() {
        let start = Utc::now();
        let mut state = GameState::initial(&WorldConfig::default(), start).unwrap();
        state.is_loading = false;
        let (handle, inbox) = channel(&state, 8);
        let clock = ManualClock::new(start);
        let reducer = Reducer::default();
        let scheduler = Scheduler::new(&quiet_timing(), start);

        let driver = async {
            let outcome = handle
                .submit(Action::ConnectActor(ActorId::from("0xPlayer1...")))
                .await
                .unwrap();
            assert_eq!(outcome, Outcome::Applied);
            handle
                .submit(Action::SetBuildMode(Some(BuildingType::Road)))
                .await
                .unwrap();
            let placed = handle
                .submit(Action::PlaceBuilding {
                    position: Position::new(10, 9),
                    building_type: BuildingType::Road,
                })
                .await
                .unwrap();
            assert_eq!(placed, Outcome::Applied);
            let again = handle
                .submit(Action::PlaceBuilding {
                    position: Position::new(11, 9),
                    building_type: BuildingType::Road,
                })
                .await
                .unwrap();
            assert_eq!(
                again,
                Outcome::Rejected(RejectionReason::BuildModeNotSelected)
            );
            assert_eq!(handle.snapshot().buildings.len(), 2);
            handle.shutdown().await.unwrap();
        };

        let mut hooks = NoOpHooks;
        let (final_state, ()) = tokio::join!(
            run_simulation(state, &reducer, scheduler, &clock, inbox, &mut hooks),
            driver
        );
        assert_eq!(final_state.buildings.len(), 2);
    }

    #[tokio::test]
    async fn scheduled_events_wait_for_loading_to_finish() {
        let start = Utc::now();
        let state = GameState::initial(&WorldConfig::default(), start).unwrap();
        let (handle, inbox) = channel(&state, 8);
        let clock = ManualClock::new(start + Duration::seconds(31));
        let reducer = Reducer::default();
        let timing = TimingConfig {
            tick_interval_ms: 1000,
            autosave_interval_ms: 30_000,
            proposal_duration_ms: 180_000,
            flavor_refresh_ms: 0,
        };
        let scheduler = Scheduler::new(&timing, start);
        let mut hooks = CountingHooks::default();

        let driver = async {
            // Every deadline has already passed; give the loop time to fire
            // them against the loading state.
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            assert_eq!(handle.snapshot().last_update, start);
            handle.shutdown().await.unwrap();
        };

        let (final_state, ()) = tokio::join!(
            run_simulation(state, &reducer, scheduler, &clock, inbox, &mut hooks),
            driver
        );
        assert!(final_state.is_loading);
        assert_eq!(final_state.last_update, start);
        assert_eq!(hooks.autosaves, 0);
    }

    #[tokio::test]
    async fn summaries_follow_applied_actions() {
        let start = Utc::now();
        let state = GameState::initial(&WorldConfig::default(), start).unwrap();
        let (handle, inbox) = channel(&state, 8);
        let mut summaries = handle.subscribe_summaries();
        let clock = ManualClock::new(start);
        let reducer = Reducer::default();
        let scheduler = Scheduler::new(&quiet_timing(), start);

        let driver = async {
            handle.submit(Action::SetIsLoading(false)).await.unwrap();
            let summary = summaries.recv().await.unwrap();
            assert_eq!(summary.buildings, 1);
            handle.shutdown().await.unwrap();
        };

        let mut hooks = NoOpHooks;
        let (final_state, ()) = tokio::join!(
            run_simulation(state, &reducer, scheduler, &clock, inbox, &mut hooks),
            driver
        );
        assert!(!final_state.is_loading);
    }

    #[tokio::test]
    async fn dropped_runner_closes_handle() {
        let state = GameState::initial(&WorldConfig::default(), Utc::now()).unwrap();
        let (handle, inbox) = channel(&state, 1);
        drop(inbox);
        assert!(matches!(
            handle.submit(Action::DisconnectActor).await,
            Err(RunnerError::ChannelClosed)
        ));
    }
}
