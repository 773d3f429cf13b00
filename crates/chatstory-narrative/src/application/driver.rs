//! Cancellable playback runner and the reader-decision channel.
//!
//! Each run owns a [`PlaybackMachine`] held in the driver's single control
//! slot together with the run's cancellation token and at most one pending
//! decision. A spawned task waits on the machine's directives; every
//! transition, whether it comes from that task, a decision or a
//! cancellation, happens under the control lock and first checks that the
//! run is still the active one. A stale timer or click therefore can never
//! touch the state of a newer run.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chatstory_core::clock::Clock;
use chatstory_core::model::{MessageId, OptionId};
use chatstory_core::script::Script;
use chatstory_core::timer::Timer;
use tokio::sync::{broadcast, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::events::PlaybackEvent;
use crate::domain::playback::{Directive, PlaybackConfig, PlaybackMachine, PlaybackSnapshot};

const EVENT_CAPACITY: usize = 64;

/// What the run task waits on next.
enum Next {
    Wait(Duration),
    Await(oneshot::Receiver<Next>),
    Stop,
}

/// The continuation of a run suspended at a fork.
struct PendingChoice {
    message_id: MessageId,
    reply: oneshot::Sender<Next>,
}

struct ActiveRun {
    machine: PlaybackMachine,
    token: CancellationToken,
    pending: Option<PendingChoice>,
}

#[derive(Default)]
struct Control {
    active: Option<ActiveRun>,
}

struct Shared {
    control: Mutex<Control>,
    state: watch::Sender<PlaybackSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
    timer: Arc<dyn Timer>,
    clock: Arc<dyn Clock>,
    config: PlaybackConfig,
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        // Every critical section leaves `Control` consistent.
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, events: Vec<PlaybackEvent>) {
        for event in events {
            debug!(event = event.event_type(), run_id = %event.run_id(), "playback event");
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    /// Applies `transition` to the run if it is still active, then settles
    /// the resulting directive. `None` means the run is stale.
    fn advance(
        &self,
        run_id: Uuid,
        transition: impl FnOnce(&mut PlaybackMachine) -> Option<Directive>,
    ) -> Option<Next> {
        let mut control = self.control();
        let active = control
            .active
            .as_mut()
            .filter(|a| a.machine.run_id() == run_id && !a.token.is_cancelled())?;
        let directive = transition(&mut active.machine)?;
        Some(self.settle(&mut control, directive))
    }

    /// Publishes the active machine's state and turns a directive into what
    /// the run task should wait on.
    fn settle(&self, control: &mut Control, directive: Directive) -> Next {
        if let Some(active) = control.active.as_mut() {
            self.state.send_replace(active.machine.snapshot());
            let events = active.machine.take_events();
            self.emit(events);
        }
        match directive {
            Directive::Wait(duration) => Next::Wait(duration),
            Directive::AwaitChoice(message_id) => {
                let (reply, receiver) = oneshot::channel();
                if let Some(active) = control.active.as_mut() {
                    active.pending = Some(PendingChoice { message_id, reply });
                }
                Next::Await(receiver)
            }
            Directive::Stop => {
                if let Some(active) = control.active.take() {
                    info!(run_id = %active.machine.run_id(), "playback finished");
                }
                Next::Stop
            }
        }
    }

    /// Cancels the active run, if any. The pending decision is dropped with
    /// it, which also wakes the run task.
    fn cancel_locked(&self, control: &mut Control) -> Option<Uuid> {
        let mut active = control.active.take()?;
        active.token.cancel();
        active.machine.cancel();
        self.state.send_replace(active.machine.snapshot());
        let events = active.machine.take_events();
        self.emit(events);

        let run_id = active.machine.run_id();
        info!(%run_id, "playback cancelled");
        Some(run_id)
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("config", &self.config)
            .field("snapshot", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Drives playback runs over a script.
///
/// At most one run is active. Starting a new run cancels the previous one;
/// dropping the driver cancels the active run.
pub struct PlaybackDriver {
    shared: Arc<Shared>,
}

impl PlaybackDriver {
    /// Creates a driver that waits with `timer` and stamps runs with `clock`.
    #[must_use]
    pub fn new(timer: Arc<dyn Timer>, clock: Arc<dyn Clock>, config: PlaybackConfig) -> Self {
        let (state, _) = watch::channel(PlaybackSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                control: Mutex::new(Control::default()),
                state,
                events,
                timer,
                clock,
                config,
            }),
        }
    }

    /// Starts a run from the first message of `script`, cancelling any run
    /// in flight. Returns `None` (and does nothing) for an empty script.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, script: Arc<Script>) -> Option<RunHandle> {
        if script.is_empty() {
            debug!("empty script; playback not started");
            return None;
        }

        let run_id = Uuid::new_v4();
        let token = CancellationToken::new();
        let machine = PlaybackMachine::new(
            run_id,
            script,
            self.shared.config,
            self.shared.clock.now(),
        );

        {
            let mut control = self.shared.control();
            self.shared.cancel_locked(&mut control);
            self.shared.state.send_replace(machine.snapshot());
            control.active = Some(ActiveRun {
                machine,
                token: token.clone(),
                pending: None,
            });
        }

        info!(%run_id, "playback started");
        tokio::spawn(drive(Arc::clone(&self.shared), run_id, token));

        Some(RunHandle {
            run_id,
            shared: Arc::downgrade(&self.shared),
        })
    }

    /// Cancels the active run. Returns false if nothing was running.
    pub fn cancel(&self) -> bool {
        let mut control = self.shared.control();
        self.shared.cancel_locked(&mut control).is_some()
    }

    /// Delivers the reader's decision for the fork `message_id`.
    ///
    /// Accepted only while the active run is suspended at exactly that
    /// fork; anything else is a stale click and is ignored. Returns whether
    /// the decision resumed the run.
    pub fn resolve_choice(&self, message_id: &MessageId, option: OptionId) -> bool {
        let mut control = self.shared.control();
        let Some(active) = control.active.as_mut() else {
            debug!(%message_id, "no active run; decision ignored");
            return false;
        };
        let Some(pending) = active
            .pending
            .take_if(|pending| pending.message_id == *message_id)
        else {
            debug!(%message_id, "run is not awaiting this fork; decision ignored");
            return false;
        };
        let Some(directive) = active.machine.choose(option) else {
            active.pending = Some(pending);
            return false;
        };

        let next = self.shared.settle(&mut control, directive);
        // The run task only goes away once the run is cancelled.
        let _ = pending.reply.send(next);
        true
    }

    /// The latest observable state.
    #[must_use]
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Returns true while a run is in progress.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.shared.state.borrow().is_playing()
    }

    /// Watches the observable state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.shared.state.subscribe()
    }

    /// Receives playback events from now on.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.shared.events.subscribe()
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for PlaybackDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackDriver")
            .field("shared", &self.shared)
            .finish()
    }
}

/// Cancellation handle for one run.
#[derive(Debug, Clone)]
pub struct RunHandle {
    run_id: Uuid,
    shared: Weak<Shared>,
}

impl RunHandle {
    /// The run this handle controls.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Cancels the run if it is still the active one. Idempotent.
    pub fn cancel(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let mut control = shared.control();
        let is_active = control
            .active
            .as_ref()
            .is_some_and(|a| a.machine.run_id() == self.run_id);
        is_active && shared.cancel_locked(&mut control).is_some()
    }
}

#[instrument(skip_all, fields(run_id = %run_id))]
async fn drive(shared: Arc<Shared>, run_id: Uuid, token: CancellationToken) {
    let mut next = shared.advance(run_id, |machine| Some(machine.step()));
    loop {
        next = match next {
            None | Some(Next::Stop) => return,
            Some(Next::Wait(duration)) => {
                tokio::select! {
                    () = token.cancelled() => return,
                    () = shared.timer.sleep(duration) => {}
                }
                shared.advance(run_id, |machine| Some(machine.step()))
            }
            Some(Next::Await(reply)) => {
                tokio::select! {
                    () = token.cancelled() => return,
                    resumed = reply => resumed.ok(),
                }
            }
        };
    }
}
