//! Shared application handle around the experiment state machine.
//!
//! [`LabApp`] owns the [`Experiment`] behind an `Arc<Mutex<..>>` and is the
//! only writer. Every mutation publishes a fresh immutable
//! [`Snapshot`](crate::experiment::Snapshot) over a `tokio::sync::broadcast`
//! channel; the GUI subscribes and drains pending snapshots once per frame.
//!
//! The handle also owns the one piece of scheduled work in the whole
//! application: the auto-advance after a workpiece is selected. The timer
//! task carries the generation token returned by the state machine and the
//! callback re-checks its preconditions under the lock, so a timer that
//! outlives a reset is harmless.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::warn;

use crate::error::AppResult;
use crate::experiment::{Experiment, GraphView, Snapshot};
use crate::measurement::Workpiece;

/// Capacity of the snapshot broadcast channel. Snapshots are tiny and the
/// GUI drains every frame, so a small backlog suffices.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 32;

/// Cloneable handle to the running experiment.
#[derive(Clone)]
pub struct LabApp {
    experiment: Arc<Mutex<Experiment>>,
    snapshots: broadcast::Sender<Snapshot>,
    runtime: tokio::runtime::Handle,
    auto_advance_delay: Duration,
}

impl LabApp {
    /// Creates the handle around a fresh experiment.
    pub fn new(
        focal_length_mm: f64,
        auto_advance_delay: Duration,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            experiment: Arc::new(Mutex::new(Experiment::new(focal_length_mm))),
            snapshots,
            runtime,
            auto_advance_delay,
        }
    }

    /// Subscribes to published state snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Current state snapshot, for initial paint and for tests.
    pub fn snapshot(&self) -> Snapshot {
        self.with_experiment(|exp| exp.snapshot())
    }

    /// Selects the workpiece and schedules the timed advance to the
    /// light-on step.
    pub fn select_workpiece(&self, workpiece: Workpiece) {
        let token = self.with_experiment(|exp| exp.select_workpiece(workpiece));
        self.publish();

        let Some(generation) = token else {
            return;
        };
        let app = self.clone();
        let delay = self.auto_advance_delay;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let advanced = app.with_experiment(|exp| exp.auto_advance(generation));
            if advanced {
                app.publish();
            }
        });
    }

    /// Toggles the light source.
    pub fn toggle_light(&self) {
        self.with_experiment(|exp| exp.toggle_light());
        self.publish();
    }

    /// Submits the displacement entry for the current reading.
    ///
    /// Errors are returned to the caller for inline display; the state is
    /// untouched on rejection.
    pub fn submit_deviation(&self, raw: &str) -> AppResult<()> {
        let result = self.with_experiment(|exp| exp.submit_deviation(raw));
        self.publish();
        result
    }

    /// Moves the reflector to the next position.
    pub fn move_reflector(&self) {
        self.with_experiment(|exp| exp.move_reflector());
        self.publish();
    }

    /// Dismisses the eyepiece close-up.
    pub fn close_view(&self) {
        self.with_experiment(|exp| exp.close_view());
        self.publish();
    }

    /// Opens the results graph once available.
    pub fn view_graph(&self) {
        self.with_experiment(|exp| exp.view_graph());
        self.publish();
    }

    /// Switches the results graph rendering.
    pub fn set_graph_view(&self, view: GraphView) {
        self.with_experiment(|exp| exp.set_graph_view(view));
        self.publish();
    }

    /// Resets the experiment to its initial state.
    pub fn reset(&self) {
        self.with_experiment(|exp| exp.reset());
        self.publish();
    }

    /// Runs a closure with exclusive access to the state machine.
    fn with_experiment<R>(&self, f: impl FnOnce(&mut Experiment) -> R) -> R {
        match self.experiment.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => {
                // A panic while holding the lock cannot leave the small
                // state machine logically broken; keep serving.
                warn!("experiment lock poisoned; continuing with inner state");
                f(&mut poisoned.into_inner())
            }
        }
    }

    /// Publishes the current snapshot to all subscribers.
    fn publish(&self) {
        // Send fails only when no subscriber exists yet (e.g. in tests).
        let _ = self.snapshots.send(self.snapshot());
    }
}
