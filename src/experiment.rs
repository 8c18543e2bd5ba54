//! Tutorial state machine for the autocollimator experiment.
//!
//! The experiment is a fixed linear sequence: pick a workpiece, switch on
//! the light, read the crosshair displacement off the eyepiece, switch the
//! light off, move the reflector, and repeat until five readings are
//! recorded. Each user action is a synchronous transition guarded by the
//! current [`Step`]; actions arriving out of sequence are silent no-ops.
//!
//! Steps 2, 4 and 7 in the banner numbering are cosmetic echoes of their
//! neighbours in the original lab script. They are rendered as derived
//! hint text keyed off the current step, not as machine states.
//!
//! Mutations never leak shared state to the presentation layer: after every
//! action the owner publishes an immutable [`Snapshot`] and the GUI redraws
//! by pure projection.

use rand::Rng;
use tracing::{debug, info};

use crate::error::{AppResult, LabError};
use crate::measurement::{
    reflector_tilt_deg, Reading, Workpiece, READING_COUNT, REFLECTOR_STEP_MM,
};

/// Steps of the guided experiment, with the banner numbers they carry.
///
/// The numbering has gaps where the original lab script showed text-only
/// interstitial steps; those are derived display text, not states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Await workpiece choice (step 0).
    SelectWorkpiece,
    /// Workpiece chosen; a timer advances to the light-on step (step 1).
    WorkpieceChosen,
    /// Await the light source being switched on (step 3).
    AwaitLightOn,
    /// Light on, eyepiece open; await the displacement entry (step 5).
    AwaitDeviation,
    /// Reading recorded; await the light being switched off (step 6).
    ReadingRecorded,
    /// Light off; await the reflector move (step 8).
    AwaitReflectorMove,
    /// All readings taken; graph available (step 9).
    Complete,
}

impl Step {
    /// Banner number for this step (zero-based, as in the lab script).
    pub fn number(self) -> u8 {
        match self {
            Step::SelectWorkpiece => 0,
            Step::WorkpieceChosen => 1,
            Step::AwaitLightOn => 3,
            Step::AwaitDeviation => 5,
            Step::ReadingRecorded => 6,
            Step::AwaitReflectorMove => 8,
            Step::Complete => 9,
        }
    }
}

/// Which rendering of the results graph is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphView {
    /// Per-position crosshair offset schematic.
    #[default]
    Crosshairs,
    /// Plotted displacement-vs-position curve.
    Curve,
}

/// Immutable view of the experiment published after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Current machine step.
    pub step: Step,
    /// Banner number of the current step.
    pub step_number: u8,
    /// Tutorial message for the current step.
    pub message: String,
    /// Secondary hint line (the collapsed cosmetic steps).
    pub hint: Option<String>,
    /// Selected workpiece, if any.
    pub workpiece: Option<Workpiece>,
    /// Whether the light source is on.
    pub light_on: bool,
    /// Whether the eyepiece close-up is displayed.
    pub viewing: bool,
    /// Count of completed readings.
    pub current_reading: usize,
    /// Recorded readings, in position order.
    pub readings: Vec<Reading>,
    /// Reflector position along the workpiece in millimeters.
    pub reflector_position_mm: i32,
    /// Expected displacement for the current reading, shown in the eyepiece.
    pub crosshair_deviation_mm: f64,
    /// Whether enough readings exist to view the graph.
    pub graph_available: bool,
    /// Active graph rendering.
    pub graph_view: GraphView,
    /// Display-only reflector tilt for the bench diagram, in degrees.
    pub reflector_tilt_deg: f64,
    /// Focal length of the instrument in millimeters.
    pub focal_length_mm: f64,
}

/// The experiment state machine.
///
/// All transitions are synchronous. The single asynchronous element, the
/// auto-advance from [`Step::WorkpieceChosen`], is driven by the owner
/// calling [`Experiment::auto_advance`] with the generation token returned
/// from [`Experiment::select_workpiece`]; a reset in between invalidates
/// the token and the stale callback becomes a no-op.
pub struct Experiment {
    focal_length_mm: f64,
    step: Step,
    workpiece: Option<Workpiece>,
    light_on: bool,
    viewing: bool,
    current_reading: usize,
    readings: Vec<Reading>,
    reflector_position_mm: i32,
    crosshair_deviation_mm: f64,
    graph_available: bool,
    graph_view: GraphView,
    flat_jitter_deg: f64,
    generation: u64,
}

impl Experiment {
    /// Creates a fresh experiment with all fields at their defaults.
    pub fn new(focal_length_mm: f64) -> Self {
        Self {
            focal_length_mm,
            step: Step::SelectWorkpiece,
            workpiece: None,
            light_on: false,
            viewing: false,
            current_reading: 0,
            readings: Vec::with_capacity(READING_COUNT),
            reflector_position_mm: 0,
            crosshair_deviation_mm: 0.0,
            graph_available: false,
            graph_view: GraphView::default(),
            flat_jitter_deg: 0.0,
            generation: 0,
        }
    }

    /// Current machine step.
    pub fn step(&self) -> Step {
        self.step
    }

    /// Generation token, bumped on every reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Selects the workpiece and enters the transient chosen step.
    ///
    /// Returns the generation token the caller must pass back to
    /// [`Experiment::auto_advance`] after the fixed delay. Ignored when the
    /// experiment has already started.
    pub fn select_workpiece(&mut self, workpiece: Workpiece) -> Option<u64> {
        if self.step != Step::SelectWorkpiece {
            debug!(step = ?self.step, "ignoring workpiece selection out of sequence");
            return None;
        }
        info!(workpiece = workpiece.label(), "workpiece selected");
        self.workpiece = Some(workpiece);
        self.step = Step::WorkpieceChosen;
        self.refresh_jitter();
        Some(self.generation)
    }

    /// Timer callback completing the workpiece-chosen step.
    ///
    /// No-ops unless the generation still matches and the machine is still
    /// in the transient step, so a timer outliving a reset changes nothing.
    /// Returns whether the state advanced.
    pub fn auto_advance(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.step != Step::WorkpieceChosen {
            debug!(generation, "stale auto-advance ignored");
            return false;
        }
        self.step = Step::AwaitLightOn;
        self.refresh_jitter();
        true
    }

    /// Toggles the light source.
    ///
    /// Switching on (step 3) opens the eyepiece view and precomputes the
    /// expected displacement for the current reading. Switching off
    /// (step 6) either queues the next reflector move or completes the
    /// experiment after the fifth reading. Any other state is a no-op.
    pub fn toggle_light(&mut self) {
        match self.step {
            Step::AwaitLightOn if !self.light_on => {
                let Some(workpiece) = self.workpiece else {
                    return;
                };
                self.light_on = true;
                self.viewing = true;
                self.crosshair_deviation_mm =
                    workpiece.expected_deviation_mm(self.current_reading);
                self.step = Step::AwaitDeviation;
                self.refresh_jitter();
                debug!(
                    reading = self.current_reading,
                    expected_mm = self.crosshair_deviation_mm,
                    "light on, eyepiece open"
                );
            }
            Step::ReadingRecorded if self.light_on => {
                self.light_on = false;
                self.step = if self.current_reading >= READING_COUNT {
                    Step::Complete
                } else {
                    Step::AwaitReflectorMove
                };
                self.refresh_jitter();
                debug!(step = ?self.step, "light off");
            }
            _ => {}
        }
    }

    /// Records the displacement entered for the current reading.
    ///
    /// The submission is accepted only when the parsed value equals the
    /// precomputed expected displacement exactly; this is the lab's
    /// pedagogical gate, not a tolerance comparison. Unparseable input is
    /// rejected the same way. Empty input and out-of-sequence calls are
    /// ignored. On success the reading is appended, the eyepiece closes,
    /// and the machine advances to the light-off step.
    pub fn submit_deviation(&mut self, raw: &str) -> AppResult<()> {
        if self.step != Step::AwaitDeviation {
            return Ok(());
        }
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }

        let expected = self.crosshair_deviation_mm;
        let value: f64 = raw.parse().map_err(|_| LabError::DeviationRejected {
            expected_mm: expected,
        })?;
        // Bit-exact comparison by design: the entered text must parse to the
        // same f64 as the canned constant.
        if value != expected {
            return Err(LabError::DeviationRejected {
                expected_mm: expected,
            });
        }

        let reading = Reading::new(self.reflector_position_mm, value, self.focal_length_mm);
        info!(
            position_mm = reading.position_mm,
            d_mm = reading.displacement_mm,
            theta_mrad = reading.theta_mrad,
            "reading recorded"
        );
        self.readings.push(reading);
        self.viewing = false;
        self.step = Step::ReadingRecorded;
        self.current_reading += 1;
        if self.current_reading >= READING_COUNT {
            self.graph_available = true;
        }
        self.refresh_jitter();
        Ok(())
    }

    /// Moves the reflector one increment and returns to the light-on step.
    pub fn move_reflector(&mut self) {
        if self.step != Step::AwaitReflectorMove || self.current_reading >= READING_COUNT {
            return;
        }
        self.reflector_position_mm += REFLECTOR_STEP_MM;
        self.step = Step::AwaitLightOn;
        self.refresh_jitter();
        debug!(position_mm = self.reflector_position_mm, "reflector moved");
    }

    /// Dismisses the eyepiece close-up without recording a reading.
    pub fn close_view(&mut self) {
        self.viewing = false;
    }

    /// Jumps to the completed step once the graph is available.
    pub fn view_graph(&mut self) {
        if self.graph_available {
            self.step = Step::Complete;
        }
    }

    /// Switches the results graph rendering.
    pub fn set_graph_view(&mut self, view: GraphView) {
        self.graph_view = view;
    }

    /// Restores all state to the initial defaults and invalidates any
    /// pending auto-advance timer.
    pub fn reset(&mut self) {
        info!("experiment reset");
        self.generation += 1;
        self.step = Step::SelectWorkpiece;
        self.workpiece = None;
        self.light_on = false;
        self.viewing = false;
        self.current_reading = 0;
        self.readings.clear();
        self.reflector_position_mm = 0;
        self.crosshair_deviation_mm = 0.0;
        self.graph_available = false;
        self.graph_view = GraphView::default();
        self.flat_jitter_deg = 0.0;
    }

    /// Builds the immutable view published to the presentation layer.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            step: self.step,
            step_number: self.step.number(),
            message: self.step_message(),
            hint: self.step_hint(),
            workpiece: self.workpiece,
            light_on: self.light_on,
            viewing: self.viewing,
            current_reading: self.current_reading,
            readings: self.readings.clone(),
            reflector_position_mm: self.reflector_position_mm,
            crosshair_deviation_mm: self.crosshair_deviation_mm,
            graph_available: self.graph_available,
            graph_view: self.graph_view,
            reflector_tilt_deg: self
                .workpiece
                .map(|w| reflector_tilt_deg(w, self.reflector_position_mm, self.flat_jitter_deg))
                .unwrap_or(0.0),
            focal_length_mm: self.focal_length_mm,
        }
    }

    /// Tutorial message shown in the step banner.
    fn step_message(&self) -> String {
        match self.step {
            Step::SelectWorkpiece => {
                "Please select a workpiece type (Flat or Tapered) to begin".to_string()
            }
            Step::WorkpieceChosen => {
                "Workpiece selected! Please switch on the light source using the button"
                    .to_string()
            }
            Step::AwaitLightOn => {
                "Please switch on the light source using the button".to_string()
            }
            Step::AwaitDeviation => {
                "Please enter the linear displacement (d) value and click Record".to_string()
            }
            Step::ReadingRecorded => format!(
                "Reading {} of {} recorded! Now switch off the light using the button",
                self.current_reading, READING_COUNT
            ),
            Step::AwaitReflectorMove => format!(
                "Light switched off! Click 'Move Reflector 5cm' for reading {} of {}",
                self.current_reading + 1,
                READING_COUNT
            ),
            Step::Complete => {
                "All readings complete! Please click 'View Graph' to see results".to_string()
            }
        }
    }

    /// Secondary hint line covering the cosmetic interstitial steps.
    fn step_hint(&self) -> Option<String> {
        match self.step {
            Step::AwaitLightOn => Some(format!(
                "Focal length is set to {:.0} mm",
                self.focal_length_mm
            )),
            Step::AwaitDeviation => {
                Some("Crosshairs are now visible in the eyepiece view".to_string())
            }
            _ => None,
        }
    }

    /// Regenerates the cosmetic flat-workpiece tilt once per step change.
    fn refresh_jitter(&mut self) {
        self.flat_jitter_deg = rand::thread_rng().gen_range(-0.15..0.15);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::DEFAULT_FOCAL_LENGTH_MM;

    fn experiment() -> Experiment {
        Experiment::new(DEFAULT_FOCAL_LENGTH_MM)
    }

    /// Drives one complete reading: light on, submit the expected value,
    /// light off.
    fn take_reading(exp: &mut Experiment) {
        exp.toggle_light();
        assert_eq!(exp.step(), Step::AwaitDeviation);
        let expected = exp.snapshot().crosshair_deviation_mm;
        exp.submit_deviation(&format!("{expected}"))
            .expect("expected value must be accepted");
        assert_eq!(exp.step(), Step::ReadingRecorded);
        exp.toggle_light();
    }

    #[test]
    fn test_initial_state() {
        let exp = experiment();
        let snap = exp.snapshot();
        assert_eq!(snap.step, Step::SelectWorkpiece);
        assert_eq!(snap.step_number, 0);
        assert!(snap.workpiece.is_none());
        assert!(snap.readings.is_empty());
        assert_eq!(snap.reflector_position_mm, 0);
        assert!(!snap.light_on);
        assert!(!snap.viewing);
    }

    #[test]
    fn test_select_then_auto_advance() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Flat).expect("accepted");
        assert_eq!(exp.step(), Step::WorkpieceChosen);

        // Selecting again while underway is ignored.
        assert!(exp.select_workpiece(Workpiece::Tapered).is_none());
        assert_eq!(exp.snapshot().workpiece, Some(Workpiece::Flat));

        assert!(exp.auto_advance(token));
        assert_eq!(exp.step(), Step::AwaitLightOn);

        // A second fire of the same timer is a no-op.
        assert!(!exp.auto_advance(token));
    }

    #[test]
    fn test_stale_auto_advance_after_reset() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Flat).expect("accepted");
        exp.reset();
        assert!(!exp.auto_advance(token));
        assert_eq!(exp.step(), Step::SelectWorkpiece);
        assert!(exp.snapshot().workpiece.is_none());
    }

    #[test]
    fn test_first_flat_reading_scenario() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Flat).expect("accepted");
        exp.auto_advance(token);

        exp.toggle_light();
        let snap = exp.snapshot();
        assert_eq!(snap.step, Step::AwaitDeviation);
        assert!(snap.light_on);
        assert!(snap.viewing);
        assert_eq!(snap.crosshair_deviation_mm, 0.002);

        exp.submit_deviation("0.002").expect("exact value accepted");
        let snap = exp.snapshot();
        assert_eq!(snap.step, Step::ReadingRecorded);
        assert!(!snap.viewing);
        assert_eq!(snap.readings.len(), 1);
        let reading = snap.readings[0];
        assert_eq!(reading.position_mm, 0);
        assert_eq!(reading.displacement_mm, 0.002);
        assert_eq!(reading.theta_mrad, 0.0067);
        assert_eq!(format!("{:.4}", reading.theta_mrad), "0.0067");
    }

    #[test]
    fn test_wrong_deviation_rejected_without_mutation() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Flat).expect("accepted");
        exp.auto_advance(token);
        exp.toggle_light();

        let err = exp.submit_deviation("0.003").expect_err("must reject");
        assert!(err.to_string().contains("0.002"));

        let snap = exp.snapshot();
        assert_eq!(snap.step, Step::AwaitDeviation);
        assert!(snap.readings.is_empty());
        assert!(snap.viewing);
    }

    #[test]
    fn test_unparseable_deviation_rejected_like_mismatch() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Tapered).expect("accepted");
        exp.auto_advance(token);
        exp.toggle_light();

        let err = exp.submit_deviation("abc").expect_err("must reject");
        assert!(err.to_string().contains("0.005"));
        assert_eq!(exp.step(), Step::AwaitDeviation);
        assert!(exp.snapshot().readings.is_empty());
    }

    #[test]
    fn test_empty_input_is_ignored() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Flat).expect("accepted");
        exp.auto_advance(token);
        exp.toggle_light();

        exp.submit_deviation("   ").expect("no-op");
        assert_eq!(exp.step(), Step::AwaitDeviation);
    }

    #[test]
    fn test_full_flat_run() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Flat).expect("accepted");
        exp.auto_advance(token);

        for i in 0..READING_COUNT {
            take_reading(&mut exp);
            // Reflector position after reading i equals 50 * i.
            assert_eq!(
                exp.snapshot().readings[i].position_mm,
                50 * i as i32
            );
            if i < READING_COUNT - 1 {
                assert_eq!(exp.step(), Step::AwaitReflectorMove);
                exp.move_reflector();
                assert_eq!(exp.step(), Step::AwaitLightOn);
            }
        }

        // Fifth light-off skips the reflector-move step entirely.
        let snap = exp.snapshot();
        assert_eq!(snap.step, Step::Complete);
        assert!(snap.graph_available);

        let d: Vec<f64> = snap.readings.iter().map(|r| r.displacement_mm).collect();
        assert_eq!(d, vec![0.002, 0.002, 0.003, 0.002, 0.003]);
        for r in &snap.readings {
            assert_eq!(
                r.theta_mrad,
                crate::measurement::round_mrad(r.displacement_mm / 300.0 * 1000.0)
            );
        }
    }

    #[test]
    fn test_full_tapered_run() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Tapered).expect("accepted");
        exp.auto_advance(token);

        for i in 0..READING_COUNT {
            take_reading(&mut exp);
            if i < READING_COUNT - 1 {
                exp.move_reflector();
            }
        }

        let snap = exp.snapshot();
        let d: Vec<f64> = snap.readings.iter().map(|r| r.displacement_mm).collect();
        assert_eq!(d, vec![0.005, 0.013, 0.022, 0.031, 0.040]);
        assert_eq!(snap.reflector_position_mm, 200);
    }

    #[test]
    fn test_invariants_hold_throughout_run() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Tapered).expect("accepted");
        exp.auto_advance(token);

        for i in 0..READING_COUNT {
            let snap = exp.snapshot();
            assert_eq!(snap.readings.len(), snap.current_reading);
            assert_eq!(snap.reflector_position_mm, 50 * i as i32);
            take_reading(&mut exp);
            if i < READING_COUNT - 1 {
                exp.move_reflector();
            }
        }
    }

    #[test]
    fn test_out_of_sequence_actions_are_noops() {
        let mut exp = experiment();

        // Nothing is valid before a workpiece is chosen.
        exp.toggle_light();
        exp.move_reflector();
        exp.view_graph();
        exp.submit_deviation("0.002").expect("silent no-op");
        let snap = exp.snapshot();
        assert_eq!(snap.step, Step::SelectWorkpiece);
        assert!(!snap.light_on);
        assert!(snap.readings.is_empty());

        // Reflector cannot move while awaiting the light.
        let token = exp.select_workpiece(Workpiece::Flat).expect("accepted");
        exp.auto_advance(token);
        exp.move_reflector();
        assert_eq!(exp.snapshot().reflector_position_mm, 0);
    }

    #[test]
    fn test_close_view_keeps_reading_pending() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Flat).expect("accepted");
        exp.auto_advance(token);
        exp.toggle_light();

        exp.close_view();
        let snap = exp.snapshot();
        assert!(!snap.viewing);
        // Still awaiting the entry; the reading was not recorded.
        assert_eq!(snap.step, Step::AwaitDeviation);
        assert!(snap.readings.is_empty());

        exp.submit_deviation("0.002").expect("still accepted");
        assert_eq!(exp.step(), Step::ReadingRecorded);
    }

    #[test]
    fn test_view_graph_gated_on_availability() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Flat).expect("accepted");
        exp.auto_advance(token);
        exp.view_graph();
        assert_eq!(exp.step(), Step::AwaitLightOn);

        for i in 0..READING_COUNT {
            take_reading(&mut exp);
            if i < READING_COUNT - 1 {
                exp.move_reflector();
            }
        }
        assert_eq!(exp.step(), Step::Complete);
        exp.set_graph_view(GraphView::Curve);
        assert_eq!(exp.snapshot().graph_view, GraphView::Curve);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut exp = experiment();
        let token = exp.select_workpiece(Workpiece::Tapered).expect("accepted");
        exp.auto_advance(token);
        take_reading(&mut exp);
        exp.move_reflector();

        exp.reset();
        let snap = exp.snapshot();
        assert_eq!(snap.step, Step::SelectWorkpiece);
        assert!(snap.workpiece.is_none());
        assert!(snap.readings.is_empty());
        assert_eq!(snap.reflector_position_mm, 0);
        assert!(!snap.light_on);
        assert!(!snap.graph_available);
        assert_eq!(snap.graph_view, GraphView::Crosshairs);
    }
}
