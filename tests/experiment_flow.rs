//! End-to-end tests of the guided experiment flow through the application
//! handle, covering both workpiece types, the exact-match entry gate, and
//! the auto-advance timer lifecycle.

use std::time::Duration;

use autocollimator_lab::app::LabApp;
use autocollimator_lab::experiment::{GraphView, Snapshot, Step};
use autocollimator_lab::measurement::{Workpiece, DEFAULT_FOCAL_LENGTH_MM, READING_COUNT};

/// Short auto-advance delay so the tests do not wait out the tutorial pace.
const TEST_DELAY: Duration = Duration::from_millis(10);

fn lab() -> LabApp {
    LabApp::new(
        DEFAULT_FOCAL_LENGTH_MM,
        TEST_DELAY,
        tokio::runtime::Handle::current(),
    )
}

/// Selects the workpiece and waits for the timed advance to the light-on
/// step.
async fn start(app: &LabApp, workpiece: Workpiece) {
    app.select_workpiece(workpiece);
    tokio::time::sleep(TEST_DELAY * 10).await;
    assert_eq!(app.snapshot().step, Step::AwaitLightOn);
}

/// Runs one reading cycle: light on, submit the expected value, light off.
fn take_reading(app: &LabApp) -> Snapshot {
    app.toggle_light();
    let snap = app.snapshot();
    assert_eq!(snap.step, Step::AwaitDeviation);
    app.submit_deviation(&format!("{}", snap.crosshair_deviation_mm))
        .expect("exact value must be accepted");
    app.toggle_light();
    app.snapshot()
}

#[tokio::test]
async fn full_flat_run_records_expected_values() {
    let app = lab();
    start(&app, Workpiece::Flat).await;

    for i in 0..READING_COUNT {
        let snap = take_reading(&app);
        assert_eq!(snap.readings.len(), i + 1);
        if i < READING_COUNT - 1 {
            assert_eq!(snap.step, Step::AwaitReflectorMove);
            app.move_reflector();
        }
    }

    let snap = app.snapshot();
    assert_eq!(snap.step, Step::Complete);
    assert!(snap.graph_available);

    let d: Vec<f64> = snap.readings.iter().map(|r| r.displacement_mm).collect();
    assert_eq!(d, vec![0.002, 0.002, 0.003, 0.002, 0.003]);

    for (i, reading) in snap.readings.iter().enumerate() {
        assert_eq!(reading.position_mm, 50 * i as i32);
        // theta = d / (2 * 150) * 1000, recorded to 4 decimal places.
        let expected = (reading.displacement_mm / 300.0 * 1000.0 * 10_000.0).round() / 10_000.0;
        assert_eq!(reading.theta_mrad, expected);
    }
    assert_eq!(format!("{:.4}", snap.readings[0].theta_mrad), "0.0067");
}

#[tokio::test]
async fn full_tapered_run_records_expected_values() {
    let app = lab();
    start(&app, Workpiece::Tapered).await;

    for i in 0..READING_COUNT {
        take_reading(&app);
        if i < READING_COUNT - 1 {
            app.move_reflector();
        }
    }

    let snap = app.snapshot();
    let d: Vec<f64> = snap.readings.iter().map(|r| r.displacement_mm).collect();
    assert_eq!(d, vec![0.005, 0.013, 0.022, 0.031, 0.040]);
    assert_eq!(snap.reflector_position_mm, 200);
    // The fifth light-off skipped the reflector-move step.
    assert_eq!(snap.step, Step::Complete);
}

#[tokio::test]
async fn wrong_value_is_rejected_and_state_unchanged() {
    let app = lab();
    start(&app, Workpiece::Flat).await;
    app.toggle_light();

    let before = app.snapshot();
    let err = app
        .submit_deviation("0.003")
        .expect_err("0.003 is not the expected 0.002");
    assert!(err.to_string().contains("0.002"));

    let after = app.snapshot();
    assert_eq!(after.step, before.step);
    assert_eq!(after.readings, before.readings);
    assert!(after.readings.is_empty());
}

#[tokio::test]
async fn reset_restores_defaults_from_mid_run() {
    let app = lab();
    start(&app, Workpiece::Tapered).await;
    take_reading(&app);
    app.move_reflector();

    app.reset();
    let snap = app.snapshot();
    assert_eq!(snap.step, Step::SelectWorkpiece);
    assert!(snap.workpiece.is_none());
    assert!(snap.readings.is_empty());
    assert_eq!(snap.reflector_position_mm, 0);
}

#[tokio::test]
async fn stale_auto_advance_timer_is_inert_after_reset() {
    let app = lab();
    app.select_workpiece(Workpiece::Flat);
    app.reset();

    // Let the original timer fire against the reset state.
    tokio::time::sleep(TEST_DELAY * 20).await;
    let snap = app.snapshot();
    assert_eq!(snap.step, Step::SelectWorkpiece);
    assert!(snap.workpiece.is_none());
}

#[tokio::test]
async fn close_view_then_graph_toggle() {
    let app = lab();
    start(&app, Workpiece::Tapered).await;

    // Dismissing the eyepiece does not record anything.
    app.toggle_light();
    app.close_view();
    let snap = app.snapshot();
    assert!(!snap.viewing);
    assert_eq!(snap.step, Step::AwaitDeviation);
    assert!(snap.readings.is_empty());

    app.submit_deviation("0.005").expect("accepted");
    app.toggle_light();
    for _ in 1..READING_COUNT {
        app.move_reflector();
        take_reading(&app);
    }

    let snap = app.snapshot();
    assert_eq!(snap.step, Step::Complete);
    assert_eq!(snap.graph_view, GraphView::Crosshairs);
    app.set_graph_view(GraphView::Curve);
    assert_eq!(app.snapshot().graph_view, GraphView::Curve);
}
