//! The eframe/egui implementation for the GUI.
//!
//! The GUI is a pure projection of the experiment state: it holds the most
//! recent [`Snapshot`] published by the [`LabApp`] handle and redraws from
//! it every frame, draining any newer snapshots from the broadcast channel
//! first. User actions go back through the handle; no experiment state is
//! mutated from the presentation layer.
//!
//! ## Layout
//!
//! - `TopBottomPanel` (top): step banner with the tutorial message, hint
//!   line, and the inline rejection message after a bad submission.
//! - `SidePanel` (right): control panel (workpiece choice, light toggle,
//!   displacement entry, reflector move, reset), the measurement principle
//!   box, the readings table, and the graph panel once the run completes.
//! - `CentralPanel`: the bench overview diagram, or the eyepiece close-up
//!   while a reading is being taken.
//!
//! ## Modules
//!
//! - `bench`: bench overview diagram (instrument, workpiece, beam,
//!   reflector).
//! - `eyepiece`: eyepiece close-up with the fixed reticle and the displaced
//!   reflected image.
//! - `results`: readings table and the two results-graph renderings.

mod bench;
mod eyepiece;
mod results;

use eframe::egui;
use tokio::sync::broadcast;

use crate::app::LabApp;
use crate::experiment::{Snapshot, Step};
use crate::measurement::Workpiece;

/// The main GUI struct.
pub struct LabGui {
    app: LabApp,
    snapshot_rx: broadcast::Receiver<Snapshot>,
    snapshot: Snapshot,
    /// Transient displacement entry text, cleared after each reading.
    deviation_input: String,
    /// Inline rejection message from the last failed submission.
    submit_error: Option<String>,
}

impl LabGui {
    /// Creates the GUI around an application handle.
    pub fn new(_cc: &eframe::CreationContext<'_>, app: LabApp) -> Self {
        let snapshot_rx = app.subscribe();
        let snapshot = app.snapshot();
        Self {
            app,
            snapshot_rx,
            snapshot,
            deviation_input: String::new(),
            submit_error: None,
        }
    }

    /// Drains pending snapshots, keeping only the most recent one.
    fn update_snapshot(&mut self) {
        while let Ok(snapshot) = self.snapshot_rx.try_recv() {
            self.snapshot = snapshot;
        }

        // Transient entry state does not survive leaving the entry step.
        if self.snapshot.step != Step::AwaitDeviation {
            self.submit_error = None;
        }
        if self.snapshot.step == Step::SelectWorkpiece {
            self.deviation_input.clear();
        }
    }

    fn step_banner(&self, ui: &mut egui::Ui) {
        let snap = &self.snapshot;
        ui.heading(format!("Step {}", snap.step_number + 1));
        ui.label(&snap.message);
        if let Some(hint) = &snap.hint {
            ui.weak(hint);
        }
        if snap.step == Step::Complete {
            ui.weak("Scroll down in the right panel to view the graph.");
        }
        if let Some(error) = &self.submit_error {
            ui.colored_label(egui::Color32::RED, error);
        }
    }

    fn control_panel(&mut self, ui: &mut egui::Ui) {
        let snap = self.snapshot.clone();

        ui.heading("Control Panel");
        ui.separator();

        ui.label("Select Workpiece:");
        ui.horizontal(|ui| {
            let selectable = snap.step == Step::SelectWorkpiece;
            for (workpiece, label) in [(Workpiece::Flat, "Flat"), (Workpiece::Tapered, "Tapered")]
            {
                let selected = snap.workpiece == Some(workpiece);
                let button = egui::Button::new(label).selected(selected);
                if ui.add_enabled(selectable, button).clicked() {
                    self.app.select_workpiece(workpiece);
                }
            }
        });

        if snap.step_number >= 3 {
            ui.add_space(8.0);
            let enabled = matches!(snap.step, Step::AwaitLightOn | Step::ReadingRecorded);
            let label = if snap.step == Step::ReadingRecorded {
                "Switch OFF Light"
            } else if snap.light_on {
                "Light ON"
            } else {
                "Switch ON Light"
            };
            if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                self.app.toggle_light();
            }
        }

        if snap.step == Step::AwaitDeviation && snap.viewing {
            ui.add_space(8.0);
            ui.label("Linear Displacement d (mm):");
            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.deviation_input)
                        .hint_text("Enter d")
                        .desired_width(120.0),
                );
                let entered =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Record").clicked() || entered {
                    match self.app.submit_deviation(&self.deviation_input) {
                        Ok(()) => {
                            self.deviation_input.clear();
                            self.submit_error = None;
                        }
                        Err(err) => self.submit_error = Some(err.to_string()),
                    }
                }
            });
        }

        if snap.step == Step::AwaitReflectorMove {
            ui.add_space(8.0);
            if ui.button("Move Reflector 5cm →").clicked() {
                self.app.move_reflector();
            }
        }

        if snap.step == Step::Complete {
            ui.add_space(8.0);
            if ui.button("⟲ Reset Experiment").clicked() {
                self.app.reset();
            }
        }

        ui.add_space(12.0);
        ui.separator();
        ui.heading("Readings & Calculations");
        results::principle_box(ui, &snap);
        ui.add_space(8.0);
        results::readings_table(ui, &snap);

        if snap.graph_available && snap.step != Step::Complete {
            ui.add_space(8.0);
            if ui.button("View Graph").clicked() {
                self.app.view_graph();
            }
        }

        if snap.step == Step::Complete && !snap.readings.is_empty() {
            ui.add_space(12.0);
            ui.separator();
            results::graph_panel(ui, &self.app, &snap);
        }
    }
}

impl eframe::App for LabGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_snapshot();

        egui::TopBottomPanel::top("step_banner").show(ctx, |ui| {
            self.step_banner(ui);
        });

        egui::SidePanel::right("control_panel")
            .resizable(true)
            .min_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.control_panel(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.snapshot.viewing {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::TOP), |ui| {
                    if ui.button("Close View").clicked() {
                        self.app.close_view();
                    }
                });
                eyepiece::render(ui, &self.snapshot);
            } else {
                bench::render(ui, &self.snapshot);
            }
        });

        // Keep draining snapshots even while the user is idle (the
        // auto-advance timer mutates state without any input event).
        ctx.request_repaint();
    }
}
