//! Readings table and results graphs.
//!
//! Everything here is a pure projection of the snapshot: the measurement
//! principle box, the table of recorded readings, and the two alternate
//! graph renderings once all readings are collected. The view-mode toggle
//! is the only interactive element and routes back through the handle.

use eframe::egui::{self, emath, pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Shape, Stroke};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::app::LabApp;
use crate::experiment::{GraphView, Snapshot};
use crate::measurement::Workpiece;

/// Shows the measurement principle and the session focal length.
pub fn principle_box(ui: &mut egui::Ui, snap: &Snapshot) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.strong("Principle:");
        ui.monospace("d = 2 × f × θ");
        ui.monospace("θ = d / (2 × f)");
        ui.label(format!("Focal Length (f) = {:.0} mm", snap.focal_length_mm));
    });
}

/// Table of recorded readings.
pub fn readings_table(ui: &mut egui::Ui, snap: &Snapshot) {
    egui::Grid::new("readings_grid")
        .striped(true)
        .min_col_width(60.0)
        .show(ui, |ui| {
            ui.strong("No.");
            ui.strong("Pos (mm)");
            ui.strong("d (mm)");
            ui.strong("θ (mrad)");
            ui.end_row();

            for (i, reading) in snap.readings.iter().enumerate() {
                ui.label(format!("{}", i + 1));
                ui.label(format!("{}", reading.position_mm));
                ui.label(format!("{}", reading.displacement_mm));
                ui.label(format!("{:.4}", reading.theta_mrad));
                ui.end_row();
            }
        });
}

/// Graph analysis panel with the two-view toggle.
pub fn graph_panel(ui: &mut egui::Ui, app: &LabApp, snap: &Snapshot) {
    ui.horizontal(|ui| {
        ui.heading("Graph Analysis");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            for (view, label) in [(GraphView::Curve, "Curve"), (GraphView::Crosshairs, "Crosshairs")]
            {
                if ui
                    .selectable_label(snap.graph_view == view, label)
                    .clicked()
                {
                    app.set_graph_view(view);
                }
            }
        });
    });

    match snap.graph_view {
        GraphView::Crosshairs => crosshairs_schematic(ui, snap),
        GraphView::Curve => deviation_curve(ui, snap),
    }
}

/// Per-position schematic of the reticle against the reflected image.
fn crosshairs_schematic(ui: &mut egui::Ui, snap: &Snapshot) {
    const SPACE_W: f32 = 800.0;
    const SPACE_H: f32 = 250.0;
    const BASELINE_Y: f32 = 125.0;
    // Design-space units per millimeter of deviation.
    const MM_TO_UNITS: f32 = 20.0;

    let width = ui.available_width();
    let (response, painter) =
        ui.allocate_painter(vec2(width, width * SPACE_H / SPACE_W), egui::Sense::hover());
    painter.rect_filled(response.rect, 4.0, Color32::from_gray(0x16));

    let to_screen = emath::RectTransform::from_to(
        Rect::from_min_size(Pos2::ZERO, vec2(SPACE_W, SPACE_H)),
        response.rect,
    );
    let scale = response.rect.width() / SPACE_W;
    let p = |x: f32, y: f32| to_screen * pos2(x, y);
    let s = |w: f32| w * scale;

    let green = Color32::from_rgb(0, 255, 0);
    let red = Color32::from_rgb(255, 51, 51);

    // Workpiece axis.
    painter.line_segment(
        [p(50.0, BASELINE_Y), p(750.0, BASELINE_Y)],
        Stroke::new(s(3.0), Color32::from_rgb(255, 102, 0)),
    );

    for (i, reading) in snap.readings.iter().enumerate() {
        let x = 100.0 + i as f32 * 150.0;
        let dev = reading.displacement_mm as f32 * MM_TO_UNITS;

        painter.extend(Shape::dashed_line(
            &[p(x, 10.0), p(x, 240.0)],
            Stroke::new(s(1.0), Color32::from_gray(0x66)),
            s(3.0),
            s(3.0),
        ));
        painter.text(
            p(x - 15.0, 240.0),
            Align2::LEFT_TOP,
            format!("{}mm", reading.position_mm),
            FontId::proportional(s(11.0)),
            Color32::WHITE,
        );

        // Fixed reticle.
        painter.line_segment(
            [p(x - 30.0, BASELINE_Y), p(x + 30.0, BASELINE_Y)],
            Stroke::new(s(2.0), green),
        );
        painter.line_segment([p(x, 95.0), p(x, 155.0)], Stroke::new(s(2.0), green));

        // Reflected image, offset by the recorded deviation.
        painter.line_segment(
            [p(x - 30.0, BASELINE_Y + dev), p(x + 30.0, BASELINE_Y + dev)],
            Stroke::new(s(2.0), red),
        );
        painter.line_segment(
            [p(x + dev, 95.0), p(x + dev, 155.0)],
            Stroke::new(s(2.0), red),
        );

        // The offset is invisible at this scale for flat readings; only
        // annotate where it separates from the reticle.
        if dev.abs() > 1.0 {
            painter.extend(Shape::dashed_line(
                &[p(x, BASELINE_Y), p(x, BASELINE_Y + dev)],
                Stroke::new(s(1.0), Color32::YELLOW),
                s(2.0),
                s(2.0),
            ));
            painter.text(
                p(x + 35.0, BASELINE_Y + dev / 2.0),
                Align2::LEFT_CENTER,
                format!("{}mm", reading.displacement_mm),
                FontId::proportional(s(10.0)),
                Color32::YELLOW,
            );
        }
    }

    // Legend.
    painter.rect_filled(
        Rect::from_min_size(p(600.0, 20.0), vec2(s(150.0), s(50.0))),
        s(5.0),
        Color32::from_rgba_unmultiplied(0x11, 0x11, 0x11, 200),
    );
    painter.line_segment([p(610.0, 35.0), p(640.0, 35.0)], Stroke::new(s(2.0), green));
    painter.text(
        p(645.0, 30.0),
        Align2::LEFT_TOP,
        "Fixed Reticle",
        FontId::proportional(s(10.0)),
        green,
    );
    painter.line_segment([p(610.0, 55.0), p(640.0, 55.0)], Stroke::new(s(2.0), red));
    painter.text(
        p(645.0, 50.0),
        Align2::LEFT_TOP,
        "Reflected Image",
        FontId::proportional(s(10.0)),
        red,
    );
}

/// Plotted displacement-vs-position curve.
fn deviation_curve(ui: &mut egui::Ui, snap: &Snapshot) {
    let points: Vec<[f64; 2]> = snap
        .readings
        .iter()
        .map(|r| [f64::from(r.position_mm), r.displacement_mm])
        .collect();

    let name = snap
        .workpiece
        .map(Workpiece::label)
        .unwrap_or("Deviation");
    let color = match snap.workpiece {
        Some(Workpiece::Tapered) => Color32::from_rgb(255, 102, 0),
        _ => Color32::from_rgb(0, 255, 0),
    };

    ui.label("Crosshair Deviation vs Position");
    Plot::new("deviation_curve")
        .x_axis_label("Position (mm)")
        .y_axis_label("Deviation (mm)")
        .legend(Legend::default())
        .include_y(0.0)
        .view_aspect(1.5)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .color(color)
                    .width(2.5)
                    .name(name),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .color(color)
                    .radius(4.0)
                    .name(name),
            );
        });
}
