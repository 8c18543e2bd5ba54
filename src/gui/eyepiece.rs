//! Eyepiece close-up.
//!
//! Renders the view through the autocollimator eyepiece in a 400×400 design
//! space: the fixed green reticle, the red reflected-image crosshair
//! displaced by the current expected deviation, a graduated scale in 0.5 mm
//! steps, and the numeric readout the student is asked to enter.

use eframe::egui::{self, emath, pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Stroke};

use crate::experiment::Snapshot;

/// Side length of the square design space.
const SPACE: f32 = 400.0;

/// Design-space units per millimeter of crosshair displacement.
const MM_TO_UNITS: f32 = 15.0;

const RETICLE_GREEN: Color32 = Color32::from_rgb(0, 255, 0);
const IMAGE_RED: Color32 = Color32::from_rgb(255, 51, 51);

/// Renders the eyepiece close-up into the remaining panel space.
pub fn render(ui: &mut egui::Ui, snap: &Snapshot) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
    painter.rect_filled(response.rect, 8.0, Color32::BLACK);

    let scale = (response.rect.width() / SPACE)
        .min(response.rect.height() / SPACE)
        .max(0.05);
    let canvas_rect =
        Rect::from_center_size(response.rect.center(), vec2(SPACE * scale, SPACE * scale));
    let to_screen = emath::RectTransform::from_to(
        Rect::from_min_size(Pos2::ZERO, vec2(SPACE, SPACE)),
        canvas_rect,
    );
    let p = |x: f32, y: f32| to_screen * pos2(x, y);
    let s = |w: f32| w * scale;

    // Field stop and reference rings.
    painter.circle_filled(p(200.0, 200.0), s(150.0), Color32::from_gray(0x0a));
    painter.circle_stroke(
        p(200.0, 200.0),
        s(150.0),
        Stroke::new(s(4.0), Color32::from_gray(0x33)),
    );
    painter.circle_stroke(
        p(200.0, 200.0),
        s(145.0),
        Stroke::new(s(1.0), Color32::from_gray(0x44)),
    );
    for radius in [120.0, 80.0, 40.0] {
        painter.circle_stroke(
            p(200.0, 200.0),
            s(radius),
            Stroke::new(s(1.0), Color32::from_gray(0x22)),
        );
    }

    // Fixed reticle.
    let reticle = Stroke::new(s(2.5), RETICLE_GREEN);
    painter.line_segment([p(50.0, 200.0), p(350.0, 200.0)], reticle);
    painter.line_segment([p(200.0, 50.0), p(200.0, 350.0)], reticle);
    painter.circle_filled(p(200.0, 200.0), s(3.0), RETICLE_GREEN);

    // Reflected image, displaced by the expected deviation.
    let offset = snap.crosshair_deviation_mm as f32 * MM_TO_UNITS;
    let image = Stroke::new(s(2.5), IMAGE_RED);
    painter.line_segment([p(50.0, 200.0 + offset), p(350.0, 200.0 + offset)], image);
    painter.line_segment([p(200.0 + offset, 50.0), p(200.0 + offset, 350.0)], image);
    painter.circle_filled(p(200.0 + offset, 200.0 + offset), s(3.0), IMAGE_RED);

    // Graduated scale, 0.5 mm per division.
    for i in -4..=4 {
        let y = 200.0 + i as f32 * 20.0;
        painter.line_segment(
            [p(180.0, y), p(220.0, y)],
            Stroke::new(s(1.0), Color32::from_gray(0x66)),
        );
        painter.text(
            p(225.0, y - 4.0),
            Align2::LEFT_TOP,
            format!("{:.1}", -i as f32 * 0.5),
            FontId::proportional(s(9.0)),
            Color32::from_gray(0x88),
        );
    }

    // Legend.
    painter.rect_filled(
        Rect::from_min_size(p(130.0, 360.0), vec2(s(150.0), s(35.0))),
        s(5.0),
        Color32::from_rgba_unmultiplied(0x11, 0x11, 0x11, 200),
    );
    painter.text(
        p(140.0, 363.0),
        Align2::LEFT_TOP,
        "Green: Reticle (Fixed)",
        FontId::proportional(s(11.0)),
        RETICLE_GREEN,
    );
    painter.text(
        p(140.0, 378.0),
        Align2::LEFT_TOP,
        "Red: Reflected Image",
        FontId::proportional(s(11.0)),
        IMAGE_RED,
    );

    // Deviation readout.
    painter.rect_filled(
        Rect::from_min_size(p(70.0, 15.0), vec2(s(150.0), s(25.0))),
        s(5.0),
        Color32::from_rgba_unmultiplied(0x22, 0x22, 0x22, 230),
    );
    painter.text(
        p(80.0, 20.0),
        Align2::LEFT_TOP,
        format!("d = {:.3} mm", snap.crosshair_deviation_mm),
        FontId::proportional(s(12.0)),
        Color32::YELLOW,
    );
}
