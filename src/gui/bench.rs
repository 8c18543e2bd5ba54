//! Bench overview diagram.
//!
//! Draws the optical bench into a fixed 750×450 design space mapped onto
//! the available panel rect: table, workpiece, autocollimator body, the
//! collimated beam when the light is on, and the reflector riding on the
//! workpiece surface. Everything here is a projection of the snapshot;
//! nothing is interactive.

use eframe::egui::{self, emath, pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Shape, Stroke};

use crate::experiment::Snapshot;
use crate::measurement::Workpiece;

/// Design-space width the diagram is laid out in.
const SPACE_W: f32 = 750.0;
/// Design-space height the diagram is laid out in.
const SPACE_H: f32 = 450.0;

/// Height of the beam axis in design space.
const BEAM_Y: f32 = 280.0;
/// Top surface of the table in design space.
const TABLE_Y: f32 = 350.0;
/// Design-space x of the reflector at position 0 mm.
const REFLECTOR_X0: f32 = 420.0;

struct Canvas {
    painter: egui::Painter,
    to_screen: emath::RectTransform,
    scale: f32,
}

impl Canvas {
    fn p(&self, x: f32, y: f32) -> Pos2 {
        self.to_screen * pos2(x, y)
    }

    fn rect(&self, x: f32, y: f32, w: f32, h: f32, fill: Color32) {
        let r = Rect::from_min_size(self.p(x, y), vec2(w, h) * self.scale);
        self.painter.rect_filled(r, 0.0, fill);
    }

    fn rect_outlined(&self, x: f32, y: f32, w: f32, h: f32, fill: Color32, stroke: Stroke) {
        let r = Rect::from_min_size(self.p(x, y), vec2(w, h) * self.scale);
        self.painter.rect_filled(r, 0.0, fill);
        self.painter
            .rect_stroke(r, 0.0, Stroke::new(stroke.width * self.scale, stroke.color));
    }

    fn line(&self, from: (f32, f32), to: (f32, f32), stroke: Stroke) {
        self.painter.line_segment(
            [self.p(from.0, from.1), self.p(to.0, to.1)],
            Stroke::new(stroke.width * self.scale, stroke.color),
        );
    }

    fn circle(&self, x: f32, y: f32, radius: f32, fill: Color32) {
        self.painter
            .circle_filled(self.p(x, y), radius * self.scale, fill);
    }

    fn circle_outline(&self, x: f32, y: f32, radius: f32, stroke: Stroke) {
        self.painter.circle_stroke(
            self.p(x, y),
            radius * self.scale,
            Stroke::new(stroke.width * self.scale, stroke.color),
        );
    }

    fn text(&self, x: f32, y: f32, text: &str, size: f32, color: Color32) {
        self.painter.text(
            self.p(x, y),
            Align2::LEFT_TOP,
            text,
            FontId::proportional(size * self.scale),
            color,
        );
    }
}

/// Height of the workpiece top surface at a given design-space x.
fn workpiece_top_y(workpiece: Workpiece, x: f32) -> f32 {
    match workpiece {
        Workpiece::Tapered => TABLE_Y - (x - 350.0) * (40.0 / 300.0),
        Workpiece::Flat => 310.0,
    }
}

/// Renders the bench overview into the remaining panel space.
pub fn render(ui: &mut egui::Ui, snap: &Snapshot) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
    painter.rect_filled(response.rect, 4.0, Color32::from_rgb(15, 23, 42));

    let scale = (response.rect.width() / SPACE_W)
        .min(response.rect.height() / SPACE_H)
        .max(0.05);
    let canvas_rect = Rect::from_center_size(
        response.rect.center(),
        vec2(SPACE_W * scale, SPACE_H * scale),
    );
    let canvas = Canvas {
        painter,
        to_screen: emath::RectTransform::from_to(
            Rect::from_min_size(Pos2::ZERO, vec2(SPACE_W, SPACE_H)),
            canvas_rect,
        ),
        scale,
    };

    draw_table(&canvas);
    if let Some(workpiece) = snap.workpiece {
        draw_workpiece(&canvas, workpiece);
    }
    draw_instrument(&canvas, snap.light_on);

    if let Some(workpiece) = snap.workpiece {
        let reflector_x = REFLECTOR_X0 + snap.reflector_position_mm as f32;
        if snap.light_on {
            draw_beam(&canvas, reflector_x);
        }
        draw_reflector(&canvas, workpiece, reflector_x, snap.light_on);

        // Beam axis reference line.
        canvas.painter.extend(Shape::dashed_line(
            &[canvas.p(80.0, BEAM_Y), canvas.p(700.0, BEAM_Y)],
            Stroke::new(1.0 * canvas.scale, Color32::from_gray(68)),
            5.0 * canvas.scale,
            5.0 * canvas.scale,
        ));

        canvas.text(470.0, 385.0, workpiece.label(), 16.0, Color32::WHITE);
        canvas.text(
            470.0,
            405.0,
            &format!("Position: {} mm", snap.reflector_position_mm),
            13.0,
            Color32::from_rgb(136, 255, 136),
        );
        if workpiece == Workpiece::Tapered {
            canvas.text(
                470.0,
                422.0,
                &format!("Tilt: {:.3}°", snap.reflector_tilt_deg),
                12.0,
                Color32::from_rgb(255, 215, 0),
            );
        }
    }

    canvas.text(130.0, 205.0, "Autocollimator", 16.0, Color32::WHITE);
    canvas.text(
        90.0,
        227.0,
        "Horizontal Collimated Beam",
        11.0,
        Color32::from_rgb(170, 255, 170),
    );
}

fn draw_table(canvas: &Canvas) {
    let wood = Color32::from_rgb(0x8b, 0x45, 0x13);
    let wood_dark = Color32::from_rgb(0x65, 0x43, 0x21);
    canvas.rect_outlined(50.0, TABLE_Y, 650.0, 20.0, wood, Stroke::new(2.0, wood_dark));
    canvas.rect(70.0, 370.0, 15.0, 70.0, wood_dark);
    canvas.rect(665.0, 370.0, 15.0, 70.0, wood_dark);
}

fn draw_workpiece(canvas: &Canvas, workpiece: Workpiece) {
    let fill = Color32::from_rgb(0x95, 0xa5, 0xa6);
    let stroke = Stroke::new(3.0 * canvas.scale, Color32::from_rgb(0x7f, 0x8c, 0x8d));
    match workpiece {
        Workpiece::Flat => {
            canvas.rect_outlined(350.0, 310.0, 300.0, 40.0, fill, Stroke::new(3.0, stroke.color));
        }
        Workpiece::Tapered => {
            canvas.painter.add(Shape::convex_polygon(
                vec![
                    canvas.p(350.0, 350.0),
                    canvas.p(650.0, 310.0),
                    canvas.p(650.0, 350.0),
                ],
                fill,
                stroke,
            ));
        }
    }
}

fn draw_instrument(canvas: &Canvas, light_on: bool) {
    let black = Color32::from_rgb(0x1a, 0x1a, 0x1a);
    let dark = Color32::from_rgb(0x2c, 0x2c, 0x2c);

    // Base and support blocks.
    canvas.rect_outlined(80.0, 305.0, 160.0, 20.0, black, Stroke::new(2.0, Color32::BLACK));
    canvas.rect(85.0, 308.0, 150.0, 10.0, dark);
    canvas.rect(100.0, 325.0, 25.0, 25.0, Color32::from_rgb(0x2a, 0x2a, 0x2a));
    canvas.rect(195.0, 325.0, 25.0, 25.0, Color32::from_rgb(0x2a, 0x2a, 0x2a));

    // Main body.
    canvas.rect_outlined(
        90.0,
        250.0,
        130.0,
        55.0,
        Color32::from_rgb(0x3a, 0x3a, 0x3a),
        Stroke::new(2.0, Color32::BLACK),
    );
    canvas.rect(95.0, 255.0, 120.0, 45.0, Color32::from_rgb(0x4a, 0x4a, 0x4a));

    // Beam splitter.
    canvas.rect(
        155.0,
        265.0,
        15.0,
        25.0,
        Color32::from_rgba_unmultiplied(0x88, 0xcc, 0xff, 80),
    );

    // Objective lens housing.
    canvas.rect_outlined(220.0, 262.0, 55.0, 36.0, dark, Stroke::new(2.0, Color32::BLACK));
    canvas.circle(275.0, BEAM_Y, 14.0, black);
    canvas.circle(275.0, BEAM_Y, 10.0, Color32::from_gray(0x33));

    // Eyepiece on top.
    canvas.rect_outlined(145.0, 225.0, 30.0, 25.0, dark, Stroke::new(2.0, Color32::BLACK));
    canvas.circle(160.0, 232.0, 7.0, Color32::from_rgb(0x87, 0xce, 0xeb));
    canvas.circle(160.0, 232.0, 5.0, Color32::from_rgb(0xb0, 0xd4, 0xf1));

    // Adjustment knob.
    canvas.circle(190.0, 245.0, 8.0, black);
    canvas.line((190.0, 245.0), (190.0, 240.0), Stroke::new(2.0, Color32::from_rgb(0x4a, 0x4a, 0x4a)));

    // Light source indicator.
    let led_alpha = if light_on { 204 } else { 51 };
    canvas.rect(
        100.0,
        270.0,
        20.0,
        15.0,
        Color32::from_rgba_unmultiplied(0xff, 0xaa, 0x00, led_alpha),
    );
    canvas.text(101.0, 272.0, "LED", 8.0, Color32::WHITE);
}

fn draw_beam(canvas: &Canvas, reflector_x: f32) {
    // Outgoing beam.
    canvas.line(
        (289.0, BEAM_Y),
        (reflector_x, BEAM_Y),
        Stroke::new(6.0, Color32::from_rgba_unmultiplied(255, 255, 0, 120)),
    );
    // Return beam, nudged below the axis.
    canvas.line(
        (reflector_x, BEAM_Y),
        (289.0, BEAM_Y + 2.0),
        Stroke::new(5.0, Color32::from_rgba_unmultiplied(255, 136, 0, 90)),
    );
    // Lens glow.
    canvas.circle(
        275.0,
        BEAM_Y,
        20.0,
        Color32::from_rgba_unmultiplied(255, 255, 0, 50),
    );
    canvas.circle(
        275.0,
        BEAM_Y,
        14.0,
        Color32::from_rgba_unmultiplied(255, 255, 0, 75),
    );
}

fn draw_reflector(canvas: &Canvas, workpiece: Workpiece, reflector_x: f32, light_on: bool) {
    let top_y = workpiece_top_y(workpiece, reflector_x);
    let mirror_radius = 22.0;
    let stand_base_height = 8.0;
    let stand_width = 50.0;

    // The mirror follows the tapered surface at a fixed offset; on the flat
    // workpiece it sits on the beam axis.
    let mirror_cy = match workpiece {
        Workpiece::Tapered => top_y - 38.0,
        Workpiece::Flat => BEAM_Y,
    };
    let stand_height = top_y - (mirror_cy + mirror_radius);

    let stand_fill = Color32::from_rgb(0x25, 0x57, 0xa7);
    let stand_stroke = Stroke::new(2.0, Color32::from_rgb(0x1a, 0x40, 0x80));
    canvas.rect_outlined(
        reflector_x - stand_width / 2.0,
        top_y - stand_base_height,
        stand_width,
        stand_base_height,
        stand_fill,
        stand_stroke,
    );
    for leg_x in [reflector_x - 18.0, reflector_x + 12.0] {
        canvas.rect(
            leg_x,
            mirror_cy + mirror_radius,
            6.0,
            stand_height - stand_base_height,
            stand_fill,
        );
    }

    // Mirror: rim, face, highlight.
    canvas.circle(reflector_x, mirror_cy, mirror_radius + 4.0, Color32::from_gray(0xb0));
    canvas.circle_outline(
        reflector_x,
        mirror_cy,
        mirror_radius + 4.0,
        Stroke::new(3.0, Color32::from_gray(0x80)),
    );
    canvas.circle(reflector_x, mirror_cy, mirror_radius, Color32::from_gray(0xe8));
    canvas.circle(reflector_x, mirror_cy, mirror_radius - 2.0, Color32::from_gray(0xf5));
    canvas.circle(
        reflector_x - 5.0,
        mirror_cy - 5.0,
        6.0,
        Color32::from_rgba_unmultiplied(255, 255, 255, 180),
    );

    if light_on {
        canvas.circle(
            reflector_x,
            mirror_cy,
            8.0,
            Color32::from_rgba_unmultiplied(255, 255, 0, 150),
        );
    }
}
