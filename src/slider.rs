use raylib::prelude::*;

use crate::constants::{MAX_VALUE, MIN_VALUE};

/// Manual input adapter: turns mouse drags on a horizontal track into
/// clamped control values. Mode handling is the caller's job; this only
/// reports that the user moved the handle.
pub struct Slider {
    track: Rectangle,
    dragging: bool,
}

impl Slider {
    pub fn new(track: Rectangle) -> Self {
        Self { track, dragging: false }
    }

    /// The window is resizable; the track follows it.
    pub fn set_track(&mut self, track: Rectangle) {
        self.track = track;
    }

    /// Returns the new control value while the user is dragging.
    pub fn update(&mut self, rl: &RaylibHandle) -> Option<f64> {
        let mouse = rl.get_mouse_position();

        if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT)
            && self.track.check_collision_point_rec(mouse)
        {
            self.dragging = true;
        }
        if rl.is_mouse_button_released(MouseButton::MOUSE_BUTTON_LEFT) {
            self.dragging = false;
        }

        if self.dragging {
            Some(value_from_position(mouse.x, self.track.x, self.track.width))
        } else {
            None
        }
    }

    pub fn draw(&self, d: &mut impl RaylibDraw, value: f64) {
        let t = ((value - MIN_VALUE) / (MAX_VALUE - MIN_VALUE)) as f32;
        let handle_x = self.track.x + t * self.track.width;

        // Track line with tick marks at each whole value
        let mid_y = self.track.y + self.track.height / 2.0;
        d.draw_line_ex(
            Vector2::new(self.track.x, mid_y),
            Vector2::new(self.track.x + self.track.width, mid_y),
            2.0,
            Color::DARKGRAY,
        );
        let steps = (MAX_VALUE - MIN_VALUE) as i32;
        for i in 0..=steps {
            let x = self.track.x + self.track.width * i as f32 / steps as f32;
            d.draw_line_ex(
                Vector2::new(x, mid_y - 6.0),
                Vector2::new(x, mid_y + 6.0),
                1.0,
                Color::GRAY,
            );
        }

        d.draw_circle(handle_x as i32, mid_y as i32, 10.0, Color::WHITE);
        d.draw_circle(handle_x as i32, mid_y as i32, 6.0, Color::LIME);
    }
}

/// Map a horizontal mouse position onto the value domain, clamped to the
/// track ends.
pub fn value_from_position(mouse_x: f32, track_x: f32, track_width: f32) -> f64 {
    let t = (((mouse_x - track_x) / track_width) as f64).clamp(0.0, 1.0);
    MIN_VALUE + t * (MAX_VALUE - MIN_VALUE)
}
