use egui::{emath::TSTransform, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::settings::{SettingsNavigation, ZOOM_MAX, ZOOM_MIN};

/// Pan and zoom of the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    /// Current pan offset
    pub pan: Vec2,
    /// Current zoom factor
    pub zoom: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.,
        }
    }
}

impl ViewportState {
    /// `translate(pan) * scale(zoom)`, mapping canvas to widget coordinates.
    pub fn transform(&self) -> TSTransform {
        TSTransform::new(self.pan, self.zoom)
    }

    pub fn canvas_to_screen_pos(&self, pos: Pos2) -> Pos2 {
        (pos.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    pub fn canvas_to_screen_size(&self, size: f32) -> f32 {
        size * self.zoom
    }

    pub fn screen_to_canvas_pos(&self, pos: Pos2) -> Pos2 {
        ((pos.to_vec2() - self.pan) / self.zoom).to_pos2()
    }
}

/// Owns [`ViewportState`] and turns pointer and wheel input into changes of it.
///
/// Positions passed in are widget-local. Zoom stays within
/// [`ZOOM_MIN`]..=[`ZOOM_MAX`] after every mutation.
#[derive(Clone, Debug)]
pub struct Viewport {
    state: ViewportState,
    /// Pointer position minus pan at drag start, while a drag is active.
    drag_anchor: Option<Vec2>,
    settings: SettingsNavigation,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(SettingsNavigation::default())
    }
}

impl Viewport {
    pub fn new(settings: SettingsNavigation) -> Self {
        Self {
            state: ViewportState::default(),
            drag_anchor: None,
            settings,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn zoom(&self) -> f32 {
        self.state.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.state.pan
    }

    pub fn settings(&self) -> &SettingsNavigation {
        &self.settings
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.state.zoom * 100.).round() as u32
    }

    /// Sets the zoom factor, clamped. Returns the applied value.
    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        let zoom = if zoom.is_nan() { 1. } else { zoom };
        self.state.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        self.state.zoom
    }

    /// Scrolling down (positive delta) zooms out, scrolling up zooms in.
    pub fn apply_wheel(&mut self, delta_y: f32) -> f32 {
        if delta_y == 0. {
            return self.state.zoom;
        }
        let step = self.settings.wheel_zoom_step;
        let diff = if delta_y > 0. { -step } else { step };
        self.set_zoom(self.state.zoom + diff)
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.state.zoom + self.settings.key_zoom_step)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.state.zoom - self.settings.key_zoom_step)
    }

    pub fn can_zoom_in(&self) -> bool {
        self.state.zoom < ZOOM_MAX
    }

    pub fn can_zoom_out(&self) -> bool {
        self.state.zoom > ZOOM_MIN
    }

    pub fn reset_zoom(&mut self) {
        self.state.zoom = 1.;
    }

    pub fn reset_view(&mut self) {
        self.state = ViewportState::default();
        self.drag_anchor = None;
    }

    /// Zooms so `bounds` (canvas coordinates) plus padding fits a widget of
    /// `size` and centers it. Zoom stays clamped, so a large graph can still
    /// overflow. Degenerate input leaves the state untouched. Returns the zoom.
    pub fn fit_to(&mut self, bounds: Rect, size: Vec2) -> f32 {
        let usable = bounds.is_finite() && size.is_finite();
        if !usable || bounds.area() <= 0. || size.min_elem() <= 0. {
            return self.state.zoom;
        }

        let padded = bounds.size() * (1. + self.settings.screen_padding);
        let zoom = self.set_zoom((size.x / padded.x).min(size.y / padded.y));
        self.state.pan = size / 2. - bounds.center().to_vec2() * zoom;
        self.drag_anchor = None;
        zoom
    }

    /// Starts a pan gesture unless the pointer is over a node.
    /// Returns whether a drag started.
    pub fn begin_drag(&mut self, pointer: Pos2, over_node: bool) -> bool {
        if over_node {
            return false;
        }
        self.drag_anchor = Some(pointer.to_vec2() - self.state.pan);
        true
    }

    /// Moves the pan offset with the pointer while a drag is active.
    /// Returns the pan change.
    pub fn drag_to(&mut self, pointer: Pos2) -> Option<Vec2> {
        let anchor = self.drag_anchor?;
        let pan = pointer.to_vec2() - anchor;
        let diff = pan - self.state.pan;
        self.state.pan = pan;
        Some(diff)
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }
}
