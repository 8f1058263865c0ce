use std::time::Duration;

use egui::Color32;

/// Lower bound for the viewport zoom factor.
pub const ZOOM_MIN: f32 = 0.1;
/// Upper bound for the viewport zoom factor.
pub const ZOOM_MAX: f32 = 3.0;

/// Slowest accepted playback speed multiplier.
pub const SPEED_MIN: f32 = 0.1;
/// Fastest accepted playback speed multiplier.
pub const SPEED_MAX: f32 = 10.0;
/// Longest accepted time between steps at speed `1.0`.
pub const BASE_INTERVAL_MAX: Duration = Duration::from_secs(60 * 60);

/// Step clock parameters.
#[derive(Debug, Clone)]
pub struct SettingsPlayback {
    /// Time between steps at speed `1.0`.
    pub base_interval: Duration,

    /// Initial speed multiplier.
    pub speed: f32,

    /// Speed multipliers offered by playback controls.
    pub speed_options: Vec<f32>,
}

impl Default for SettingsPlayback {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(2000),
            speed: 1.,
            speed_options: vec![0.5, 1., 1.5, 2., 3.],
        }
    }
}

impl SettingsPlayback {
    pub fn with_base_interval(mut self, interval: Duration) -> Self {
        self.base_interval = interval;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Pan and zoom parameters.
#[derive(Debug, Clone)]
pub struct SettingsNavigation {
    /// Dragging the background pans, scrolling zooms
    pub zoom_and_pan: bool,

    /// Zoom change per wheel notch
    pub wheel_zoom_step: f32,

    /// Zoom change per keyboard or button press
    pub key_zoom_step: f32,

    /// Padding around the graph when fitting it to the widget, as a share of its size
    pub screen_padding: f32,
}

impl Default for SettingsNavigation {
    fn default() -> Self {
        Self {
            zoom_and_pan: true,
            wheel_zoom_step: 0.1,
            key_zoom_step: 0.2,
            screen_padding: 0.1,
        }
    }
}

impl SettingsNavigation {
    pub fn with_zoom_and_pan(mut self, enabled: bool) -> Self {
        self.zoom_and_pan = enabled;
        self
    }

    pub fn with_wheel_zoom_step(mut self, step: f32) -> Self {
        self.wheel_zoom_step = step;
        self
    }

    pub fn with_key_zoom_step(mut self, step: f32) -> Self {
        self.key_zoom_step = step;
        self
    }

    pub fn with_screen_padding(mut self, padding: f32) -> Self {
        self.screen_padding = padding.max(0.);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SettingsInteraction {
    /// Clicking a node selects it
    pub node_select: bool,

    /// Hovering a node shows a tooltip with its metrics
    pub node_tooltip: bool,
}

impl Default for SettingsInteraction {
    fn default() -> Self {
        Self {
            node_select: true,
            node_tooltip: true,
        }
    }
}

impl SettingsInteraction {
    pub fn with_node_select(mut self, enabled: bool) -> Self {
        self.node_select = enabled;
        self
    }

    pub fn with_node_tooltip(mut self, enabled: bool) -> Self {
        self.node_tooltip = enabled;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStyle {
    /// Characters of node content shown on the card before truncation
    pub content_preview_chars: usize,

    pub edge_width: f32,

    pub edge_color: Color32,
}

impl Default for SettingsStyle {
    fn default() -> Self {
        Self {
            content_preview_chars: 100,
            edge_width: 2.,
            edge_color: Color32::from_rgb(107, 114, 128),
        }
    }
}

impl SettingsStyle {
    pub fn with_content_preview_chars(mut self, chars: usize) -> Self {
        self.content_preview_chars = chars;
        self
    }
}
