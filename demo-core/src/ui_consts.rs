// Common spacing between grouped controls
pub const SECTION_SPACING: f32 = 6.0;

// Side panel sizing
pub const SIDE_PANEL_WIDTH: f32 = 280.0;

// Text sizes
pub const HEADING_TEXT_SIZE: f32 = 16.0;

// Timeline rows
pub const TIMELINE_BAR_HEIGHT: f32 = 10.0;
