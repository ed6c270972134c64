use derive_builder::Builder;

pub const EDITOR_HEIGHT: f64 = 625.0;
pub const EXPANDED_HEIGHT: f64 = 1024.0;
pub const NODE_PROXIMITY: f64 = 24.0;

/// Presentation-facing knobs of a session. Everything has a sensible default;
/// build one with [`SessionConfigBuilder`].
#[derive(Builder, Clone, Debug)]
pub struct SessionConfig {
    /// Default canvas height in pixels.
    #[builder(default = "EDITOR_HEIGHT")]
    pub editor_height: f64,
    /// Alternate height toggled by the resize action.
    #[builder(default = "EXPANDED_HEIGHT")]
    pub expanded_height: f64,
    /// Per-axis pixel tolerance of the canvas proximity test.
    #[builder(default = "NODE_PROXIMITY")]
    pub proximity: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            editor_height: EDITOR_HEIGHT,
            expanded_height: EXPANDED_HEIGHT,
            proximity: NODE_PROXIMITY,
        }
    }
}
