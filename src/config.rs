//! Window and runner configuration.

use crate::backend::Color;
use crate::error::TransitionError;
use crate::scene::{Easing, TransitionConfig};

/// Configuration for the app window and the scene runner.
///
/// # Example
///
/// ```
/// use curtain::AppConfig;
/// use curtain::scene::Easing;
///
/// let config = AppConfig::new()
///     .title("Slideshow")
///     .size(1280, 720)
///     .transition_duration(1.5)
///     .unwrap()
///     .easing(Easing::EaseInOut)
///     .auto_advance(4.0);
/// assert_eq!(config.width, 1280);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Timing applied to every transition.
    pub transition: TransitionConfig,
    /// Color live frames are cleared to before the current scene renders.
    pub clear_color: Color,
    /// Seconds a scene stays on screen before the runner advances on its own.
    pub auto_advance: Option<f32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Curtain".to_string(),
            width: 800,
            height: 600,
            transition: TransitionConfig::default(),
            clear_color: Color::BLACK,
            auto_advance: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn transition_duration(mut self, seconds: f32) -> Result<Self, TransitionError> {
        self.transition = self.transition.duration(seconds)?;
        Ok(self)
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.transition = self.transition.easing(easing);
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Advance to the next scene every `seconds`. Non-positive values turn it off.
    pub fn auto_advance(mut self, seconds: f32) -> Self {
        self.auto_advance = (seconds.is_finite() && seconds > 0.0).then_some(seconds);
        self
    }
}
