use serde::{Deserialize, Serialize};

/// Tuning parameters of the multi-scale face search, passed straight to the
/// cascade's `detectMultiScale`.
///
/// Fixed at construction; two locators with different configs can run
/// side by side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Factor by which the search window grows between scale passes.
    pub scale_step: f64,
    /// A group of overlapping hits is kept when it has more than this many
    /// members (0 keeps single hits).
    pub min_neighbors: u32,
    /// Smallest window width searched, in pixels.
    pub min_window_width: u32,
    /// Smallest window height searched, in pixels.
    pub min_window_height: u32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            scale_step: 1.1,
            min_neighbors: 3,
            min_window_width: 20,
            min_window_height: 20,
        }
    }
}

impl LocatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.scale_step.is_finite() || self.scale_step <= 1.0 {
            return Err(format!(
                "scale_step must be greater than 1.0, got {}",
                self.scale_step
            ));
        }
        if self.min_window_width == 0 || self.min_window_height == 0 {
            return Err(format!(
                "minimum window must be positive, got {}x{}",
                self.min_window_width, self.min_window_height
            ));
        }
        let limit = i32::MAX as u32;
        if self.min_neighbors > limit || self.min_window_width > limit || self.min_window_height > limit {
            return Err(format!("min_neighbors and minimum window must not exceed {limit}"));
        }
        Ok(())
    }
}
