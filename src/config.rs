//! Viewer configuration.
//!
//! There are no command-line flags; defaults can be adjusted through the
//! environment:
//!
//! * `COGM_PREVIEW_ROWS` – rows shown in the upload preview (default 5)
//! * `RUST_LOG`          – log filter, read by `env_logger`

/// Environment variable overriding [`ViewerConfig::preview_rows`].
pub const PREVIEW_ROWS_VAR: &str = "COGM_PREVIEW_ROWS";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Rows of the ingested table shown as a preview.
    pub preview_rows: usize,
    /// Initial window size in points.
    pub window_size: [f32; 2],
    /// Smallest allowed window size in points.
    pub min_window_size: [f32; 2],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            window_size: [1280.0, 860.0],
            min_window_size: [720.0, 480.0],
        }
    }
}

impl ViewerConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Unparseable values are ignored with a
    /// warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(PREVIEW_ROWS_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(rows) => self.preview_rows = rows,
                Err(e) => log::warn!("Ignoring {PREVIEW_ROWS_VAR}={raw:?}: {e}"),
            }
        }
        self
    }
}
