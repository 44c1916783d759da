use std::time::Duration;

/// Tunables for the analysis pipeline and the ambient alert stream.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Uploads above this size are rejected before the pipeline starts.
    pub max_upload_bytes: usize,

    /// Fingerprint cache bound (least recently used entry is evicted).
    pub cache_capacity: usize,

    /// User-visible pauses between state transitions
    pub cache_hit_delay: Duration,
    pub preprocess_delay: Duration,
    pub scan_delay: Duration,

    pub ambient_alert_delay: Duration,

    /// Square edge the classifier input is resized to
    pub classifier_input_size: u32,
    /// Square edge of the pixel-heuristic downsample
    pub heuristic_grid_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 5 * 1024 * 1024,
            cache_capacity: 64,
            cache_hit_delay: Duration::from_millis(800),
            preprocess_delay: Duration::from_millis(1500),
            scan_delay: Duration::from_millis(1500),
            ambient_alert_delay: Duration::from_secs(15),
            classifier_input_size: 224,
            heuristic_grid_size: 100,
        }
    }
}

impl PipelineConfig {
    /// Defaults adjusted by `AGRIGUARD_DEBUG` (drops the artificial delays) and
    /// `AGRIGUARD_CACHE_CAPACITY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let debug_mode = std::env::var("AGRIGUARD_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            config = config.without_delays();
        }

        if let Some(capacity) = std::env::var("AGRIGUARD_CACHE_CAPACITY")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|capacity| *capacity > 0)
        {
            config.cache_capacity = capacity;
        }

        config
    }

    pub fn without_delays(mut self) -> Self {
        self.cache_hit_delay = Duration::ZERO;
        self.preprocess_delay = Duration::ZERO;
        self.scan_delay = Duration::ZERO;
        self
    }
}
