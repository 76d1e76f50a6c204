//! Options for loading and exporting.

/// What to do when the `Frames:` header disagrees with the number of frame lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameCountPolicy {
    /// Keep every parsed frame line and log a warning.
    #[default]
    Advisory,
    /// Reject the file.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub frame_count_policy: FrameCountPolicy,
    /// Frame lines are tokenized on the rayon pool once there are at least this many of them.
    pub parallel_threshold: usize,
}

pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            frame_count_policy: FrameCountPolicy::Advisory,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl LoadOptions {
    pub fn with_frame_count_policy(mut self, policy: FrameCountPolicy) -> Self {
        self.frame_count_policy = policy;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

/// Decimal places written for frame values. 6 keeps the re-parse error below 1e-6.
pub const DEFAULT_PRECISION: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Fixed number of decimals for frame values; `None` writes the shortest text that
    /// parses back to the identical `f64`.
    pub precision: Option<usize>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            precision: Some(DEFAULT_PRECISION),
        }
    }
}

impl ExportOptions {
    pub fn with_precision(mut self, precision: Option<usize>) -> Self {
        self.precision = precision;
        self
    }
}
