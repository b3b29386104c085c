use std::collections::HashMap;

use crate::shared::constants::PROGRESS_THROTTLE_FRAMES;

/// Sink for session events: status lines, teardown warnings, progress and
/// stage timings.
///
/// Decouples the session from where its output ends up (log crate, GUI,
/// nothing at all).
pub trait PipelineLogger: Send {
    fn info(&mut self, message: &str);

    /// Non-fatal problems the operator should see, e.g. a failed mux.
    fn warning(&mut self, message: &str);

    /// Called after every accepted frame with the running total.
    fn frame_written(&mut self, count: u64);

    /// Record how long a named stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn info(&mut self, _message: &str) {}
    fn warning(&mut self, _message: &str) {}
    fn frame_written(&mut self, _count: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
}

/// Forwards events to the `log` facade and keeps per-stage timings for the
/// summary.
///
/// Progress lines are throttled to one every `throttle_frames` frames.
pub struct LogPipelineLogger {
    throttle_frames: u64,
    timings: HashMap<String, Vec<f64>>,
    frames: u64,
    warnings: Vec<String>,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: u64) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            frames: 0,
            warnings: Vec::new(),
        }
    }

    /// Warnings seen so far, oldest first.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the formatted summary, or `None` if nothing was timed.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let mut lines = vec![format!("Session summary ({} frames):", self.frames)];
        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len() as f64;
            lines.push(format!(
                "  {stage:14}: avg {avg_ms:7.1}ms  total {total_ms:8.0}ms  ({} runs)",
                durations.len()
            ));
        }
        if !self.warnings.is_empty() {
            lines.push(format!("  {} warning(s)", self.warnings.len()));
        }
        Some(lines.join("\n"))
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(PROGRESS_THROTTLE_FRAMES)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
        log::warn!("{message}");
    }

    fn frame_written(&mut self, count: u64) {
        self.frames = count;
        if count % self.throttle_frames == 0 {
            log::info!("Written {count} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.info("hello");
        logger.warning("careful");
        logger.frame_written(1);
        logger.timing("mux", 5.0);
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = LogPipelineLogger::new(10);
        logger.timing("mux", 20.0);
        logger.timing("mux", 30.0);
        logger.timing("audio_merge", 5.0);

        assert_eq!(logger.timings_for("mux").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("audio_merge").unwrap(), &[5.0]);
        assert!(logger.timings_for("encode").is_none());
    }

    #[test]
    fn test_warnings_are_kept() {
        let mut logger = LogPipelineLogger::default();
        logger.warning("mux failed");
        logger.info("not a warning");
        assert_eq!(logger.warnings(), &["mux failed".to_string()]);
    }

    #[test]
    fn test_summary_lists_stages_and_frames() {
        let mut logger = LogPipelineLogger::new(10);
        logger.frame_written(42);
        logger.timing("mux", 12.0);
        logger.timing("write", 1.0);
        logger.warning("x");

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("42 frames"));
        assert!(summary.contains("mux"));
        assert!(summary.contains("write"));
        assert!(summary.contains("1 warning(s)"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(LogPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        let mut logger = LogPipelineLogger::new(0);
        assert_eq!(logger.throttle_frames, 1);
        logger.frame_written(3);
        assert_eq!(logger.frames, 3);
    }
}
