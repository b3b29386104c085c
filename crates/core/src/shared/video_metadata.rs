use std::path::PathBuf;

/// What a finished video file contains, as reported by a probe.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Frames actually decoded, not the container's estimate.
    pub total_frames: usize,
    pub codec: String,
    pub has_audio: bool,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Duration implied by frame count and rate, in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn metadata(fps: f64, total_frames: usize) -> VideoMetadata {
        VideoMetadata {
            width: 64,
            height: 48,
            fps,
            total_frames,
            codec: "h264".to_string(),
            has_audio: false,
            source_path: Some(PathBuf::from("/tmp/out.mp4")),
        }
    }

    #[test]
    fn test_duration() {
        assert_relative_eq!(metadata(30.0, 90).duration_secs(), 3.0);
    }

    #[test]
    fn test_duration_without_rate_is_zero() {
        assert_relative_eq!(metadata(0.0, 90).duration_secs(), 0.0);
    }
}
