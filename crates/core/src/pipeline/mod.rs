pub mod encoding_strategy;
pub mod frame_buffer;
pub mod frame_composer;
pub mod pipeline_logger;
pub mod session_config;
pub mod session_error;
pub mod teardown;
pub mod video_writer_session;
