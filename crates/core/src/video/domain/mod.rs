pub mod image_reader;
pub mod image_writer;
pub mod process_runner;
pub mod video_encoder;
