pub mod ffmpeg_cli;
pub mod ffmpeg_encoder;
pub mod ffmpeg_probe;
pub mod image_file_reader;
pub mod image_file_writer;
pub mod system_process_runner;
