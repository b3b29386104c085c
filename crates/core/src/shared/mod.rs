pub mod constants;
pub mod frame;
pub mod frame_geometry;
pub mod video_metadata;
