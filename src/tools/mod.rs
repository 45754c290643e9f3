mod path_tools;
mod video_scanner;
mod video_source;

pub use path_tools::{
    ensure_directory_exists, ensure_parent_directory, validate_directory_exists,
    validate_file_exists,
};
pub use video_scanner::{VideoFileInfo, scan_video_files};
pub use video_source::{FfmpegVideoSource, VideoInfo, VideoSource, clamp_timestamp};
