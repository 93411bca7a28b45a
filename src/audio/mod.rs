pub mod file;

pub use file::RecordingInfo;
