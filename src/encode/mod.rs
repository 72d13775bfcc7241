pub(crate) mod ffmpeg;
pub(crate) mod sink;
pub(crate) mod timeline;
