/// Video source for asciiplay (ffmpeg subprocess, 8-bit gray frames).
pub mod video;
