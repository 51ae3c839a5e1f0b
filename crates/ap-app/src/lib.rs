/// asciiplay application: CLI, render loop, and playback lifecycle.
pub mod cli;
pub mod player;
pub mod session;
