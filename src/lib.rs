pub mod audio_engine;
pub mod device;
pub mod recorder;
pub mod ui;
pub mod wav;
