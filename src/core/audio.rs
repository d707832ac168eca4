// Alert sound cue.
//
// Playback happens on the blocking pool; the dispatcher never waits for it.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use rodio::{Decoder, OutputStreamBuilder, Sink};

#[derive(Debug, Clone)]
pub struct AlertSound {
    path: PathBuf,
    volume: f32,
}

impl AlertSound {
    pub fn new(path: PathBuf, volume: f32) -> Self {
        Self {
            path,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Starts playing the sound and returns immediately. Must be called within a tokio runtime.
    pub fn play(&self) {
        let sound = self.clone();
        tokio::task::spawn_blocking(move || sound.play_blocking());
    }

    fn play_blocking(&self) {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("No audio output device: {}", e);
                return;
            }
        };
        let sink = Sink::connect_new(stream.mixer());
        sink.set_volume(self.volume);

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Alert sound {:?} unavailable: {}", self.path, e);
                return;
            }
        };
        match Decoder::new(BufReader::new(file)) {
            Ok(source) => {
                sink.append(source);
                sink.sleep_until_end();
            }
            Err(e) => log::warn!("Failed to decode alert sound {:?}: {}", self.path, e),
        }
    }
}
