// =============================================================================
// AUDIO_OUT.RS — streams the mixer to the default output device
// =============================================================================

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{info, warn};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use super::HostError;
use crate::audio::{Mixer, SAMPLE_RATE, WAVE_BUFFER_LEN};

/// Endless rodio source pulling blocks of samples from the shared mixer.
pub struct MixerSource {
    mixer: Arc<Mutex<Mixer>>,
    block: [i16; WAVE_BUFFER_LEN],
    pos: usize,
}

impl MixerSource {
    pub fn new(mixer: Arc<Mutex<Mixer>>) -> Self {
        Self { mixer, block: [0; WAVE_BUFFER_LEN], pos: WAVE_BUFFER_LEN }
    }
}

impl Iterator for MixerSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.pos == WAVE_BUFFER_LEN {
            match self.mixer.lock() {
                Ok(mut mixer) => mixer.fill(&mut self.block),
                Err(_) => self.block = [0; WAVE_BUFFER_LEN],
            }
            self.pos = 0;
        }
        let s = self.block[self.pos];
        self.pos += 1;
        Some(s)
    }
}

impl Source for MixerSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Keeps the output stream alive for as long as audio should play.
pub struct AudioOutput {
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl AudioOutput {
    pub fn new(mixer: Arc<Mutex<Mixer>>) -> Result<Self, HostError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| HostError::Audio(format!("no output stream: {e}")))?;
        let sink = Sink::try_new(&handle).map_err(|e| HostError::Audio(format!("no sink: {e}")))?;
        sink.append(MixerSource::new(mixer));
        sink.play();
        info!("[audio] output started at {SAMPLE_RATE} Hz");
        Ok(Self { _stream: stream, _handle: handle, sink })
    }

    /// Open the default device, or log and carry on without sound.
    pub fn try_start(mixer: Arc<Mutex<Mixer>>) -> Option<Self> {
        match Self::new(mixer) {
            Ok(out) => Some(out),
            Err(e) => {
                warn!("[audio] {e}. Audio disabled.");
                None
            }
        }
    }

    pub fn set_paused(&self, paused: bool) {
        if paused { self.sink.pause() } else { self.sink.play() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_pulls_silence_from_idle_mixer() {
        let mixer = Arc::new(Mutex::new(Mixer::new()));
        let mut src = MixerSource::new(mixer);
        assert_eq!(src.sample_rate(), SAMPLE_RATE);
        assert!((0..200).all(|_| src.next() == Some(0)));
    }
}
