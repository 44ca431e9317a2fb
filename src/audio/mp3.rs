// =============================================================================
// MP3.RS — streamed MP3 playback on a synth channel
//
// Decoding happens in `MP3Stream::update`, on the game side. The audio thread
// only copies 64-sample blocks out of a pair of pre-decoded buffers, so a slow
// decode never stalls the mixer; it underruns to silence instead.
// =============================================================================

use std::sync::{Arc, Mutex};

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{ADSRPhase, AudioError, Mixer, SAMPLE_RATE, WAVE_BUFFER_LEN, WaveSource, Waveform};
use crate::fs::Filesystem;

/// Samples per decode buffer.
pub const AUDIO_BUF_SIZE: usize = 1152 * 4;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayFlags(pub u8);

impl PlayFlags {
    pub const NONE: Self = Self(0);
    pub const FROM_START: Self = Self(1);
    pub const LOOP: Self = Self(2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for PlayFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

// ── Decoder ───────────────────────────────────────────────────────────────────

/// Symphonia pipeline producing mono samples at `SAMPLE_RATE`.
struct Mp3Decoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    pending: Vec<i16>,
    sample_buf: Option<SampleBuffer<i16>>,
}

impl Mp3Decoder {
    fn open(bytes: Arc<[u8]>) -> Result<Self, AudioError> {
        let cursor = std::io::Cursor::new(bytes);
        let mss = MediaSourceStream::new(Box::new(cursor), MediaSourceStreamOptions::default());
        let mut hint = Hint::new();
        hint.with_extension("mp3");

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let format = probed.format;
        let track = format.default_track().ok_or(AudioError::NoTrack)?;
        let track_id = track.id;
        let decoder = symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        Ok(Self { format, decoder, track_id, pending: Vec::new(), sample_buf: None })
    }

    /// Decode one packet. `Ok(None)` at end of stream. The returned pair is
    /// (frames decoded, source sample rate).
    fn decode_packet(&mut self) -> Result<Option<(usize, u32)>, AudioError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!("[audio] skipping bad mp3 frame: {e}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let frames = decoded.frames();
            let needs_realloc = self.sample_buf.as_ref().is_none_or(|b| b.capacity() < decoded.capacity());
            if needs_realloc {
                self.sample_buf = Some(SampleBuffer::<i16>::new(decoded.capacity() as u64, spec));
            }
            let Some(buf) = self.sample_buf.as_mut() else { continue };
            buf.copy_interleaved_ref(decoded);

            // downmix and decimate by an integer factor
            let channels = spec.channels.count().max(1);
            let freq_scale = (spec.rate / SAMPLE_RATE).max(1) as usize;
            let div = channels * freq_scale;
            for group in buf.samples().chunks_exact(div) {
                let sum: i32 = group.iter().map(|s| *s as i32).sum();
                self.pending.push((sum / div as i32) as i16);
            }
            return Ok(Some((frames, spec.rate)));
        }
    }

    /// Up to `max` converted samples, or `None` once the stream is drained.
    fn next_block(&mut self, max: usize) -> Result<Option<Vec<i16>>, AudioError> {
        while self.pending.len() < max {
            if self.decode_packet()?.is_none() {
                break;
            }
        }
        if self.pending.is_empty() {
            return Ok(None);
        }
        let take = max.min(self.pending.len());
        Ok(Some(self.pending.drain(..take).collect()))
    }
}

fn calc_duration_ms(bytes: Arc<[u8]>) -> Result<u32, AudioError> {
    let mut decoder = Mp3Decoder::open(bytes)?;
    let mut samples: u64 = 0;
    let mut hz = 0;
    while let Some((frames, rate)) = decoder.decode_packet()? {
        samples += frames as u64;
        hz = rate;
        decoder.pending.clear();
    }
    if hz == 0 {
        return Ok(0);
    }
    Ok((samples * 1000 / hz as u64) as u32)
}

// ── Shared buffers ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
enum Slot {
    #[default]
    Empty,
    Ready(Vec<i16>),
    Eof,
}

#[derive(Debug, Default)]
struct Buffers {
    slots: [Slot; 2],
    current: usize,
    pos: usize,
    buffered_samples: u32,
}

/// The channel's view of the stream.
struct Feed(Arc<Mutex<Buffers>>);

impl WaveSource for Feed {
    fn refill(&mut self, out: &mut [i16; WAVE_BUFFER_LEN]) -> bool {
        let Ok(mut b) = self.0.lock() else { return false };
        let cur = b.current;
        let pos = b.pos;

        let finished = match &b.slots[cur] {
            Slot::Eof => return false,
            Slot::Empty => {
                // underrun
                out.fill(0);
                return true;
            }
            Slot::Ready(data) => {
                let end = (pos + WAVE_BUFFER_LEN).min(data.len());
                let n = end - pos;
                out[..n].copy_from_slice(&data[pos..end]);
                out[n..].fill(0);
                end >= data.len()
            }
        };

        b.buffered_samples += WAVE_BUFFER_LEN as u32;
        if finished {
            b.slots[cur] = Slot::Empty;
            b.current = (cur + 1) % 2;
            b.pos = 0;
        } else {
            b.pos += WAVE_BUFFER_LEN;
        }
        true
    }
}

// ── Stream ────────────────────────────────────────────────────────────────────

/// An MP3 file streamed through one `Mixer` channel.
#[derive(Default)]
pub struct MP3Stream {
    data: Option<Arc<[u8]>>,
    decoder: Option<Mp3Decoder>,
    buffers: Arc<Mutex<Buffers>>,
    channel: Option<usize>,
    play_flags: PlayFlags,
    started: bool,
    duration_ms: u32,
}

impl std::fmt::Debug for MP3Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MP3Stream")
            .field("loaded", &self.data.is_some())
            .field("channel", &self.channel)
            .field("play_flags", &self.play_flags)
            .field("duration_ms", &self.duration_ms)
            .finish()
    }
}

impl MP3Stream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` and prepare the decoder. With `do_duration_calc` the whole
    /// file is decoded once up front to measure it.
    pub fn load(&mut self, fs: &Filesystem, path: &str, do_duration_calc: bool) -> Result<(), AudioError> {
        let bytes: Arc<[u8]> = match fs.buffer_file(path) {
            Some(data) => data.clone(),
            None => fs.read_all(path)?.into(),
        };
        if bytes.is_empty() {
            return Err(AudioError::Empty);
        }

        self.duration_ms = if do_duration_calc { calc_duration_ms(bytes.clone())? } else { 0 };
        self.decoder = Some(Mp3Decoder::open(bytes.clone())?);
        self.data = Some(bytes);
        self.reset_buffers();
        debug!("[audio] loaded {path} ({} ms)", self.duration_ms);
        Ok(())
    }

    fn reset_buffers(&mut self) {
        if let Ok(mut b) = self.buffers.lock() {
            *b = Buffers::default();
        }
        self.started = false;
    }

    fn decode_slot(&mut self) -> Slot {
        let Some(decoder) = self.decoder.as_mut() else { return Slot::Eof };
        match decoder.next_block(AUDIO_BUF_SIZE) {
            Ok(Some(block)) => return Slot::Ready(block),
            Ok(None) => {}
            Err(e) => {
                warn!("[audio] mp3 decode failed: {e}");
                return Slot::Eof;
            }
        }

        if !self.play_flags.contains(PlayFlags::LOOP) {
            return Slot::Eof;
        }
        let Some(data) = self.data.clone() else { return Slot::Eof };
        match Mp3Decoder::open(data) {
            Ok(mut fresh) => {
                let slot = match fresh.next_block(AUDIO_BUF_SIZE) {
                    Ok(Some(block)) => Slot::Ready(block),
                    _ => Slot::Eof,
                };
                self.decoder = Some(fresh);
                slot
            }
            Err(e) => {
                warn!("[audio] mp3 reopen failed: {e}");
                Slot::Eof
            }
        }
    }

    pub fn play(&mut self, mixer: &mut Mixer, channel: usize, flags: PlayFlags) {
        if self.data.is_none() || channel >= mixer.channels.len() {
            return;
        }
        self.pause(mixer);
        self.channel = Some(channel);
        self.play_flags = flags;

        let buffered = self.buffers.lock().map(|b| b.buffered_samples).unwrap_or(0);
        if flags.contains(PlayFlags::FROM_START) && buffered > 0 {
            self.restart(mixer);
        }

        if !self.started {
            let first = self.decode_slot();
            let second = match first {
                Slot::Eof => Slot::Eof,
                _ => self.decode_slot(),
            };
            if let Ok(mut b) = self.buffers.lock() {
                b.slots = [first, second];
                b.current = 0;
                b.pos = 0;
            }
            self.started = true;
        }

        let ch = &mut mixer.channels[channel];
        ch.waveforms = Waveform::WAVE;
        ch.set_wave_source(Box::new(Feed(self.buffers.clone())));
        ch.trigger_sustain();
    }

    pub fn pause(&mut self, mixer: &mut Mixer) {
        if let Some(ch) = self.channel.and_then(|c| mixer.channel(c)) {
            ch.off();
            ch.wave_source = None;
        }
    }

    /// Rewind to the start, resuming playback if it was playing.
    pub fn restart(&mut self, mixer: &mut Mixer) {
        let was_playing = self.get_playing(mixer);
        self.pause(mixer);

        if let Some(data) = self.data.clone() {
            match Mp3Decoder::open(data) {
                Ok(d) => self.decoder = Some(d),
                Err(e) => warn!("[audio] mp3 restart failed: {e}"),
            }
        }
        self.reset_buffers();

        if was_playing {
            if let Some(channel) = self.channel {
                self.play(mixer, channel, self.play_flags);
            }
        }
    }

    pub fn get_playing(&self, mixer: &Mixer) -> bool {
        self.channel
            .and_then(|c| mixer.channels.get(c))
            .is_some_and(|ch| ch.adsr_phase() == ADSRPhase::Sustain)
    }

    pub fn get_play_flags(&self) -> PlayFlags {
        self.play_flags
    }

    /// Refill drained buffers. Call regularly from the game's update.
    pub fn update(&mut self) {
        if !self.started {
            return;
        }
        for i in 0..2 {
            let empty = self.buffers.lock().map(|b| b.slots[i] == Slot::Empty).unwrap_or(false);
            if empty {
                let slot = self.decode_slot();
                if let Ok(mut b) = self.buffers.lock() {
                    b.slots[i] = slot;
                }
            }
        }
    }

    /// Samples handed to the channel so far.
    pub fn get_current_sample(&self, mixer: &Mixer) -> u32 {
        let buffered = self.buffers.lock().map(|b| b.buffered_samples).unwrap_or(0);
        let pos = self.channel.and_then(|c| mixer.channels.get(c)).map(|ch| ch.wave_buf_pos).unwrap_or(0);
        buffered + pos as u32
    }

    pub fn get_duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_with(slots: [Slot; 2]) -> (Feed, Arc<Mutex<Buffers>>) {
        let shared = Arc::new(Mutex::new(Buffers { slots, ..Default::default() }));
        (Feed(shared.clone()), shared)
    }

    #[test]
    fn feed_swaps_buffers_and_ends_at_eof() {
        let block: Vec<i16> = (0..WAVE_BUFFER_LEN as i16).collect();
        let (mut feed, shared) = feed_with([Slot::Ready(block), Slot::Eof]);
        let mut out = [0i16; WAVE_BUFFER_LEN];

        assert!(feed.refill(&mut out));
        assert_eq!(out[5], 5);
        {
            let b = shared.lock().unwrap();
            assert_eq!(b.current, 1);
            assert_eq!(b.slots[0], Slot::Empty);
        }
        assert!(!feed.refill(&mut out));
    }

    #[test]
    fn underrun_is_silence() {
        let (mut feed, _) = feed_with([Slot::Empty, Slot::Empty]);
        let mut out = [7i16; WAVE_BUFFER_LEN];
        assert!(feed.refill(&mut out));
        assert!(out.iter().all(|s| *s == 0));
    }

    #[test]
    fn garbage_is_rejected() {
        let mut fs = Filesystem::new(std::env::temp_dir().join("blitkit-no-such-dir"));
        fs.add_buffer_file("noise.mp3", vec![0u8; 16]);
        let mut stream = MP3Stream::new();
        assert!(stream.load(&fs, "noise.mp3", false).is_err());
    }
}
