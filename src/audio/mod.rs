// =============================================================================
// AUDIO — the channel synthesiser
//
// Eight channels, each mixing any combination of noise, square, saw, triangle
// and sine oscillators (or a streamed wave buffer) through an ADSR envelope
// and an optional one-pole filter. Output is 22050 Hz mono.
//
// The `Mixer` is plain data. The host shares it behind `Arc<Mutex<_>>` and
// pulls frames from its audio thread; games poke channels from `update`.
// =============================================================================

pub mod mp3;

use std::ops::{BitOr, BitOrAssign};

use thiserror::Error;

use crate::fs::FsError;

pub use mp3::{MP3Stream, PlayFlags};

pub const SAMPLE_RATE: u32 = 22050;
pub const CHANNEL_COUNT: usize = 8;
pub const WAVE_BUFFER_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no playable audio track")]
    NoTrack,
    #[error("empty audio file")]
    Empty,
    #[error("decode failed: {0}")]
    Decode(#[from] symphonia::core::errors::Error),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error("audio output: {0}")]
    Output(String),
}

// ── Waveforms ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Waveform(pub u8);

impl Waveform {
    pub const NONE: Self = Self(0);
    pub const NOISE: Self = Self(128);
    pub const SQUARE: Self = Self(64);
    pub const SAW: Self = Self(32);
    pub const TRIANGLE: Self = Self(16);
    pub const SINE: Self = Self(8);
    pub const WAVE: Self = Self(1);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl BitOr for Waveform {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

impl BitOrAssign for Waveform {
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

#[rustfmt::skip]
const SINE_WAVEFORM: [i16; 256] = [
    -32768,-32758,-32729,-32679,-32610,-32522,-32413,-32286,-32138,-31972,-31786,-31581,-31357,-31114,-30853,-30572,
    -30274,-29957,-29622,-29269,-28899,-28511,-28106,-27684,-27246,-26791,-26320,-25833,-25330,-24812,-24279,-23732,
    -23170,-22595,-22006,-21403,-20788,-20160,-19520,-18868,-18205,-17531,-16846,-16151,-15447,-14733,-14010,-13279,
    -12540,-11793,-11039,-10279,-9512,-8740,-7962,-7180,-6393,-5602,-4808,-4011,-3212,-2411,-1608,-804,
    0,804,1608,2411,3212,4011,4808,5602,6393,7180,7962,8740,9512,10279,11039,11793,
    12540,13279,14010,14733,15447,16151,16846,17531,18205,18868,19520,20160,20788,21403,22006,22595,
    23170,23732,24279,24812,25330,25833,26320,26791,27246,27684,28106,28511,28899,29269,29622,29957,
    30274,30572,30853,31114,31357,31581,31786,31972,32138,32286,32413,32522,32610,32679,32729,32758,
    32767,32758,32729,32679,32610,32522,32413,32286,32138,31972,31786,31581,31357,31114,30853,30572,
    30274,29957,29622,29269,28899,28511,28106,27684,27246,26791,26320,25833,25330,24812,24279,23732,
    23170,22595,22006,21403,20788,20160,19520,18868,18205,17531,16846,16151,15447,14733,14010,13279,
    12540,11793,11039,10279,9512,8740,7962,7180,6393,5602,4808,4011,3212,2411,1608,804,
    0,-804,-1608,-2411,-3212,-4011,-4808,-5602,-6393,-7180,-7962,-8740,-9512,-10279,-11039,-11793,
    -12540,-13279,-14010,-14733,-15447,-16151,-16846,-17531,-18205,-18868,-19520,-20160,-20788,-21403,-22006,-22595,
    -23170,-23732,-24279,-24812,-25330,-25833,-26320,-26791,-27246,-27684,-28106,-28511,-28899,-29269,-29622,-29957,
    -30274,-30572,-30853,-31114,-31357,-31581,-31786,-31972,-32138,-32286,-32413,-32522,-32610,-32679,-32729,-32758,
];

// ── Channel ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ADSRPhase {
    Attack,
    Decay,
    Sustain,
    Release,
    #[default]
    Off,
}

/// Supplies wave-buffer samples to a channel playing `Waveform::WAVE`.
pub trait WaveSource: Send {
    /// Fill `buffer` with the next block. Returning `false` ends playback and
    /// switches the channel off.
    fn refill(&mut self, buffer: &mut [i16; WAVE_BUFFER_LEN]) -> bool;
}

pub struct AudioChannel {
    pub waveforms: Waveform,
    /// Hz.
    pub frequency: u16,
    pub volume: u16,

    pub attack_ms: u16,
    pub decay_ms: u16,
    /// Sustain level, 0..=0xffff.
    pub sustain: u16,
    pub release_ms: u16,
    /// Square wave duty, compared against the 16-bit waveform offset.
    pub pulse_width: u16,
    pub noise: i32,

    /// Q16 position within the current cycle.
    pub waveform_offset: u32,

    pub filter_enable: bool,
    pub filter_cutoff_frequency: u16,
    filter_last_sample: i64,

    pub wave_buffer: [i16; WAVE_BUFFER_LEN],
    pub wave_buf_pos: usize,
    pub wave_source: Option<Box<dyn WaveSource>>,

    adsr_frame: u32,
    adsr_end_frame: u32,
    /// 24-bit envelope level.
    adsr: i32,
    adsr_step: i32,
    adsr_phase: ADSRPhase,
}

impl Default for AudioChannel {
    fn default() -> Self {
        Self {
            waveforms: Waveform::NONE,
            frequency: 660,
            volume: 0xffff,
            attack_ms: 2,
            decay_ms: 6,
            sustain: 0xffff,
            release_ms: 1,
            pulse_width: 0x7fff,
            noise: 0,
            waveform_offset: 0,
            filter_enable: false,
            filter_cutoff_frequency: 0,
            filter_last_sample: 0,
            wave_buffer: [0; WAVE_BUFFER_LEN],
            wave_buf_pos: 0,
            wave_source: None,
            adsr_frame: 0,
            adsr_end_frame: 0,
            adsr: 0,
            adsr_step: 0,
            adsr_phase: ADSRPhase::Off,
        }
    }
}

impl std::fmt::Debug for AudioChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioChannel")
            .field("waveforms", &self.waveforms)
            .field("frequency", &self.frequency)
            .field("volume", &self.volume)
            .field("adsr_phase", &self.adsr_phase)
            .field("wave_source", &self.wave_source.is_some())
            .finish()
    }
}

impl AudioChannel {
    pub fn adsr_phase(&self) -> ADSRPhase {
        self.adsr_phase
    }

    /// Current envelope level, 0..=0xffffff.
    pub fn adsr(&self) -> u32 {
        self.adsr as u32
    }

    fn ramp_to(&mut self, target: i32, ms: u16, phase: ADSRPhase) {
        self.adsr_frame = 0;
        self.adsr_phase = phase;
        self.adsr_end_frame = (ms as u32 * SAMPLE_RATE / 1000).max(1);
        self.adsr_step = (target - self.adsr) / self.adsr_end_frame as i32;
    }

    pub fn trigger_attack(&mut self) {
        self.ramp_to(0xffffff, self.attack_ms, ADSRPhase::Attack);
    }

    pub fn trigger_decay(&mut self) {
        self.ramp_to((self.sustain as i32) << 8, self.decay_ms, ADSRPhase::Decay);
    }

    pub fn trigger_sustain(&mut self) {
        self.adsr_frame = 0;
        self.adsr_end_frame = 0;
        self.adsr_phase = ADSRPhase::Sustain;
        self.adsr = (self.sustain as i32) << 8;
        self.adsr_step = 0;
    }

    pub fn trigger_release(&mut self) {
        self.ramp_to(0, self.release_ms, ADSRPhase::Release);
    }

    pub fn off(&mut self) {
        self.adsr_frame = 0;
        self.adsr_end_frame = 0;
        self.adsr_phase = ADSRPhase::Off;
        self.adsr = 0;
        self.adsr_step = 0;
    }

    /// Attach a streaming source and prime the wave buffer from it.
    pub fn set_wave_source(&mut self, mut source: Box<dyn WaveSource>) {
        self.wave_buf_pos = 0;
        if !source.refill(&mut self.wave_buffer) {
            self.wave_buffer = [0; WAVE_BUFFER_LEN];
        }
        self.wave_source = Some(source);
    }

    fn next_wave_sample(&mut self) -> i64 {
        let sample = self.wave_buffer[self.wave_buf_pos] as i64;
        self.wave_buf_pos += 1;
        if self.wave_buf_pos == WAVE_BUFFER_LEN {
            self.wave_buf_pos = 0;
            let more = match self.wave_source.as_mut() {
                Some(source) => source.refill(&mut self.wave_buffer),
                None => true,
            };
            if !more {
                self.wave_source = None;
                self.off();
            }
        }
        sample
    }

    /// One envelope-scaled sample, or `None` when the channel is silent.
    fn next_sample(&mut self, noise: &mut impl FnMut() -> i32) -> Option<i64> {
        self.waveform_offset = self
            .waveform_offset
            .wrapping_add(((self.frequency as u32 * 256) << 8) / SAMPLE_RATE);

        if self.adsr_phase == ADSRPhase::Off {
            return None;
        }

        if self.adsr_frame >= self.adsr_end_frame {
            match self.adsr_phase {
                ADSRPhase::Attack => self.trigger_decay(),
                ADSRPhase::Decay => self.trigger_sustain(),
                ADSRPhase::Release => self.off(),
                ADSRPhase::Sustain | ADSRPhase::Off => {}
            }
        }

        self.adsr = (self.adsr + self.adsr_step).clamp(0, 0xffffff);
        self.adsr_frame += 1;

        if self.waveform_offset & 0x10000 != 0 {
            self.noise = noise();
        }
        self.waveform_offset &= 0xffff;

        if self.waveforms.empty() {
            return None;
        }

        let offset = self.waveform_offset as i64;
        let mut s: i64 = 0;
        if self.waveforms.contains(Waveform::NOISE) {
            s += (self.noise as i64 - 0x7fff) >> 2;
        }
        if self.waveforms.contains(Waveform::SAW) {
            s += offset - 0x7fff;
        }
        if self.waveforms.contains(Waveform::TRIANGLE) {
            s += if offset < 0x7fff { offset * 2 - 0x7fff } else { 0x7fff - (offset - 0x7fff) * 2 };
        }
        if self.waveforms.contains(Waveform::SQUARE) {
            s += if offset < self.pulse_width as i64 { 0x7fff } else { -0x7fff };
        }
        if self.waveforms.contains(Waveform::SINE) {
            s += SINE_WAVEFORM[(offset >> 8) as usize] as i64;
        }
        if self.waveforms.contains(Waveform::WAVE) {
            s += self.next_wave_sample();
        }

        s /= self.waveforms.count() as i64;
        s = (s * (self.adsr as i64 >> 8)) >> 16;
        s = (s * self.volume as i64) >> 16;

        if self.filter_enable {
            let cutoff = self.filter_cutoff_frequency as f32;
            let epow = 1.0 - (-(1.0 / SAMPLE_RATE as f32) * 2.0 * std::f32::consts::PI * cutoff).exp();
            s += ((s - self.filter_last_sample) as f32 * epow) as i64;
        }
        self.filter_last_sample = s;

        Some(s)
    }
}

// ── Mixer ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Mixer {
    pub channels: [AudioChannel; CHANNEL_COUNT],
    /// Master volume, 0..=0xffff.
    pub volume: u16,
    noise_state: u32,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            channels: std::array::from_fn(|_| AudioChannel::default()),
            volume: 0xffff,
            noise_state: 0x2545_f491,
        }
    }

    /// Next unsigned output sample, centred on 0x7fff.
    pub fn get_audio_frame(&mut self) -> u16 {
        let state = &mut self.noise_state;
        let mut noise = || {
            *state ^= *state << 13;
            *state ^= *state >> 17;
            *state ^= *state << 5;
            (*state & 0xffff) as i32
        };

        let mut sample: i64 = 0;
        for channel in self.channels.iter_mut() {
            if let Some(s) = channel.next_sample(&mut noise) {
                sample += s;
            }
        }

        sample = (sample * self.volume as i64) >> 16;
        (sample.clamp(-0x7fff, 0x7fff) + 0x7fff) as u16
    }

    /// Fill `out` with signed samples.
    pub fn fill(&mut self, out: &mut [i16]) {
        for s in out.iter_mut() {
            *s = (self.get_audio_frame() as i32 - 0x7fff) as i16;
        }
    }

    pub fn channel(&mut self, index: usize) -> Option<&mut AudioChannel> {
        self.channels.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_mixer_sits_at_midpoint() {
        let mut mixer = Mixer::new();
        assert_eq!(mixer.get_audio_frame(), 0x7fff);
        let mut buf = [1i16; 16];
        mixer.fill(&mut buf);
        assert!(buf.iter().all(|s| *s == 0));
    }

    #[test]
    fn envelope_walks_through_phases() {
        let mut mixer = Mixer::new();
        let ch = &mut mixer.channels[0];
        ch.waveforms = Waveform::SQUARE;
        ch.attack_ms = 1;
        ch.decay_ms = 1;
        ch.sustain = 0x8000;
        ch.trigger_attack();
        assert_eq!(ch.adsr_phase(), ADSRPhase::Attack);

        // 1ms at 22050 Hz is 22 frames per ramp
        for _ in 0..23 {
            mixer.get_audio_frame();
        }
        assert_eq!(mixer.channels[0].adsr_phase(), ADSRPhase::Decay);
        for _ in 0..23 {
            mixer.get_audio_frame();
        }
        assert_eq!(mixer.channels[0].adsr_phase(), ADSRPhase::Sustain);
        assert_eq!(mixer.channels[0].adsr(), 0x8000 << 8);

        mixer.channels[0].trigger_release();
        for _ in 0..23 {
            mixer.get_audio_frame();
        }
        assert_eq!(mixer.channels[0].adsr_phase(), ADSRPhase::Off);
    }
}
