/// Channel synthesis and streaming, pulled straight from a `Mixer`.
use blitkit::audio::*;
use blitkit::fs::{Filesystem, FsError};

/// Emits `blocks` blocks of a constant sample, then ends.
struct Constant {
    blocks: u32,
    value: i16,
}

impl WaveSource for Constant {
    fn refill(&mut self, buffer: &mut [i16; WAVE_BUFFER_LEN]) -> bool {
        if self.blocks == 0 {
            return false;
        }
        self.blocks -= 1;
        buffer.fill(self.value);
        true
    }
}

fn sustained(mixer: &mut Mixer, waveforms: Waveform) -> &mut AudioChannel {
    let ch = mixer.channel(0).unwrap();
    ch.waveforms = waveforms;
    ch.trigger_sustain();
    ch
}

#[test]
fn untriggered_channel_is_silent() {
    let mut mixer = Mixer::new();
    mixer.channels[0].waveforms = Waveform::SQUARE;
    let mut buf = [0i16; 64];
    mixer.fill(&mut buf);
    assert!(buf.iter().all(|s| *s == 0));
}

#[test]
fn square_wave_starts_high() {
    let mut mixer = Mixer::new();
    sustained(&mut mixer, Waveform::SQUARE);
    let mut buf = [0i16; 4];
    mixer.fill(&mut buf);
    assert!(buf[0] > 0x7000, "got {}", buf[0]);
}

/// A 1 kHz square wave changes sign within one period (22 frames).
#[test]
fn square_wave_alternates() {
    let mut mixer = Mixer::new();
    sustained(&mut mixer, Waveform::SQUARE).frequency = 1000;
    let mut buf = [0i16; 23];
    mixer.fill(&mut buf);
    assert!(buf.iter().any(|s| *s > 0));
    assert!(buf.iter().any(|s| *s < 0));
}

#[test]
fn master_volume_zero_mutes() {
    let mut mixer = Mixer::new();
    mixer.volume = 0;
    sustained(&mut mixer, Waveform::SAW | Waveform::SINE);
    let mut buf = [1i16; 32];
    mixer.fill(&mut buf);
    assert!(buf.iter().all(|s| *s == 0));
}

#[test]
fn channel_volume_scales_output() {
    let mut loud = Mixer::new();
    let mut quiet = Mixer::new();
    sustained(&mut loud, Waveform::SQUARE);
    sustained(&mut quiet, Waveform::SQUARE).volume = 0x4000;
    let (mut a, mut b) = ([0i16; 1], [0i16; 1]);
    loud.fill(&mut a);
    quiet.fill(&mut b);
    assert!(b[0] > 0 && b[0] < a[0] / 3, "{} vs {}", b[0], a[0]);
}

#[test]
fn out_of_range_channel_is_none() {
    let mut mixer = Mixer::new();
    assert!(mixer.channel(CHANNEL_COUNT).is_none());
}

/// Wave sources stream until they run dry, then the channel switches off.
#[test]
fn wave_source_plays_until_exhausted() {
    let mut mixer = Mixer::new();
    let ch = sustained(&mut mixer, Waveform::WAVE);
    ch.set_wave_source(Box::new(Constant { blocks: 2, value: 1000 }));

    let mut buf = [0i16; WAVE_BUFFER_LEN * 3];
    mixer.fill(&mut buf);

    let (played, after) = buf.split_at(WAVE_BUFFER_LEN * 2);
    assert!(played.iter().all(|s| (990..=1000).contains(s)), "{:?}", &played[..4]);
    assert!(after.iter().all(|s| *s == 0));
    assert_eq!(mixer.channels[0].adsr_phase(), ADSRPhase::Off);
    assert!(mixer.channels[0].wave_source.is_none());
}

#[test]
fn waveform_flags_combine() {
    let mut w = Waveform::SQUARE | Waveform::NOISE;
    w |= Waveform::SINE;
    assert_eq!(w.count(), 3);
    assert!(w.contains(Waveform::NOISE));
    assert!(!w.contains(Waveform::SAW));
    assert!(Waveform::NONE.empty());
}

// ── MP3 ───────────────────────────────────────────────────────────────────────

/// 40 mono frames of a low tone at 22050 Hz.
const TONE: &[u8] = include_bytes!("data/tone.mp3");
const TONE_SAMPLES: u32 = 40 * 576;

fn tone_stream(flags: PlayFlags) -> (Mixer, MP3Stream) {
    let mut fs = Filesystem::new(std::env::temp_dir().join("blitkit-audio-no-such-dir"));
    fs.add_buffer_file("tone.mp3", TONE);
    let mut stream = MP3Stream::new();
    stream.load(&fs, "tone.mp3", false).unwrap();
    let mut mixer = Mixer::new();
    stream.play(&mut mixer, 0, flags);
    (mixer, stream)
}

/// Mix `blocks` blocks of 1024 samples, topping the stream up between them
/// the way a game's update would.
fn pump(mixer: &mut Mixer, stream: &mut MP3Stream, blocks: usize) -> Vec<i16> {
    let mut out = vec![0i16; blocks * 1024];
    for chunk in out.chunks_mut(1024) {
        mixer.fill(chunk);
        stream.update();
    }
    out
}

#[test]
fn mp3_load_reports_missing_and_empty_files() {
    let mut fs = Filesystem::new(std::env::temp_dir().join("blitkit-audio-no-such-dir"));
    fs.add_buffer_file("empty.mp3", Vec::<u8>::new());
    let mut stream = MP3Stream::new();

    assert!(matches!(
        stream.load(&fs, "missing.mp3", false),
        Err(AudioError::Fs(FsError::NotFound(_)))
    ));
    assert!(matches!(stream.load(&fs, "empty.mp3", false), Err(AudioError::Empty)));
}

/// Playing before a successful load leaves the mixer untouched.
#[test]
fn mp3_play_without_data_is_ignored() {
    let mut mixer = Mixer::new();
    let mut stream = MP3Stream::new();
    stream.play(&mut mixer, 0, PlayFlags::FROM_START);
    assert!(!stream.get_playing(&mixer));
    assert_eq!(mixer.channels[0].adsr_phase(), ADSRPhase::Off);
    assert_eq!(stream.get_current_sample(&mixer), 0);
    assert_eq!(stream.get_duration_ms(), 0);
}

#[test]
fn mp3_duration_is_measured_on_request() {
    let mut fs = Filesystem::new(std::env::temp_dir().join("blitkit-audio-no-such-dir"));
    fs.add_buffer_file("tone.mp3", TONE);
    let mut stream = MP3Stream::new();

    stream.load(&fs, "tone.mp3", false).unwrap();
    assert_eq!(stream.get_duration_ms(), 0);
    stream.load(&fs, "tone.mp3", true).unwrap();
    // 23040 samples at 22050 Hz
    assert!((1000..=1050).contains(&stream.get_duration_ms()));
}

#[test]
fn mp3_plays_through_and_stops_at_the_end() {
    let (mut mixer, mut stream) = tone_stream(PlayFlags::NONE);
    assert!(stream.get_playing(&mixer));
    assert_eq!(mixer.channels[0].waveforms, Waveform::WAVE);

    let out = pump(&mut mixer, &mut stream, 30);
    assert!(out[..TONE_SAMPLES as usize].iter().any(|s| *s != 0));
    assert!(out[TONE_SAMPLES as usize + 64..].iter().all(|s| *s == 0));

    assert!(!stream.get_playing(&mixer));
    assert_eq!(mixer.channels[0].adsr_phase(), ADSRPhase::Off);
    assert!((TONE_SAMPLES - 576..=TONE_SAMPLES).contains(&stream.get_current_sample(&mixer)));
}

#[test]
fn mp3_loop_restarts_at_the_end() {
    let (mut mixer, mut stream) = tone_stream(PlayFlags::LOOP);
    assert_eq!(stream.get_play_flags(), PlayFlags::LOOP);

    let out = pump(&mut mixer, &mut stream, 60);
    assert!(stream.get_playing(&mixer));
    assert!(stream.get_current_sample(&mixer) > 2 * TONE_SAMPLES);

    // the second pass sounds like the first
    let second = &out[TONE_SAMPLES as usize..2 * TONE_SAMPLES as usize];
    assert!(second.iter().any(|s| *s != 0));
}

#[test]
fn mp3_pause_resume_and_restart() {
    let (mut mixer, mut stream) = tone_stream(PlayFlags::NONE);
    pump(&mut mixer, &mut stream, 4);

    stream.pause(&mut mixer);
    assert!(!stream.get_playing(&mixer));
    let paused_at = stream.get_current_sample(&mixer);
    assert!(paused_at >= 4096);

    stream.play(&mut mixer, 0, PlayFlags::NONE);
    assert!(stream.get_playing(&mixer));
    assert!(stream.get_current_sample(&mixer) >= paused_at);

    stream.restart(&mut mixer);
    assert!(stream.get_playing(&mixer));
    assert!(stream.get_current_sample(&mixer) <= WAVE_BUFFER_LEN as u32);

    pump(&mut mixer, &mut stream, 2);
    stream.play(&mut mixer, 0, PlayFlags::FROM_START);
    assert!(stream.get_current_sample(&mixer) <= WAVE_BUFFER_LEN as u32);
}
