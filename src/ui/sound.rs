/// Sound engine: procedural beat cues via rodio.
///
/// All fixed cues are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing).

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_activate: Arc<Vec<u8>>,
        sfx_deactivate: Arc<Vec<u8>>,
        sfx_ready: Arc<Vec<u8>>,
        sfx_round: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::info!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_activate: Arc::new(make_wav(&gen_activate())),
                sfx_deactivate: Arc::new(make_wav(&gen_deactivate())),
                sfx_ready: Arc::new(make_wav(&gen_blip(880.0, 0.03, 0.12))),
                sfx_round: Arc::new(make_wav(&gen_round_complete())),
            })
        }

        fn play_buf(&self, buf: Vec<u8>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(buf)) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            self.play_buf(buf.as_ref().clone());
        }

        pub fn play_activate(&self) { self.play(&self.sfx_activate); }
        pub fn play_deactivate(&self) { self.play(&self.sfx_deactivate); }
        pub fn play_ready(&self) { self.play(&self.sfx_ready); }
        pub fn play_round_complete(&self) { self.play(&self.sfx_round); }

        /// Consumed step: pitch rises as the round nears its end.
        pub fn play_step(&self, remaining: usize, total: usize) {
            let done = total.saturating_sub(remaining) as f32 / total.max(1) as f32;
            let freq = 330.0 + done * 660.0;
            self.play_buf(make_wav(&gen_blip(freq, 0.06, 0.25)));
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Sequence of short notes with a soft square-ish tone.
    fn gen_notes(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Activate: two rising notes, G4 → D5
    fn gen_activate() -> Vec<f32> {
        gen_notes(&[392.0, 587.0], 0.07, 0.25)
    }

    /// Deactivate: two falling notes, D5 → G4
    fn gen_deactivate() -> Vec<f32> {
        gen_notes(&[587.0, 392.0], 0.07, 0.2)
    }

    /// Round complete: C5 → E5 → G5 → C6 with a held last note
    fn gen_round_complete() -> Vec<f32> {
        let mut samples = gen_notes(&[523.0, 659.0, 784.0], 0.08, 0.3);
        let last = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            samples.push((t * last * TAU).sin() * env * 0.3);
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&[0.0, 1.0, -1.0]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 6);
            assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
            assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), 32767);
        }

        #[test]
        fn cues_are_not_empty() {
            assert!(!gen_activate().is_empty());
            assert!(!gen_deactivate().is_empty());
            assert!(gen_round_complete().len() > gen_blip(440.0, 0.06, 0.2).len());
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_activate(&self) {}
    pub fn play_deactivate(&self) {}
    pub fn play_ready(&self) {}
    pub fn play_round_complete(&self) {}
    pub fn play_step(&self, _remaining: usize, _total: usize) {}
}

/// Map game events onto cues.
pub fn play_events(sound: Option<&SoundEngine>, events: &[GameEvent], round_len: usize) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Activated => sfx.play_activate(),
            GameEvent::Deactivated => sfx.play_deactivate(),
            GameEvent::StepReady { .. } => sfx.play_ready(),
            GameEvent::StepConsumed { remaining, .. } => sfx.play_step(*remaining, round_len),
            GameEvent::RoundComplete => sfx.play_round_complete(),
            GameEvent::RoundBuilt { .. } | GameEvent::RoundCleared { .. } => {}
        }
    }
}
