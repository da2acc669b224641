//! Sound engine: procedural arcade effects via rodio.
//!
//! Every effect is synthesised into an in-memory WAV buffer once at start
//! up; playback is fire-and-forget on rodio's own thread.
//!
//! Without the `sound` feature `SoundEngine` is a stub that plays nothing.

use crate::sim::event::GameEvent;

/// The effects the game can play.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Chomp,
    Power,
    GhostEaten,
    Death,
    LevelClear,
}

impl Sfx {
    #[cfg_attr(not(any(feature = "sound", test)), allow(dead_code))]
    pub const ALL: [Sfx; 5] = [Sfx::Chomp, Sfx::Power, Sfx::GhostEaten, Sfx::Death, Sfx::LevelClear];

    /// The effect a simulation event triggers, if any.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::PelletEaten { .. } => Some(Sfx::Chomp),
            GameEvent::PowerPelletEaten { .. } => Some(Sfx::Power),
            GameEvent::GhostEaten { .. } => Some(Sfx::GhostEaten),
            GameEvent::PlayerCaught { .. } => Some(Sfx::Death),
            GameEvent::LevelCleared { .. } => Some(Sfx::LevelClear),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Synthesis: mono f32 samples, then 16-bit PCM WAV
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(any(feature = "sound", test)), allow(dead_code))]
mod synth {
    use std::f32::consts::TAU;

    use super::Sfx;

    pub const SAMPLE_RATE: u32 = 22050;

    /// A tone whose frequency glides linearly from `from` to `to` Hz, with
    /// a fade-out envelope. Square-ish timbre from an added third harmonic.
    fn glide(from: f32, to: f32, secs: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * secs) as usize;
        let mut phase = 0.0f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                let wave = (phase * TAU).sin() * 0.75 + (phase * 3.0 * TAU).sin() * 0.25;
                wave * (1.0 - t).powf(0.7) * volume
            })
            .collect()
    }

    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        seq.iter().flat_map(|&(freq, secs)| glide(freq, freq, secs, volume)).collect()
    }

    pub fn samples(sfx: Sfx) -> Vec<f32> {
        match sfx {
            // "waka": down then up
            Sfx::Chomp => {
                let mut s = glide(520.0, 260.0, 0.05, 0.2);
                s.extend(glide(260.0, 520.0, 0.05, 0.2));
                s
            }
            Sfx::Power => glide(200.0, 900.0, 0.25, 0.25),
            Sfx::GhostEaten => {
                let mut s = glide(300.0, 1400.0, 0.12, 0.25);
                s.extend(glide(1400.0, 700.0, 0.06, 0.2));
                s
            }
            Sfx::Death => (0..6)
                .flat_map(|i| {
                    let top = 700.0 - i as f32 * 90.0;
                    glide(top, top - 120.0, 0.09, 0.3)
                })
                .collect(),
            // C5 E5 G5 C6
            Sfx::LevelClear => notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3),
        }
    }

    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVEfmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use tracing::{debug, warn};

    use super::{synth, Sfx};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<(Sfx, Arc<Vec<u8>>)>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "no audio output; sound disabled");
                    return None;
                }
            };
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| (sfx, Arc::new(synth::make_wav(&synth::samples(sfx)))))
                .collect();
            debug!("sound effects ready");
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some((_, buf)) = self.buffers.iter().find(|(s, _)| *s == sfx) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = Decoder::new(Cursor::new(buf.as_ref().clone())) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

impl SoundEngine {
    /// Play the effect for each event. One chomp per tick is enough.
    pub fn play_events(&self, events: &[GameEvent]) {
        let mut played: Vec<Sfx> = Vec::with_capacity(2);
        for sfx in events.iter().filter_map(Sfx::for_event) {
            if !played.contains(&sfx) {
                self.play(sfx);
                played.push(sfx);
            }
        }
    }
}
