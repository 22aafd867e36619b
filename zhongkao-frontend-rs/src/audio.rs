use std::collections::HashMap;

use base64::Engine;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
use xxhash_rust::const_xxh3::xxh3_64 as const_xxh3;

/// Gemini's TTS models answer with raw 24 kHz mono PCM.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
pub const SPEECH_CHANNELS: u16 = 1;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("invalid base64 audio: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("audio must have at least one channel")]
    NoChannels,
}

/// Decoded speech, one `Vec<f32>` per channel, ready to copy into an
/// `AudioBuffer`.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechAudio {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl SpeechAudio {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel_data(&self, channel: usize) -> Vec<f32> {
        self.channels.get(channel).cloned().unwrap_or_default()
    }
}

/// Decode base64 signed 16-bit little-endian PCM into planar float samples.
/// A trailing partial sample or frame is dropped.
pub fn decode_pcm16(
    base64_audio: &str,
    sample_rate: u32,
    channels: u16,
) -> Result<SpeechAudio, AudioError> {
    if channels == 0 {
        return Err(AudioError::NoChannels);
    }
    let bytes = base64::engine::general_purpose::STANDARD.decode(base64_audio.trim())?;
    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let channel_count = usize::from(channels);
    let frames = samples.len() / channel_count;
    let mut planar = vec![Vec::with_capacity(frames); channel_count];
    for frame in samples.chunks_exact(channel_count) {
        for (channel, sample) in planar.iter_mut().zip(frame) {
            channel.push(f32::from(*sample) / 32768.0);
        }
    }

    Ok(SpeechAudio {
        sample_rate,
        channels: planar,
    })
}

pub fn encode_recording(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Synthesized speech kept for the lifetime of the page, so replaying a
/// passage doesn't call the provider again.
#[derive(Default, Debug)]
pub struct SpeechCache {
    entries: HashMap<u64, SpeechAudio>,
}

impl SpeechCache {
    pub fn key(text: &str) -> u64 {
        const_xxh3(text.as_bytes())
    }

    pub fn get(&self, text: &str) -> Option<SpeechAudio> {
        self.entries.get(&Self::key(text)).cloned()
    }

    pub fn insert(&mut self, text: &str, audio: SpeechAudio) {
        self.entries.insert(Self::key(text), audio);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
