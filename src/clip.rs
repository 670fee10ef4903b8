use std::fmt;
use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rand::Rng;
use ratatui::style::Color;

use crate::audio::{Buffer, Stereo};
use crate::error::AudioError;
use crate::MAX_CLIPS;

/// Stable identifier of a clip: its position in the bank at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipId(pub usize);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Pads are labeled 1-based
        write!(f, "{}", self.0 + 1)
    }
}

/// One finalized recording: the WAV image produced by the capture unit plus
/// the user-toggled loop flag.
pub struct Clip {
    pub id: ClipId,
    pub looped: bool,
    pub color: Color,
    data: Vec<u8>,
}

impl Clip {
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

const PAD_COLORS: [Color; 6] = [
    Color::Magenta,
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::LightRed,
];

/// Append-only collection of clips. Ids are assigned from the bank length,
/// so they stay unique and monotone; nothing is ever removed in-session.
pub struct ClipBank {
    clips: Vec<Clip>,
}

impl ClipBank {
    pub fn new() -> Self {
        Self {
            clips: Vec::with_capacity(MAX_CLIPS),
        }
    }

    pub fn append(&mut self, data: Vec<u8>) -> Result<&Clip, AudioError> {
        if self.clips.len() >= MAX_CLIPS {
            return Err(AudioError::BankFull(MAX_CLIPS));
        }
        let id = ClipId(self.clips.len());
        let color = PAD_COLORS[rand::thread_rng().gen_range(0..PAD_COLORS.len())];
        self.clips.push(Clip {
            id,
            looped: false,
            color,
            data,
        });
        Ok(&self.clips[id.0])
    }

    /// Flips the loop flag and returns the new value.
    pub fn toggle_loop(&mut self, id: ClipId) -> Option<bool> {
        let clip = self.clips.get_mut(id.0)?;
        clip.looped = !clip.looped;
        Some(clip.looped)
    }

    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.clips.iter()
    }
}

impl Default for ClipBank {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoded clip, ready for the engine: stereo frames plus the rate they
/// were captured at (folded into the playback ratio at trigger time).
pub struct Sound {
    pub frames: Buffer,
    pub sample_rate: u32,
}

/// Serializes captured samples into an in-memory WAV image. Interleaved
/// input, 32-bit float output at the capture rate.
pub fn encode_wav(samples: &[f32], channels: u16, sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut data = Vec::new();
    let mut writer = WavWriter::new(Cursor::new(&mut data), spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(data)
}

/// Decodes a WAV image into stereo frames. Mono sources play on both
/// channels; extra channels beyond the second are dropped.
pub fn decode(data: &[u8]) -> Result<Sound, AudioError> {
    let mut wav = WavReader::new(Cursor::new(data))?;
    let spec = wav.spec();

    let samples = match spec.sample_format {
        SampleFormat::Int => {
            let scale = f32::powi(2.0, spec.bits_per_sample as i32 - 1);
            wav.samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<Vec<f32>, _>>()?
        }
        SampleFormat::Float => wav.samples::<f32>().collect::<Result<Vec<f32>, _>>()?,
    };

    let frames: Buffer = samples
        .chunks(spec.channels as usize)
        .map(|frame| {
            let left = *frame.first().unwrap_or(&0.0);
            let right = *frame.get(1).unwrap_or(&left);
            Stereo::new([left, right])
        })
        .collect();

    Ok(Sound {
        frames,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_monotone_ids() {
        let mut bank = ClipBank::new();
        let data = encode_wav(&[0.0; 32], 1, 44100).unwrap();
        let first = bank.append(data.clone()).unwrap();
        assert_eq!(first.id, ClipId(0));
        assert!(!first.looped);
        let second = bank.append(data).unwrap();
        assert_eq!(second.id, ClipId(1));
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn bank_is_bounded() {
        let mut bank = ClipBank::new();
        let data = encode_wav(&[0.0; 4], 1, 44100).unwrap();
        for _ in 0..MAX_CLIPS {
            bank.append(data.clone()).unwrap();
        }
        assert!(matches!(
            bank.append(data),
            Err(AudioError::BankFull(MAX_CLIPS))
        ));
    }

    #[test]
    fn toggle_loop_is_its_own_inverse() {
        let mut bank = ClipBank::new();
        let data = encode_wav(&[0.0; 4], 1, 44100).unwrap();
        let id = bank.append(data).unwrap().id;
        assert_eq!(bank.toggle_loop(id), Some(true));
        assert_eq!(bank.toggle_loop(id), Some(false));
        assert_eq!(bank.toggle_loop(ClipId(7)), None);
    }

    #[test]
    fn decode_mono_duplicates_channels() {
        let samples = [0.25f32, -0.5, 1.0];
        let data = encode_wav(&samples, 1, 22050).unwrap();
        let sound = decode(&data).unwrap();
        assert_eq!(sound.sample_rate, 22050);
        assert_eq!(sound.frames.len(), 3);
        assert_eq!(sound.frames[1], Stereo::new([-0.5, -0.5]));
    }

    #[test]
    fn decode_stereo_keeps_channels() {
        let samples = [0.1f32, -0.1, 0.2, -0.2];
        let data = encode_wav(&samples, 2, 48000).unwrap();
        let sound = decode(&data).unwrap();
        assert_eq!(sound.frames.len(), 2);
        assert_eq!(sound.frames[0], Stereo::new([0.1, -0.1]));
        assert_eq!(sound.frames[1], Stereo::new([0.2, -0.2]));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(&[0u8; 16]).is_err());
    }
}
