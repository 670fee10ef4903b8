use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use ringbuf::{Consumer, Producer, RingBuffer};

use crate::clip;
use crate::error::AudioError;

// Headroom between the input callback and the UI tick draining it
const CAPTURE_QUEUE_SECONDS: usize = 4;

/// Microphone capture with an Idle → Recording → Idle lifecycle. While
/// recording, the stream callback pushes samples into a pre-allocated ring
/// and the UI tick drains them into ordered chunks; `stop` finalizes the
/// chunks into one WAV image.
pub struct Recorder {
    session: Option<Session>,
}

struct Session {
    stream: cpal::Stream,
    consumer: Consumer<f32>,
    chunks: Vec<Vec<f32>>,
    sample_rate: u32,
    channels: u16,
    overruns: Arc<AtomicUsize>,
}

impl Session {
    fn drain(&mut self) {
        if self.consumer.is_empty() {
            return;
        }
        let mut chunk = Vec::with_capacity(self.consumer.len());
        while let Some(sample) = self.consumer.pop() {
            chunk.push(sample);
        }
        self.chunks.push(chunk);
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self { session: None }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Acquires the default input device and starts accumulating samples.
    /// A start while already recording is rejected by the app layer; if it
    /// happens anyway the active session is left untouched.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.session.is_some() {
            log::warn!("start ignored, capture already active");
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::DeviceUnavailable)?;
        let config = device.default_input_config()?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let capacity = sample_rate as usize * channels as usize * CAPTURE_QUEUE_SECONDS;
        let (producer, consumer) = RingBuffer::new(capacity).split();
        let overruns = Arc::new(AtomicUsize::new(0));

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &config.into(), producer, overruns.clone())
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &config.into(), producer, overruns.clone())
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &config.into(), producer, overruns.clone())
            }
            format => Err(AudioError::Stream(format!(
                "unsupported input sample format {format:?}"
            ))),
        }?;
        stream.play()?;

        log::info!(
            "recording from {} ({channels} ch at {sample_rate} Hz)",
            device.name().unwrap_or_else(|_| String::from("<unnamed>"))
        );
        self.session = Some(Session {
            stream,
            consumer,
            chunks: Vec::new(),
            sample_rate,
            channels,
            overruns,
        });
        Ok(())
    }

    /// Moves pending samples out of the ring. Call from every UI tick while
    /// recording so long takes never overrun the queue.
    pub fn poll(&mut self) {
        if let Some(session) = &mut self.session {
            session.drain();
        }
    }

    /// Finalizes the active session into a WAV image at the captured rate
    /// and channel count. A stop while idle is a no-op returning `None`.
    pub fn stop(&mut self) -> Result<Option<Vec<u8>>, AudioError> {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => return Ok(None),
        };

        session.stream.pause().ok();
        session.drain();

        let overruns = session.overruns.load(Ordering::Relaxed);
        if overruns > 0 {
            log::warn!("capture queue overran, {overruns} samples lost");
        }

        let samples = concat_chunks(&session.chunks);
        log::info!(
            "captured {} frames at {} Hz",
            samples.len() / session.channels as usize,
            session.sample_rate
        );
        let data = clip::encode_wav(&samples, session.channels, session.sample_rate)?;
        Ok(Some(data))
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

fn concat_chunks(chunks: &[Vec<f32>]) -> Vec<f32> {
    let mut samples = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
    for chunk in chunks {
        samples.extend_from_slice(chunk);
    }
    samples
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut producer: Producer<f32>,
    overruns: Arc<AtomicUsize>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mut dropped = 0;
            for &sample in data {
                if producer.push(f32::from_sample(sample)).is_err() {
                    dropped += 1;
                }
            }
            if dropped > 0 {
                overruns.fetch_add(dropped, Ordering::Relaxed);
            }
        },
        |err| log::warn!("input stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_concatenate_in_arrival_order() {
        let chunks = vec![vec![0.1, 0.2], vec![], vec![0.3]];
        assert_eq!(concat_chunks(&chunks), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn stop_while_idle_is_a_no_op() {
        let mut recorder = Recorder::new();
        assert!(!recorder.is_recording());
        assert!(matches!(recorder.stop(), Ok(None)));
    }
}
