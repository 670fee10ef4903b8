use assert_no_alloc::assert_no_alloc;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio::Stereo;
use crate::engine::Engine;
use crate::error::AudioError;
use crate::{INTERNAL_BUFFER_SIZE, SAMPLE_RATE};

/// The running output context: a cpal stream with the engine living inside
/// its callback. Constructed once, by explicit user action.
pub struct Host {
    stream: cpal::Stream,
}

impl Host {
    pub fn run(mut engine: Engine) -> Result<Host, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceUnavailable)?;
        let config = cpal::StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(SAMPLE_RATE as u32),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut buf = [Stereo::ZERO; INTERNAL_BUFFER_SIZE];
        let stream = device.build_output_stream(
            &config,
            move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
                assert_no_alloc(|| {
                    for out_block in output.chunks_mut(2 * INTERNAL_BUFFER_SIZE) {
                        let frames = out_block.len() / 2;
                        let block = &mut buf[..frames];
                        block.fill(Stereo::ZERO);
                        engine.render(block);
                        for (i, frame) in block.iter().enumerate() {
                            out_block[2 * i] = frame.channel(0);
                            out_block[2 * i + 1] = frame.channel(1);
                        }
                    }
                });
            },
            |err| log::warn!("output stream error: {err}"),
            None,
        )?;
        stream.play()?;
        log::info!(
            "audio output running on {} at {} Hz",
            device.name().unwrap_or_else(|_| String::from("<unnamed>")),
            SAMPLE_RATE
        );
        Ok(Host { stream })
    }

    pub fn shutdown(self) -> Result<(), AudioError> {
        self.stream.pause()?;
        Ok(())
    }
}
