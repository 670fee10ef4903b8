use std::sync::Arc;

use basedrop::{Collector, Shared};
use param_derive::Params;
use ringbuf::{Producer, RingBuffer};
use triple_buffer::{Output, TripleBuffer};

use crate::clip::{self, Clip, ClipId};
use crate::engine::{Engine, EngineCommand, EngineState};
use crate::error::AudioError;
use crate::params::{format_percent, format_ratio, Param, ParamInfo, Params};
use crate::SAMPLE_RATE;

const COMMAND_QUEUE_SIZE: usize = 16;

/// The two knobs of the effect surface. Read at trigger time only; changing
/// them never touches a voice that is already sounding.
#[derive(Params)]
pub struct EffectParams {
    pub pitch: Param,
    pub volume: Param,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            pitch: Param::new(
                1.0,
                ParamInfo::new("Pitch", 0.5, 2.0)
                    .with_steps([0.01, 0.1])
                    .with_formatter(format_ratio),
            ),
            volume: Param::new(
                1.0,
                ParamInfo::new("Volume", 0.0, 1.0)
                    .with_steps([0.01, 0.1])
                    .with_formatter(format_percent),
            ),
        }
    }
}

/// Builds the plumbing between the UI thread and the audio thread: the
/// command queue, the state snapshot buffer, and the collector that reclaims
/// clip buffers the audio thread has dropped.
pub fn controls(allow_overlap: bool) -> (AppControl, Engine) {
    let (state_input, state_output) = TripleBuffer::new(&EngineState::default()).split();
    let (producer, consumer) = RingBuffer::new(COMMAND_QUEUE_SIZE).split();
    let engine = Engine::new(state_input, consumer, allow_overlap);
    let control = AppControl {
        producer,
        collector: Collector::new(),
        params: Arc::new(EffectParams::default()),
        engine_state: state_output,
        snapshot: EngineState::default(),
    };
    (control, engine)
}

pub struct AppControl {
    producer: Producer<EngineCommand>,
    collector: Collector,
    params: Arc<EffectParams>,
    engine_state: Output<EngineState>,
    snapshot: EngineState,
}

impl AppControl {
    pub fn params(&self) -> &Arc<EffectParams> {
        &self.params
    }

    /// Decodes the clip and starts a voice with the pitch and volume read
    /// right now; later parameter changes don't reach this instance.
    pub fn trigger_clip(&mut self, clip: &Clip) -> Result<(), AudioError> {
        let sound = clip::decode(clip.data())?;
        let rate =
            self.params.pitch.value() as f32 * (sound.sample_rate as f32 / SAMPLE_RATE as f32);
        let gain = self.params.volume.value() as f32;
        let sound = Shared::new(&self.collector.handle(), sound);
        self.send(EngineCommand::Trigger {
            clip: clip.id,
            sound,
            rate,
            gain,
            looped: clip.looped,
        })
    }

    pub fn stop_clip(&mut self, id: ClipId) -> Result<(), AudioError> {
        self.send(EngineCommand::Stop(id))
    }

    pub fn is_playing(&self, id: ClipId) -> bool {
        id.0 < self.snapshot.playing.len() && self.snapshot.playing[id.0]
    }

    /// Latest snapshot published by the engine. Refreshed from `tick`.
    pub fn engine_state(&self) -> &EngineState {
        &self.snapshot
    }

    /// Housekeeping to run on every UI tick: pull the newest engine
    /// snapshot and reclaim buffers released by the audio thread.
    pub fn tick(&mut self) {
        self.snapshot = *self.engine_state.read();
        self.collector.collect();
    }

    fn send(&mut self, cmd: EngineCommand) -> Result<(), AudioError> {
        if self.producer.push(cmd).is_err() {
            return Err(AudioError::Stream(String::from(
                "engine command queue is full",
            )));
        }
        Ok(())
    }
}
