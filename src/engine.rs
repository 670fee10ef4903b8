use basedrop::Shared;
use ringbuf::Consumer;
use triple_buffer::Input;

use crate::audio::{Rms, Stereo};
use crate::clip::{ClipId, Sound};
use crate::filter::LowPass;
use crate::{MAX_CLIPS, SAMPLE_RATE};

pub const NUM_VOICES: usize = 16;

// Every trigger is routed through one shared low-pass; the cutoff is not
// user adjustable.
const FILTER_CUTOFF_HZ: f64 = 1000.0;

const RMS_WINDOW_SIZE: usize = SAMPLE_RATE as usize / 10 * 3;

/// Commands from the UI thread. Rate and gain are resolved by the sender at
/// trigger time; the engine never reads the parameter atomics itself.
pub enum EngineCommand {
    Trigger {
        clip: ClipId,
        sound: Shared<Sound>,
        rate: f32,
        gain: f32,
        looped: bool,
    },
    Stop(ClipId),
}

/// An effect in the master chain, processing mixed blocks in place.
pub trait Device {
    fn render(&mut self, buffer: &mut [Stereo]);
}

/// Snapshot published to the UI after every rendered block. Fixed-size on
/// purpose: publishing must not allocate.
#[derive(Clone, Copy)]
pub struct EngineState {
    pub playing: [bool; MAX_CLIPS],
    pub rms: Stereo,
    pub dropped: u32,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            playing: [false; MAX_CLIPS],
            rms: Stereo::ZERO,
            dropped: 0,
        }
    }
}

#[derive(PartialEq, Eq, Debug)]
enum VoiceState {
    Free,
    Busy(ClipId),
}

enum VoiceStatus {
    Continue,
    Finished,
}

/// One sounding realization of a clip. Gain, rate and loop flag are frozen
/// at trigger time; the voice plays with linear interpolation until it runs
/// off the end of its buffer (one-shot) or is stopped (loop).
struct Voice {
    state: VoiceState,
    sound: Option<Shared<Sound>>,
    position: f32,
    rate: f32,
    gain: f32,
    looped: bool,
    // Whether the live table points at this voice. An overlapped voice keeps
    // sounding untracked once a newer trigger takes its slot.
    tracked: bool,
}

impl Voice {
    fn idle() -> Self {
        Self {
            state: VoiceState::Free,
            sound: None,
            position: 0.0,
            rate: 1.0,
            gain: 1.0,
            looped: false,
            tracked: false,
        }
    }

    fn start(&mut self, clip: ClipId, sound: Shared<Sound>, rate: f32, gain: f32, looped: bool) {
        self.state = VoiceState::Busy(clip);
        self.sound = Some(sound);
        self.position = 0.0;
        self.rate = rate;
        self.gain = gain;
        self.looped = looped;
        self.tracked = true;
    }

    fn release(&mut self) {
        self.state = VoiceState::Free;
        self.sound = None;
        self.tracked = false;
    }

    fn render(&mut self, buffer: &mut [Stereo]) -> VoiceStatus {
        let sound = match &self.sound {
            Some(sound) => sound,
            None => return VoiceStatus::Finished,
        };
        let frames = &sound.frames;
        let len = frames.len() as f32;
        if frames.is_empty() || self.rate <= 0.0 {
            return VoiceStatus::Finished;
        }

        for dst_frame in buffer.iter_mut() {
            let pos = self.position as usize;
            let weight = self.position - pos as f32;

            let mut frame = frames[pos] * (1.0 - weight);
            if pos + 1 < frames.len() {
                frame += frames[pos + 1] * weight;
            }
            *dst_frame += frame * self.gain;

            self.position += self.rate;
            if self.position >= len {
                if self.looped {
                    self.position %= len;
                } else {
                    return VoiceStatus::Finished;
                }
            }
        }
        VoiceStatus::Continue
    }
}

pub struct Engine {
    state: EngineState,
    state_buf: Input<EngineState>,
    consumer: Consumer<EngineCommand>,
    voices: Vec<Voice>,
    // live[id] is the voice currently tracked for that clip, at most one
    live: [Option<usize>; MAX_CLIPS],
    chain: Vec<Box<dyn Device + Send>>,
    rms: Rms,
    allow_overlap: bool,
}

impl Engine {
    pub fn new(state_buf: Input<EngineState>, consumer: Consumer<EngineCommand>, allow_overlap: bool) -> Engine {
        let mut voices = Vec::with_capacity(NUM_VOICES);
        for _ in 0..voices.capacity() {
            voices.push(Voice::idle());
        }
        let chain: Vec<Box<dyn Device + Send>> =
            vec![Box::new(LowPass::new(FILTER_CUTOFF_HZ, SAMPLE_RATE))];
        Self {
            state: EngineState::default(),
            state_buf,
            consumer,
            voices,
            live: [None; MAX_CLIPS],
            chain,
            rms: Rms::new(RMS_WINDOW_SIZE),
            allow_overlap,
        }
    }

    /// Renders one block into `buffer` (expected zeroed). Called from the
    /// audio thread; must not allocate.
    pub fn render(&mut self, buffer: &mut [Stereo]) {
        self.run_commands();

        for voice in self.voices.iter_mut() {
            if let VoiceState::Busy(clip) = voice.state {
                if let VoiceStatus::Finished = voice.render(buffer) {
                    if voice.tracked {
                        self.live[clip.0] = None;
                    }
                    voice.release();
                }
            }
        }

        for device in &mut self.chain {
            device.render(buffer);
        }
        self.rms.add_frames(buffer);

        for (flag, slot) in self.state.playing.iter_mut().zip(self.live.iter()) {
            *flag = slot.is_some();
        }
        self.state.rms = self.rms.value();

        *self.state_buf.input_buffer() = self.state;
        self.state_buf.publish();
    }

    fn run_commands(&mut self) {
        while let Some(cmd) = self.consumer.pop() {
            match cmd {
                EngineCommand::Trigger {
                    clip,
                    sound,
                    rate,
                    gain,
                    looped,
                } => self.trigger(clip, sound, rate, gain, looped),
                EngineCommand::Stop(clip) => self.stop(clip),
            }
        }
    }

    fn trigger(&mut self, clip: ClipId, sound: Shared<Sound>, rate: f32, gain: f32, looped: bool) {
        if clip.0 >= MAX_CLIPS {
            return;
        }
        if let Some(prev) = self.live[clip.0] {
            if self.allow_overlap {
                // The newest trigger takes the slot; the old voice plays out
                self.voices[prev].tracked = false;
            } else {
                self.voices[prev].release();
            }
            self.live[clip.0] = None;
        }

        match self.voices.iter().position(|v| v.state == VoiceState::Free) {
            Some(idx) => {
                self.voices[idx].start(clip, sound, rate, gain, looped);
                self.live[clip.0] = Some(idx);
            }
            None => self.state.dropped = self.state.dropped.wrapping_add(1),
        }
    }

    fn stop(&mut self, clip: ClipId) {
        if clip.0 >= MAX_CLIPS {
            return;
        }
        if let Some(idx) = self.live[clip.0].take() {
            self.voices[idx].release();
        }
    }
}
