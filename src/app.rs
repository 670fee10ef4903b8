use anyhow::Result;
use clap::Parser;

use crate::capture::Recorder;
use crate::clip::{ClipBank, ClipId};
use crate::engine::Engine;
use crate::error::AudioError;
use crate::host::Host;
use crate::input::{self, Input, InputQueue};
use crate::params::StepSize;
use crate::state::AppControl;
use crate::view;

pub const GRID_COLS: usize = 3;

#[derive(Debug, Clone, Copy, Parser)]
#[command(version, about = "A terminal sketchpad for short microphone clips")]
pub struct Options {
    /// Let a clip overlap itself when re-triggered while still sounding
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub allow_overlap: bool,

    /// Stop a sounding clip on every loop toggle, not only when looping is
    /// switched off
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub stop_on_toggle: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow_overlap: true,
            stop_on_toggle: true,
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
pub enum Focus {
    Pads,
    CommandLine,
}

pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Clone, Copy)]
pub enum ParamKey {
    Pitch,
    Volume,
}

pub enum ParamUpdate {
    Inc(StepSize),
    Dec(StepSize),
    Set(String),
}

pub enum Action {
    Exit,
    ToggleRecord,
    InitAudio,
    Trigger(usize),
    ToggleLoop,
    MoveCursor(Move),
    UpdateParam(ParamKey, ParamUpdate),
}

pub struct App {
    pub control: AppControl,
    pub bank: ClipBank,
    pub recorder: Recorder,
    pub options: Options,

    pub cursor: usize,
    pub focus: Focus,
    pub command: String,
    pub message: Option<String>,
    pub frames: usize,

    // The engine waits here until the user initializes audio, then moves
    // into the output stream exactly once.
    engine: Option<Engine>,
    host: Option<Host>,
    should_stop: bool,
}

impl App {
    pub fn new(control: AppControl, engine: Engine, options: Options) -> Self {
        Self {
            control,
            bank: ClipBank::new(),
            recorder: Recorder::new(),
            options,
            cursor: 0,
            focus: Focus::Pads,
            command: String::with_capacity(64),
            message: None,
            frames: 0,
            engine: Some(engine),
            host: None,
            should_stop: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let mut input = InputQueue::new();
        let mut terminal = ratatui::init();

        let result = loop {
            if self.should_stop {
                break Ok(());
            }
            if let Err(err) = terminal.draw(|f| view::render(&mut self, f)) {
                break Err(err.into());
            }
            match input.next() {
                Ok(Input::Key(key)) => {
                    if let Err(err) = input::handle(key, &mut self) {
                        log::warn!("{err:#}");
                        self.message = Some(err.to_string());
                    }
                }
                Ok(Input::Tick) => {
                    self.recorder.poll();
                    self.control.tick();
                }
                Err(err) => break Err(err),
            }
        };

        ratatui::restore();
        if let Some(host) = self.host.take() {
            host.shutdown().ok();
        }
        result
    }

    pub fn take(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Exit => {
                self.should_stop = true;
            }
            Action::ToggleRecord => self.toggle_record()?,
            Action::InitAudio => self.init_audio(),
            Action::Trigger(index) => self.trigger(index)?,
            Action::ToggleLoop => self.toggle_loop()?,
            Action::MoveCursor(m) => self.move_cursor(m),
            Action::UpdateParam(key, update) => {
                let params = self.control.params().clone();
                let param = match key {
                    ParamKey::Pitch => &params.pitch,
                    ParamKey::Volume => &params.volume,
                };
                match update {
                    ParamUpdate::Inc(step) => param.incr(step),
                    ParamUpdate::Dec(step) => param.decr(step),
                    ParamUpdate::Set(value) => param.set(value.parse()?)?,
                }
            }
        }
        Ok(())
    }

    pub fn audio_ready(&self) -> bool {
        self.host.is_some()
    }

    fn toggle_record(&mut self) -> Result<()> {
        if self.recorder.is_recording() {
            if let Some(data) = self.recorder.stop()? {
                let clip = self.bank.append(data)?;
                self.cursor = clip.id.0;
                self.message = Some(format!("clip {} ready", clip.id));
            }
        } else {
            self.recorder.start()?;
            self.message = Some(String::from("recording, press r again to finish"));
        }
        Ok(())
    }

    fn init_audio(&mut self) {
        if self.host.is_some() {
            // Already running; nothing to leak or rebuild
            self.message = Some(String::from("audio already initialized"));
            return;
        }
        match self.engine.take() {
            Some(engine) => match Host::run(engine) {
                Ok(host) => {
                    self.host = Some(host);
                    self.message = Some(String::from("audio ready"));
                }
                Err(err) => {
                    log::warn!("audio init failed: {err}");
                    self.message = Some(format!("{err}, restart to retry"));
                }
            },
            None => self.message = Some(String::from("audio unavailable, restart to retry")),
        }
    }

    fn trigger(&mut self, index: usize) -> Result<()> {
        if !self.audio_ready() {
            return Err(AudioError::NotInitialized.into());
        }
        if let Some(clip) = self.bank.get(ClipId(index)) {
            self.control.trigger_clip(clip)?;
        }
        Ok(())
    }

    fn toggle_loop(&mut self) -> Result<()> {
        let id = ClipId(self.cursor);
        if let Some(now_looped) = self.bank.toggle_loop(id) {
            if self.options.stop_on_toggle || !now_looped {
                self.control.stop_clip(id)?;
            }
            self.message = Some(format!(
                "clip {} loop {}",
                id,
                if now_looped { "on" } else { "off" }
            ));
        }
        Ok(())
    }

    fn move_cursor(&mut self, m: Move) {
        let len = self.bank.len();
        if len == 0 {
            return;
        }
        let cursor = &mut self.cursor;
        match m {
            Move::Left if *cursor % GRID_COLS > 0 => *cursor -= 1,
            Move::Right if *cursor % GRID_COLS < GRID_COLS - 1 && *cursor + 1 < len => {
                *cursor += 1
            }
            Move::Up if *cursor >= GRID_COLS => *cursor -= GRID_COLS,
            Move::Down if *cursor + GRID_COLS < len => *cursor += GRID_COLS,
            _ => {}
        }
    }
}
