use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{Action, App, Focus, Move, ParamKey, ParamUpdate};
use crate::params::StepSize;

pub enum Input {
    Key(KeyEvent),
    Tick,
}

/// Fans terminal events and a 30 Hz tick into one queue so the main loop
/// has a single blocking receive.
pub struct InputQueue {
    events: Receiver<Input>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        {
            let sender = sender.clone();
            thread::spawn(move || loop {
                match event::read() {
                    Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                        if sender.send(Input::Key(key)).is_err() {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => return,
                }
            });
        }
        thread::spawn(move || loop {
            if sender.send(Input::Tick).is_err() {
                return;
            }
            thread::sleep(Duration::from_millis(33));
        });
        Self { events: receiver }
    }

    pub fn next(&mut self) -> Result<Input> {
        self.events
            .recv()
            .map_err(|err| anyhow!("input receive error: {}", err))
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

pub fn handle(key: KeyEvent, app: &mut App) -> Result<()> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return app.take(Action::Exit);
    }
    match app.focus {
        Focus::CommandLine => handle_command_input(key, app),
        Focus::Pads => handle_pad_input(key, app),
    }
}

fn handle_pad_input(key: KeyEvent, app: &mut App) -> Result<()> {
    // A fresh keypress clears the previous status message
    app.message = None;

    match key.code {
        KeyCode::Char(':') => app.focus = Focus::CommandLine,
        KeyCode::Char('r') => app.take(Action::ToggleRecord)?,
        KeyCode::Char('i') => app.take(Action::InitAudio)?,
        KeyCode::Char('o') => app.take(Action::ToggleLoop)?,
        KeyCode::Enter | KeyCode::Char(' ') => app.take(Action::Trigger(app.cursor))?,
        KeyCode::Char('h') | KeyCode::Left => app.take(Action::MoveCursor(Move::Left))?,
        KeyCode::Char('l') | KeyCode::Right => app.take(Action::MoveCursor(Move::Right))?,
        KeyCode::Char('k') | KeyCode::Up => app.take(Action::MoveCursor(Move::Up))?,
        KeyCode::Char('j') | KeyCode::Down => app.take(Action::MoveCursor(Move::Down))?,
        KeyCode::Char('[') => app.take(pitch(ParamUpdate::Dec(StepSize::Small)))?,
        KeyCode::Char(']') => app.take(pitch(ParamUpdate::Inc(StepSize::Small)))?,
        KeyCode::Char('{') => app.take(pitch(ParamUpdate::Dec(StepSize::Large)))?,
        KeyCode::Char('}') => app.take(pitch(ParamUpdate::Inc(StepSize::Large)))?,
        KeyCode::Char('-') => app.take(volume(ParamUpdate::Dec(StepSize::Small)))?,
        KeyCode::Char('=') => app.take(volume(ParamUpdate::Inc(StepSize::Small)))?,
        KeyCode::Char('_') => app.take(volume(ParamUpdate::Dec(StepSize::Large)))?,
        KeyCode::Char('+') => app.take(volume(ParamUpdate::Inc(StepSize::Large)))?,
        KeyCode::Char(digit) if digit.is_ascii_digit() && digit != '0' => {
            if let Some(num) = digit.to_digit(10) {
                app.take(Action::Trigger(num as usize - 1))?;
            }
        }
        _ => {}
    };
    Ok(())
}

fn handle_command_input(key: KeyEvent, app: &mut App) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let result = exec_command(app);
            app.focus = Focus::Pads;
            result?
        }
        KeyCode::Esc => {
            app.command.clear();
            app.focus = Focus::Pads;
        }
        KeyCode::Backspace => {
            app.command.pop();
        }
        KeyCode::Char(char) => app.command.push(char),
        _ => {}
    };
    Ok(())
}

fn exec_command(app: &mut App) -> Result<()> {
    let command = std::mem::take(&mut app.command);
    let parts: Vec<&str> = command.split_whitespace().collect();

    let action = match parts.as_slice() {
        [] => return Ok(()),
        ["quit" | "exit"] => Action::Exit,
        ["init"] => Action::InitAudio,
        ["pitch", value] => pitch(ParamUpdate::Set(value.to_string())),
        ["vol" | "volume", value] => volume(ParamUpdate::Set(value.to_string())),
        [unknown, ..] => return Err(anyhow!("invalid command {}", unknown)),
    };
    app.take(action)
}

fn pitch(update: ParamUpdate) -> Action {
    Action::UpdateParam(ParamKey::Pitch, update)
}

fn volume(update: ParamUpdate) -> Action {
    Action::UpdateParam(ParamKey::Volume, update)
}
