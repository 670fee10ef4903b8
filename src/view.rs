use std::sync::Arc;
use std::time::Duration;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::{App, Focus, GRID_COLS};
use crate::audio::amp_to_db;
use crate::clip::Clip;
use crate::params::{ParamIterExt, Params};

const BORDER_COLOR: Color = Color::DarkGray;
const PAD_HEIGHT: u16 = 5;
const TICK_RATE: f64 = 30.0;

pub fn render(app: &mut App, f: &mut Frame) {
    app.frames += 1;

    let screen = f.area();
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(1),
                Constraint::Length(3),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .horizontal_margin(1)
        .split(screen);

    let main = sections[0];
    let status = sections[1];
    let command = sections[2];

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
        .split(main);

    render_pads(app, f, main[0]);
    render_sidebar(app, f, main[1]);
    render_status_line(app, f, status);
    render_command_line(app, f, command);
}

fn render_pads(app: &App, f: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" pads ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_COLOR));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height == 0 {
        return;
    }
    if app.bank.is_empty() {
        let hint = Paragraph::new("press r to record your first clip")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint, centered_line(inner));
        return;
    }

    let num_rows = (app.bank.len() + GRID_COLS - 1) / GRID_COLS;
    let visible_rows = usize::min(num_rows, (inner.height / PAD_HEIGHT) as usize);
    let mut constraints = vec![Constraint::Length(PAD_HEIGHT); visible_rows];
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, clip) in app.bank.iter().enumerate() {
        let row = i / GRID_COLS;
        if row >= visible_rows {
            break;
        }
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); GRID_COLS].as_ref())
            .split(rows[row]);
        render_pad(app, f, cols[i % GRID_COLS], clip, i == app.cursor);
    }
}

fn render_pad(app: &App, f: &mut Frame, area: Rect, clip: &Clip, selected: bool) {
    let border_style = if selected {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(clip.color)
    };
    let block = Block::default()
        .title(format!(" {} ", clip.id))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let play_indicator = if app.control.is_playing(clip.id) {
        let style = Style::default().fg(Color::Blue);
        animate(
            app.frames,
            vec![Span::styled("▶", style), Span::raw(" ")],
            Duration::from_millis(500),
        )
    } else {
        Span::raw(" ")
    };
    let loop_marker = if clip.looped {
        Span::styled("~ loop", Style::default().fg(Color::Blue))
    } else {
        Span::raw("      ")
    };

    let lines = vec![
        Line::from(play_indicator).alignment(Alignment::Center),
        Line::from(loop_marker).alignment(Alignment::Center),
    ];
    f.render_widget(Paragraph::new(lines), inner);
}

fn render_sidebar(app: &App, f: &mut Frame, area: Rect) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let params: Arc<dyn Params> = app.control.params().clone();
    for (param, section) in params.iter().zip(sections.iter()) {
        let (min, max) = param.range();
        let ratio = ((param.value() - min) / (max - min)).clamp(0.0, 1.0);
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(format!(" {} ", param.label()))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(BORDER_COLOR)),
            )
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .ratio(ratio)
            .label(param.value_as_string());
        f.render_widget(gauge, *section);
    }

    let help = Paragraph::new(vec![
        Line::from(" r      record / finish"),
        Line::from(" i      initialize audio"),
        Line::from(" ⏎ 1-9  play pad"),
        Line::from(" o      toggle loop"),
        Line::from(" [ ]    pitch  - =  volume"),
        Line::from(" :quit  exit"),
    ])
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, sections[2]);
}

fn render_status_line(app: &App, f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP | Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER_COLOR));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let recording = if app.recorder.is_recording() {
        let style = Style::default().fg(Color::Red);
        Line::from(vec![
            Span::raw(" "),
            animate(
                app.frames,
                vec![Span::styled("● REC", style), Span::styled("  REC", style)],
                Duration::from_millis(500),
            ),
        ])
    } else {
        Line::from(Span::raw(" "))
    };
    f.render_widget(Paragraph::new(recording).alignment(Alignment::Left), inner);

    let state = app.control.engine_state();
    let level = amp_to_db(state.rms).channel(0).max(-60.0);
    let meter = format!("{:>6.1} dB", level);
    f.render_widget(Paragraph::new(meter).alignment(Alignment::Center), inner);

    let audio = if app.audio_ready() {
        if state.dropped > 0 {
            format!("audio on ({} dropped)  ", state.dropped)
        } else {
            String::from("audio on  ")
        }
    } else {
        String::from("audio off, press i  ")
    };
    f.render_widget(Paragraph::new(audio).alignment(Alignment::Right), inner);
}

fn render_command_line(app: &App, f: &mut Frame, area: Rect) {
    if app.focus == Focus::CommandLine {
        let spans = Line::from(vec![Span::raw(":"), Span::raw(app.command.as_str())]);
        f.render_widget(Paragraph::new(spans), area);
    } else if let Some(message) = &app.message {
        let style = Style::default().fg(Color::Yellow);
        f.render_widget(
            Paragraph::new(Span::styled(message.as_str(), style)),
            area,
        );
    }
}

fn animate<'a>(frames: usize, states: Vec<Span<'a>>, state_dur: Duration) -> Span<'a> {
    let elapsed = frames as f64 / TICK_RATE;
    let period = elapsed / state_dur.as_secs_f64();
    states[period.ceil() as usize % states.len()].clone()
}

fn centered_line(area: Rect) -> Rect {
    let y = area.y + area.height / 2;
    Rect::new(area.x, y, area.width, 1)
}
