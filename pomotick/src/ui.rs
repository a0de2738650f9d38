use crate::app::{App, AppMode, SettingsField};
use pomotick_core::{format_clock, Phase, SoundNotifier};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph},
    Frame,
};

pub fn draw<N: SoundNotifier>(f: &mut Frame, app: &App<N>) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(f, chunks[0], app);
    draw_timer(f, chunks[1], app);
    draw_details(f, chunks[2], app);
    draw_status_bar(f, chunks[3], app);

    match app.mode {
        AppMode::EditingSettings => draw_settings_overlay(f, app),
        AppMode::EditingCount => {
            draw_input_overlay(f, "Completed pomodoros today", &app.input_buffer, app)
        }
        AppMode::ConfirmClearCount => draw_confirm_overlay(f, app),
        AppMode::Normal => {}
    }
}

fn phase_color<N: SoundNotifier>(app: &App<N>) -> Color {
    match app.engine.phase() {
        Phase::Work => app.theme.work,
        Phase::Break => app.theme.rest,
    }
}

fn draw_header<N: SoundNotifier>(f: &mut Frame, area: Rect, app: &App<N>) {
    let theme = &app.theme;
    let text = Line::from(vec![
        Span::raw("── "),
        Span::styled(
            "POMOTICK",
            Style::default().fg(theme.rest).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ──"),
    ]);
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(theme.black)),
        ),
        area,
    );
}

fn draw_timer<N: SoundNotifier>(f: &mut Frame, area: Rect, app: &App<N>) {
    let theme = &app.theme;
    let engine = &app.engine;
    let color = phase_color(app);
    let title = match engine.phase() {
        Phase::Work => format!(" Work #{} ", engine.current_cycle_index()),
        Phase::Break => format!(" Break #{} ", engine.current_cycle_index()),
    };
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(color)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if engine.is_running() {
            theme.green
        } else {
            theme.gray
        }));
    let inner_area = block.inner(area);
    f.render_widget(block, area);
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner_area);
    f.render_widget(
        Paragraph::new(format_clock(engine.remaining_seconds()))
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        v_chunks[0],
    );
    let state = if engine.is_running() { "running" } else { "paused" };
    f.render_widget(
        Paragraph::new(state)
            .style(Style::default().fg(theme.gray))
            .alignment(Alignment::Center),
        v_chunks[1],
    );
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(color).bg(theme.black))
            .percent((engine.progress() * 100.0).clamp(0.0, 100.0) as u16),
        v_chunks[2],
    );
}

fn draw_details<N: SoundNotifier>(f: &mut Frame, area: Rect, app: &App<N>) {
    let theme = &app.theme;
    let config = app.engine.config();
    let label = Style::default().fg(theme.gray);
    let value = Style::default().fg(theme.foreground);

    let sound = if !app.engine.sound_enabled() {
        Span::styled("off (playback failed)", Style::default().fg(theme.red))
    } else {
        Span::styled(
            format!(
                "{} · volume {}%",
                if config.sound.use_beep { "beep" } else { "sound file" },
                config.sound.volume
            ),
            value,
        )
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Today     ", label),
            Span::styled(
                format!("{} pomodoros", app.engine.completed_pomodoro_count()),
                value.add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Cycle     ", label),
            Span::styled(
                format!(
                    "work {}m · break {}m · {} reminders",
                    config.timer.work_minutes,
                    config.timer.break_minutes,
                    config.timer.reminder_count
                ),
                value,
            ),
        ]),
        Line::from(vec![Span::styled("Sound     ", label), sound]),
    ];
    if let Some(status) = &app.status {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(theme.yellow),
        )));
    }

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.black)),
        ),
        area,
    );
}

fn draw_status_bar<N: SoundNotifier>(f: &mut Frame, area: Rect, app: &App<N>) {
    let theme = &app.theme;
    let (mode_text, mode_color) = match app.mode {
        AppMode::Normal => ("NORMAL", theme.green),
        AppMode::EditingSettings => ("SETTINGS", theme.yellow),
        AppMode::EditingCount => ("COUNT", theme.magenta),
        AppMode::ConfirmClearCount => ("CONFIRM", theme.red),
    };
    let help = match app.mode {
        AppMode::Normal => {
            "space:start/pause │ r:reset │ s:settings │ b:beep/file │ +/-:volume │ e:count │ c:clear │ q:quit"
        }
        AppMode::EditingSettings => "tab/↓:next │ ↑:prev │ enter:save │ esc:cancel",
        AppMode::EditingCount => "enter:confirm │ esc:cancel",
        AppMode::ConfirmClearCount => "y:clear │ n/esc:keep",
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" {} ", mode_text),
                Style::default()
                    .bg(mode_color)
                    .fg(theme.background)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::raw(help),
        ]))
        .style(Style::default().bg(theme.black).fg(theme.gray)),
        area,
    );
}

fn draw_settings_overlay<N: SoundNotifier>(f: &mut Frame, app: &App<N>) {
    let theme = &app.theme;
    let area = centered_rect(50, 50, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(" Settings ")
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(theme.yellow))
        .style(Style::default().bg(theme.background));
    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = SettingsField::ALL
        .iter()
        .map(|&field| {
            let selected = field == app.form_field;
            let marker = if selected { "▸ " } else { "  " };
            let mut spans = vec![
                Span::styled(marker, Style::default().fg(theme.yellow)),
                Span::styled(format!("{:<16}", field.label()), Style::default().fg(theme.gray)),
                Span::styled(
                    app.form_value(field).to_string(),
                    Style::default().fg(theme.foreground),
                ),
            ];
            if selected {
                spans.push(Span::styled(
                    "█",
                    Style::default()
                        .fg(theme.foreground)
                        .add_modifier(Modifier::SLOW_BLINK),
                ));
            }
            Line::from(spans)
        })
        .collect();
    if let Some(status) = &app.status {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(theme.red),
        )));
    }
    f.render_widget(Paragraph::new(lines), inner_area);
}

fn draw_input_overlay<N: SoundNotifier>(f: &mut Frame, title: &str, input: &str, app: &App<N>) {
    let theme = &app.theme;
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.magenta))
        .border_type(BorderType::Double)
        .style(Style::default().bg(theme.background));
    let inner_area = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(theme.foreground)),
            Span::styled(input, Style::default().fg(theme.foreground)),
            Span::styled(
                "█",
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
        ])),
        inner_area,
    );
}

fn draw_confirm_overlay<N: SoundNotifier>(f: &mut Frame, app: &App<N>) {
    let theme = &app.theme;
    let area = centered_rect(40, 20, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(format!(
            "Clear today's count ({})? y/n",
            app.engine.completed_pomodoro_count()
        ))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(theme.red))
                .style(Style::default().bg(theme.background)),
        ),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
