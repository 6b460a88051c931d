use crate::options::clean_text;
use crate::session::{Mode, SessionState};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;

const INPUT_MAX_LINES: u16 = 6;
const CURSOR: &str = "█";

/// Draws the whole screen. Everything shown is derived from `state`.
pub fn render(frame: &mut Frame<'_>, state: &SessionState) {
    let input_height = input_lines(state).min(INPUT_MAX_LINES) + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);
    match state.mode {
        Mode::Composing if state.exchange.is_none() => render_welcome(frame, chunks[1]),
        Mode::Running => render_running(frame, chunks[1], state),
        _ => render_results(frame, chunks[1], state),
    }
    render_input(frame, chunks[2], state);

    let status = Paragraph::new(Line::from(Span::styled(
        state.status.clone(),
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(status, chunks[3]);
}

fn input_lines(state: &SessionState) -> u16 {
    let count = state.input.split('\n').count();
    u16::try_from(count).unwrap_or(u16::MAX).max(1)
}

fn render_header(frame: &mut Frame<'_>, area: Rect, state: &SessionState) {
    let names = state
        .registry
        .runners()
        .iter()
        .map(|runner| Line::from(runner.backend.as_str()))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(names)
        .select(state.registry.active_index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .title("instassist")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(tabs, area);
}

fn render_welcome(frame: &mut Frame<'_>, area: Rect) {
    let body = Paragraph::new(vec![
        Line::raw("Describe what you need and press enter."),
        Line::styled(
            "Options come back ranked; pick one to copy it or run it.",
            Style::default().fg(Color::Gray),
        ),
    ])
    .block(Block::default().title("Options").borders(Borders::ALL))
    .wrap(Wrap { trim: false });
    frame.render_widget(body, area);
}

fn render_running(frame: &mut Frame<'_>, area: Rect, state: &SessionState) {
    let body = Paragraph::new(vec![
        Line::styled(
            format!("{} waiting for {}…", state.spinner(), state.backend_in_flight()),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::styled(
            format!("prompt> {}", clean_text(&state.last_prompt)),
            Style::default().fg(Color::Yellow),
        ),
    ])
    .block(Block::default().title("Options").borders(Borders::ALL))
    .wrap(Wrap { trim: false });
    frame.render_widget(body, area);
}

fn render_results(frame: &mut Frame<'_>, area: Rect, state: &SessionState) {
    let Some(exchange) = &state.exchange else {
        render_welcome(frame, area);
        return;
    };
    let title = format!("Options from {}", exchange.backend);

    if exchange.options.is_empty() {
        let mut lines = vec![Line::styled(
            format!("prompt> {}", clean_text(&exchange.prompt)),
            Style::default().fg(Color::Yellow),
        )];
        let problem = exchange
            .run_error
            .clone()
            .or_else(|| exchange.parse_error.as_ref().map(|err| err.to_string()));
        if let Some(problem) = problem {
            lines.push(Line::styled(problem, Style::default().fg(Color::Red)));
        }
        lines.push(Line::raw(""));
        lines.extend(exchange.raw_output.lines().map(|line| Line::raw(line.to_string())));
        let body = Paragraph::new(lines)
            .block(Block::default().title(title).borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        frame.render_widget(body, area);
        return;
    }

    let items = exchange
        .options
        .iter()
        .enumerate()
        .map(|(idx, option)| {
            let selected = idx == state.selected;
            let marker = if selected { "› " } else { "  " };
            let value_style = if selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let mut lines = vec![Line::from(vec![
                Span::raw(marker),
                Span::styled(clean_text(&option.value), value_style),
            ])];
            let description = clean_text(&option.description);
            if !description.is_empty() {
                lines.push(Line::styled(
                    format!("    {description}"),
                    Style::default().fg(Color::Gray),
                ));
            }
            ListItem::new(lines)
        })
        .collect::<Vec<_>>();

    let mut list_state = ListState::default().with_selected(Some(state.selected));
    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_input(frame: &mut Frame<'_>, area: Rect, state: &SessionState) {
    let composing = state.mode == Mode::Composing;
    let text = if composing {
        format!("{}{CURSOR}", state.input)
    } else {
        state.last_prompt.clone()
    };
    let lines = text
        .split('\n')
        .map(|line| Line::raw(line.to_string()))
        .collect::<Vec<_>>();
    let hidden = lines.len().saturating_sub(usize::from(INPUT_MAX_LINES));
    let border = if composing {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(lines)
        .scroll((u16::try_from(hidden).unwrap_or(0), 0))
        .block(
            Block::default()
                .title("Prompt")
                .borders(Borders::ALL)
                .border_style(border),
        );
    frame.render_widget(input, area);
}
