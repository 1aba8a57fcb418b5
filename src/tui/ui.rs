//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::{Comparator, Register};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: source and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_source(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: call stack, output and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Min(6),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_call_stack(frame, right_chunks[0], app);
    draw_output(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw the source listing with the current instruction highlighted.
fn draw_source(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let rows = app.get_listing((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = rows
        .iter()
        .map(|(index, text, is_current)| {
            let Some(index) = index else {
                return ListItem::new(format!("       {}", text))
                    .style(Style::default().fg(Color::Cyan));
            };

            let prefix = if *is_current { "▶ " } else { "  " };
            let is_bp = app.breakpoints.contains(index);
            let bp = if is_bp { "●" } else { " " };

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if is_bp {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}{:03}:   {}", bp, prefix, index, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Source ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw registers, comparator and machine state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let machine = &app.machine;

    let mut regs = Vec::new();
    for reg in Register::ALL {
        regs.push(Span::raw(format!("{}: ", reg)));
        regs.push(Span::styled(
            format!("{:<10}", machine.register(reg)),
            Style::default().fg(Color::White),
        ));
    }

    let content = vec![
        Line::from(regs),
        Line::from(vec![
            Span::raw("COMP: "),
            Span::styled(format!("{:<8}", machine.comparator), comparator_style(machine.comparator)),
            Span::raw("   PC: "),
            Span::styled(format!("{:03}", machine.pc()), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::raw("Steps: "),
            Span::styled(format!("{}", machine.steps), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", machine.state),
                if machine.is_running() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the pending return points, innermost first.
fn draw_call_stack(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let items: Vec<ListItem> = app.machine.stack.frames()
        .iter()
        .rev()
        .map(|f| ListItem::new(format!("→ {:03}  (call at line {})", f.return_to, f.call_line)))
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" Call Stack ({}) ", app.machine.stack.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw values printed so far.
fn draw_output(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let output = app.machine.output();
    let start = app.output_scroll.min(output.len());
    let end = (start + visible_rows).min(output.len());

    let items: Vec<ListItem> = output[start..end]
        .iter()
        .map(|value| ListItem::new(format!("> {}", value)))
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Output ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Scroll output  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

fn comparator_style(cmp: Comparator) -> Style {
    match cmp {
        Comparator::Unset => Style::default().fg(Color::DarkGray),
        Comparator::Equal => Style::default().fg(Color::Green),
        Comparator::Greater => Style::default().fg(Color::Yellow),
        Comparator::Less => Style::default().fg(Color::Red),
    }
}
