//! Debugger application state and logic.

use crate::{Machine, Program};
use std::collections::HashSet;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub machine: Machine,
    /// Breakpoints (by instruction index).
    pub breakpoints: HashSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Output view scroll offset.
    pub output_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Program) -> Self {
        Self {
            machine: Machine::new(program),
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            output_scroll: 0,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.machine.is_running() {
            self.status = format!("Machine stopped: {:?}", self.machine.state);
            self.running = false;
            return;
        }

        match self.machine.step() {
            Ok(step) => {
                self.status = step.to_string();
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until end, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.machine.is_running() {
            self.running = false;
            self.status = format!("{:?} after {} steps", self.machine.state, self.machine.steps);
            return;
        }

        self.step();

        // Stop on arriving at a breakpoint, not on leaving one
        let pc = self.machine.pc();
        if self.running && self.machine.is_running() && self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at {:03}", pc);
        }
    }

    /// Toggle breakpoint at the current instruction.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.machine.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at {:03}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at {:03}", pc);
        }
    }

    /// Reset the machine to its initial state.
    pub fn reset(&mut self) {
        self.machine.reset();
        self.running = false;
        self.output_scroll = 0;
        self.status = "Reset. Ready.".into();
    }

    /// Apply a key press.
    pub fn handle_key(&mut self, code: crossterm::event::KeyCode) {
        use crossterm::event::KeyCode;

        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('s') => {
                self.running = false;
                self.step();
            }
            KeyCode::Char('r') => self.run(),
            KeyCode::Char('p') => {
                self.running = false;
                self.status = "Paused.".into();
            }
            KeyCode::Char('b') => self.toggle_breakpoint(),
            KeyCode::Char('x') => self.reset(),
            KeyCode::Up => {
                self.output_scroll = self.output_scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.output_scroll + 1 < self.machine.output().len() {
                    self.output_scroll += 1;
                }
            }
            _ => {}
        }
    }

    /// Source view around the current instruction: labels get their own
    /// rows with no index; the flag marks the current instruction.
    pub fn get_listing(&self, lines: usize) -> Vec<(Option<usize>, String, bool)> {
        let program = self.machine.program();
        let pc = self.machine.pc();

        let mut rows = Vec::new();
        let mut current_row = 0;
        for index in 0..=program.len() {
            for name in program.labels().names_at(index) {
                rows.push((None, format!("{}:", name), false));
            }
            if let Some(stmt) = program.get(index) {
                if index == pc {
                    current_row = rows.len();
                }
                let text = match &stmt.instruction {
                    Ok(instr) => instr.to_string(),
                    Err(_) => format!("{}  ; ???", stmt.text),
                };
                rows.push((Some(index), text, index == pc));
            }
        }

        let start = current_row.saturating_sub(lines / 2);
        rows.into_iter().skip(start).take(lines).collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Program) -> std::io::Result<()> {
    use crossterm::{
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = Terminal::new(CrosstermBackend::new(stdout()))
        .and_then(|mut terminal| event_loop(&mut terminal, DebuggerApp::new(program)));

    // Restore terminal whether or not the loop failed
    let restored = disable_raw_mode().and_then(|_| stdout().execute(LeaveAlternateScreen).map(|_| ()));

    result.and(restored)
}

fn event_loop<B: ratatui::backend::Backend>(
    terminal: &mut ratatui::Terminal<B>,
    mut app: DebuggerApp,
) -> std::io::Result<()> {
    use crossterm::event::{self, Event, KeyEventKind};
    use std::time::Duration;

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{load, MachineState, Register};

    fn app(source: &str) -> DebuggerApp {
        DebuggerApp::new(load(source).unwrap())
    }

    #[test]
    fn test_step_updates_status() {
        let mut app = app("mov a, 2\nend");
        app.step();
        assert_eq!(app.machine.register(Register::A), 2);
        assert!(app.status.contains("mov A, 2"));
    }

    #[test]
    fn test_run_stops_at_breakpoint() {
        let mut app = app("inc a\ninc a\ninc a\nend");
        app.breakpoints.insert(2);
        app.run();
        for _ in 0..10 {
            app.tick();
        }
        assert!(!app.running);
        assert_eq!(app.machine.pc(), 2);
        assert_eq!(app.machine.register(Register::A), 2);
    }

    #[test]
    fn test_run_to_end() {
        let mut app = app("inc a\nend");
        app.run();
        for _ in 0..5 {
            app.tick();
        }
        assert!(!app.running);
        assert_eq!(app.machine.state, MachineState::Ended(crate::EndKind::Explicit));
    }

    #[test]
    fn test_toggle_breakpoint() {
        let mut app = app("end");
        app.toggle_breakpoint();
        assert!(app.breakpoints.contains(&0));
        app.toggle_breakpoint();
        assert!(app.breakpoints.is_empty());
    }

    #[test]
    fn test_key_bindings() {
        use crossterm::event::KeyCode;

        let mut app = app("prnt a\ninc a\nprnt a\nend");
        app.handle_key(KeyCode::Char('s'));
        app.handle_key(KeyCode::Char('b'));
        assert!(app.breakpoints.contains(&1));

        app.handle_key(KeyCode::Char('r'));
        assert!(app.running);
        app.handle_key(KeyCode::Char('p'));
        assert!(!app.running);

        app.handle_key(KeyCode::Char('s'));
        app.handle_key(KeyCode::Char('s'));
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        assert_eq!(app.output_scroll, 1);
        app.handle_key(KeyCode::Up);
        assert_eq!(app.output_scroll, 0);

        app.handle_key(KeyCode::Char('x'));
        assert_eq!(app.machine.pc(), 0);
        assert!(!app.should_quit);
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_listing_marks_current() {
        let mut app = app("mov a, 1\nloop:\ninc a\njmp loop");
        app.step();
        let rows = app.get_listing(10);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], (None, "loop:".to_string(), false));
        assert_eq!(rows[2], (Some(1), "inc A".to_string(), true));
    }
}
