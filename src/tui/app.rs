//! Main TUI application

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::Line,
    widgets::Paragraph,
    Terminal,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::credentials::looks_like_api_key;
use crate::session::{ConversationMode, Session, SessionManager, SessionOutcome, SubmitError};

use super::input::{InputAction, InputState};
use super::picker::{Picker, PickerItem};
use super::slash_commands::{parse_command, ChatCommand, ParsedCommand, SlashPopup};
use super::widgets::{render_message_lines, HeaderBar, HelpBar, InputBox, StatusBar};

/// What the picker is currently selecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickerMode {
    None,
    Mode,
}

/// Application state
pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    input: InputState,
    session: Session,
    manager: SessionManager,
    outcome_tx: mpsc::Sender<(u64, SessionOutcome)>,
    outcome_rx: mpsc::Receiver<(u64, SessionOutcome)>,
    /// Bumped on `/new`; outcomes stamped with an older generation are
    /// dropped so a stale reply cannot land in a fresh transcript.
    generation: u64,
    scroll_offset: usize,
    spinner_frame: usize,
    should_quit: bool,
    slash_popup: SlashPopup,
    picker: Picker,
    picker_mode: PickerMode,
    notice: Option<String>,
}

impl App {
    pub fn new(manager: SessionManager, mode: ConversationMode) -> crate::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let (outcome_tx, outcome_rx) = mpsc::channel(32);

        Ok(Self {
            terminal,
            input: InputState::new(),
            session: Session::with_mode(mode),
            manager,
            outcome_tx,
            outcome_rx,
            generation: 0,
            scroll_offset: 0,
            spinner_frame: 0,
            should_quit: false,
            slash_popup: SlashPopup::default(),
            picker: Picker::default(),
            picker_mode: PickerMode::None,
            notice: None,
        })
    }

    /// Run the UI until quit.
    pub async fn run(&mut self) -> crate::Result<()> {
        loop {
            self.drain_outcomes();
            self.draw()?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Release {
                        self.handle_key(key);
                    }
                }
            } else {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
            }

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    /// Apply finished submissions, dropping stale generations.
    fn drain_outcomes(&mut self) {
        while let Ok((generation, outcome)) = self.outcome_rx.try_recv() {
            if generation == self.generation {
                self.session.apply_result(outcome);
                self.scroll_offset = 0;
            } else {
                debug!("dropping outcome from cleared conversation");
            }
        }
    }

    // ─── Input handling ─────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) {
        if self.picker.visible {
            match key.code {
                KeyCode::Up => self.picker.select_prev(),
                KeyCode::Down => self.picker.select_next(),
                KeyCode::Enter => self.confirm_picker(),
                KeyCode::Esc => {
                    self.picker.close();
                    self.picker_mode = PickerMode::None;
                }
                _ => {}
            }
            return;
        }

        match self.input.handle_key(key) {
            InputAction::Quit => self.should_quit = true,
            InputAction::Submit(text) => {
                self.slash_popup.hide();
                self.submit_line(text);
            }
            InputAction::Tab => {
                if let Some(cmd) = self
                    .slash_popup
                    .visible
                    .then(|| self.slash_popup.selected_command())
                    .flatten()
                {
                    self.input.set_buffer(&format!("/{} ", cmd.name()));
                    self.slash_popup.hide();
                }
            }
            InputAction::Up => {
                if self.slash_popup.visible {
                    self.slash_popup.select_prev();
                } else if !self.input.buffer.is_empty() {
                    self.input.history_prev();
                } else {
                    self.scroll_offset = self.scroll_offset.saturating_add(1);
                }
            }
            InputAction::Down => {
                if self.slash_popup.visible {
                    self.slash_popup.select_next();
                } else if !self.input.buffer.is_empty() {
                    self.input.history_next();
                } else {
                    self.scroll_offset = self.scroll_offset.saturating_sub(1);
                }
            }
            InputAction::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(5);
            }
            InputAction::ScrollDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(5);
            }
            InputAction::Escape => {
                if self.slash_popup.visible {
                    self.slash_popup.hide();
                } else {
                    self.input.set_buffer("");
                }
            }
            InputAction::Edited => self.refresh_slash_popup(),
            InputAction::None => {}
        }
    }

    fn refresh_slash_popup(&mut self) {
        if !self.input.is_slash_command() || self.input.buffer.contains(' ') {
            self.slash_popup.hide();
            return;
        }
        if let Some(prefix) = self.input.slash_prefix().map(|p| p.to_string()) {
            self.slash_popup.update(&prefix);
        }
    }

    fn confirm_picker(&mut self) {
        if self.picker_mode == PickerMode::Mode {
            if let Some(item) = self.picker.selected_item() {
                if let Ok(mode) = item.id.parse::<ConversationMode>() {
                    self.session.set_mode(mode);
                    self.notice = Some(format!("وضع المحادثة: {}", mode.label()));
                }
            }
        }
        self.picker.close();
        self.picker_mode = PickerMode::None;
    }

    // ─── Commands and submission ────────────────────────────────

    fn submit_line(&mut self, text: String) {
        match parse_command(&text) {
            ParsedCommand::Command(cmd, args) => self.run_command(cmd, &args),
            ParsedCommand::Unknown(name) => {
                self.notice = Some(format!("أمر غير معروف: /{name}"));
            }
            ParsedCommand::NotACommand => self.send_chat(&text),
        }
    }

    fn run_command(&mut self, cmd: ChatCommand, args: &str) {
        match cmd {
            ChatCommand::New => {
                self.generation += 1;
                self.session.clear();
                self.scroll_offset = 0;
                self.notice = Some("تم بدء محادثة جديدة".to_string());
            }
            ChatCommand::Mode => {
                if args.is_empty() {
                    self.open_mode_picker();
                } else {
                    match args.parse::<ConversationMode>() {
                        Ok(mode) => {
                            self.session.set_mode(mode);
                            self.notice = Some(format!("وضع المحادثة: {}", mode.label()));
                        }
                        Err(_) => {
                            self.notice = Some(format!("وضع غير معروف: {args}"));
                        }
                    }
                }
            }
            ChatCommand::Key => {
                if !looks_like_api_key(args) {
                    self.notice =
                        Some("يرجى إدخال مفتاح OpenAI API صحيح يبدأ بـ sk-".to_string());
                } else {
                    match self.manager.credentials().set(args) {
                        Ok(()) => self.notice = Some("تم الحفظ بنجاح!".to_string()),
                        Err(e) => self.notice = Some(format!("تعذر حفظ المفتاح: {e}")),
                    }
                }
            }
            ChatCommand::Help => {
                let names: Vec<String> = ChatCommand::all()
                    .iter()
                    .map(|c| format!("/{}", c.name()))
                    .collect();
                self.notice = Some(format!("الأوامر: {}", names.join("  ")));
            }
            ChatCommand::Quit => self.should_quit = true,
        }
    }

    fn send_chat(&mut self, text: &str) {
        match self.session.submit(text) {
            Ok(request) => {
                self.notice = None;
                self.scroll_offset = 0;

                let manager = self.manager.clone();
                let tx = self.outcome_tx.clone();
                let generation = self.generation;
                tokio::spawn(async move {
                    let outcome = manager.dispatch(request).await;
                    let _ = tx.send((generation, outcome)).await;
                });
            }
            Err(SubmitError::EmptyInput) => {}
            Err(SubmitError::RequestInFlight) => {
                self.notice = Some("انتظر اكتمال الرد الحالي أولاً".to_string());
            }
        }
    }

    // ─── Rendering ──────────────────────────────────────────────

    fn draw(&mut self) -> crate::Result<()> {
        let size = self.terminal.size()?;
        let width = size.width as usize;
        let messages_height = size.height.saturating_sub(6) as usize;

        let mut lines: Vec<Line<'static>> = Vec::new();
        for msg in self.session.transcript().messages() {
            lines.extend(render_message_lines(msg, width.saturating_sub(2)));
        }

        let max_scroll = lines.len().saturating_sub(messages_height);
        self.scroll_offset = self.scroll_offset.min(max_scroll);
        let scroll_y = (max_scroll - self.scroll_offset) as u16;

        let mode_label = self.session.mode().label();
        let is_processing = self.session.is_awaiting_reply();
        let spinner_frame = self.spinner_frame;
        let notice = self.notice.clone();
        let input_buffer = self.input.buffer.clone();
        let cursor_col = self.input.cursor_display_width() as u16;
        let slash_popup = self.slash_popup.clone();
        let picker = self.picker.clone();

        self.terminal.draw(move |frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Min(3),
                    Constraint::Length(1),
                    Constraint::Length(3),
                    Constraint::Length(1),
                ])
                .split(frame.area());

            frame.render_widget(
                HeaderBar {
                    title: "رفيق",
                    mode_label,
                    is_processing,
                },
                chunks[0],
            );

            frame.render_widget(Paragraph::new(lines).scroll((scroll_y, 0)), chunks[1]);

            frame.render_widget(
                StatusBar {
                    is_processing,
                    spinner_frame,
                    notice: notice.as_deref(),
                },
                chunks[2],
            );

            frame.render_widget(
                InputBox {
                    content: &input_buffer,
                    focused: !picker.visible,
                },
                chunks[3],
            );

            frame.render_widget(HelpBar, chunks[4]);

            slash_popup.render(chunks[3], frame.area(), frame.buffer_mut());
            picker.render(frame.area(), frame.buffer_mut());

            if !picker.visible {
                frame.set_cursor_position((chunks[3].x + 1 + cursor_col, chunks[3].y + 1));
            }
        })?;

        Ok(())
    }

    fn open_mode_picker(&mut self) {
        let current = self.session.mode();
        let items: Vec<PickerItem> = ConversationMode::all()
            .iter()
            .map(|mode| PickerItem {
                id: mode.name().to_string(),
                title: mode.label().to_string(),
                subtitle: mode.name().to_string(),
            })
            .collect();
        let selected = ConversationMode::all()
            .iter()
            .position(|m| *m == current)
            .unwrap_or(0);
        self.picker.open("وضع المحادثة", items, selected);
        self.picker_mode = PickerMode::Mode;
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Best-effort terminal restore; errors here have nowhere to go.
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}
