//! Slash command system for the chat view.

use super::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Commands available from the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    New,
    Mode,
    Key,
    Help,
    Quit,
}

impl ChatCommand {
    pub fn all() -> &'static [ChatCommand] {
        &[
            ChatCommand::New,
            ChatCommand::Mode,
            ChatCommand::Key,
            ChatCommand::Help,
            ChatCommand::Quit,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatCommand::New => "new",
            ChatCommand::Mode => "mode",
            ChatCommand::Key => "key",
            ChatCommand::Help => "help",
            ChatCommand::Quit => "quit",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChatCommand::New => "clear the conversation and start over",
            ChatCommand::Mode => "switch conversation mode (picker, or /mode <name>)",
            ChatCommand::Key => "save the API key (/key sk-...)",
            ChatCommand::Help => "show the available commands",
            ChatCommand::Quit => "exit",
        }
    }
}

/// Result of parsing an input line that starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// A known command plus its (possibly empty) argument string.
    Command(ChatCommand, String),
    /// Starts with `/` but matches nothing.
    Unknown(String),
    /// Not a slash command at all.
    NotACommand,
}

/// Parse an input line into a command.
pub fn parse_command(input: &str) -> ParsedCommand {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ParsedCommand::NotACommand;
    };

    let (name, args) = match rest.split_once(' ') {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    // `/exit` is accepted as an alias people type out of habit.
    if name.eq_ignore_ascii_case("exit") {
        return ParsedCommand::Command(ChatCommand::Quit, String::new());
    }

    match ChatCommand::all()
        .iter()
        .find(|c| c.name().eq_ignore_ascii_case(name))
    {
        Some(cmd) => ParsedCommand::Command(*cmd, args.to_string()),
        None => ParsedCommand::Unknown(name.to_string()),
    }
}

/// Autocomplete popup shown while typing a slash command.
#[derive(Debug, Clone, Default)]
pub struct SlashPopup {
    pub visible: bool,
    pub filtered: Vec<ChatCommand>,
    pub selected: usize,
}

impl SlashPopup {
    /// Update the popup for the current `/` prefix; hides on no match.
    pub fn update(&mut self, prefix: &str) {
        self.filtered = ChatCommand::all()
            .iter()
            .filter(|c| c.name().starts_with(&prefix.to_ascii_lowercase()))
            .copied()
            .collect();
        self.visible = !self.filtered.is_empty();
        if self.selected >= self.filtered.len() {
            self.selected = 0;
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.filtered.clear();
        self.selected = 0;
    }

    pub fn select_prev(&mut self) {
        if !self.filtered.is_empty() {
            if self.selected == 0 {
                self.selected = self.filtered.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    pub fn select_next(&mut self) {
        if !self.filtered.is_empty() {
            self.selected = (self.selected + 1) % self.filtered.len();
        }
    }

    pub fn selected_command(&self) -> Option<ChatCommand> {
        self.filtered.get(self.selected).copied()
    }

    /// Render just above the input box.
    pub fn render(&self, input_area: Rect, frame_area: Rect, buf: &mut Buffer) {
        if !self.visible || self.filtered.is_empty() {
            return;
        }

        let height = (self.filtered.len() as u16 + 2).min(9);
        if frame_area.height <= height + 2 || frame_area.width < 20 {
            return;
        }
        let width = frame_area.width.saturating_sub(4).min(60);
        let y = input_area.y.saturating_sub(height);
        let popup_area = Rect::new(input_area.x, y, width, height);

        Clear.render(popup_area, buf);

        let lines: Vec<Line> = self
            .filtered
            .iter()
            .enumerate()
            .map(|(i, cmd)| {
                let is_selected = i == self.selected;
                let prefix = if is_selected { "> " } else { "  " };
                let style = if is_selected {
                    Theme::accent()
                } else {
                    Theme::text()
                };
                Line::from(vec![
                    Span::styled(prefix, style),
                    Span::styled(format!("/{}", cmd.name()), style),
                    Span::styled(format!("  {}", cmd.description()), Theme::muted()),
                ])
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused());

        Paragraph::new(lines).block(block).render(popup_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(
            parse_command("/new"),
            ParsedCommand::Command(ChatCommand::New, String::new())
        );
        assert_eq!(
            parse_command("/mode برمجة"),
            ParsedCommand::Command(ChatCommand::Mode, "برمجة".to_string())
        );
        assert_eq!(
            parse_command("/key sk-abc"),
            ParsedCommand::Command(ChatCommand::Key, "sk-abc".to_string())
        );
    }

    #[test]
    fn test_parse_exit_alias() {
        assert_eq!(
            parse_command("/exit"),
            ParsedCommand::Command(ChatCommand::Quit, String::new())
        );
    }

    #[test]
    fn test_parse_unknown_and_plain_text() {
        assert_eq!(
            parse_command("/bogus"),
            ParsedCommand::Unknown("bogus".to_string())
        );
        assert_eq!(parse_command("مرحبا"), ParsedCommand::NotACommand);
    }

    #[test]
    fn test_popup_filtering() {
        let mut popup = SlashPopup::default();
        popup.update("");
        assert!(popup.visible);
        assert_eq!(popup.filtered.len(), ChatCommand::all().len());

        popup.update("m");
        assert_eq!(popup.filtered, vec![ChatCommand::Mode]);

        popup.update("zz");
        assert!(!popup.visible);
    }

    #[test]
    fn test_popup_selection_wraps() {
        let mut popup = SlashPopup::default();
        popup.update("");
        popup.select_prev();
        assert_eq!(popup.selected, ChatCommand::all().len() - 1);
        popup.select_next();
        assert_eq!(popup.selected, 0);
        assert_eq!(popup.selected_command(), Some(ChatCommand::New));
    }
}
