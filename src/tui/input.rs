//! Input handling for the TUI

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling an input event
#[derive(Debug, Clone)]
pub enum InputAction {
    /// No action needed
    None,
    /// Submit the current input
    Submit(String),
    /// Quit the application
    Quit,
    /// Scroll up in messages
    ScrollUp,
    /// Scroll down in messages
    ScrollDown,
    /// Previous history item / move up in a popup
    Up,
    /// Next history item / move down in a popup
    Down,
    /// Tab pressed (for autocomplete)
    Tab,
    /// Escape pressed (close popup)
    Escape,
    /// Buffer content changed
    Edited,
}

/// Input state manager
///
/// Note: `cursor` is a CHARACTER index, not a byte index, so editing
/// works on multi-byte text (Arabic in particular).
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current input buffer
    pub buffer: String,
    /// Cursor position in buffer (character index, not byte index!)
    pub cursor: usize,
    /// Submission history
    history: Vec<String>,
    /// Current history index (-1 means current input)
    history_index: isize,
    /// Saved current input when browsing history
    saved_input: String,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            history_index: -1,
            ..Self::default()
        }
    }

    /// Number of characters in the buffer
    fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    /// Convert character index to byte index
    fn char_to_byte_index(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.buffer.len())
    }

    fn insert_char(&mut self, c: char) {
        let byte_idx = self.char_to_byte_index(self.cursor);
        self.buffer.insert(byte_idx, c);
        self.cursor += 1;
    }

    fn remove_char_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_idx = self.char_to_byte_index(self.cursor);
            if let Some((_, ch)) = self.buffer.char_indices().nth(self.cursor) {
                self.buffer
                    .replace_range(byte_idx..byte_idx + ch.len_utf8(), "");
            }
        }
    }

    fn remove_char_at_cursor(&mut self) {
        if self.cursor < self.char_count() {
            let byte_idx = self.char_to_byte_index(self.cursor);
            if let Some((_, ch)) = self.buffer.char_indices().nth(self.cursor) {
                self.buffer
                    .replace_range(byte_idx..byte_idx + ch.len_utf8(), "");
            }
        }
    }

    /// Handle a key event and return the action
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            // Quit
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputAction::Quit
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                InputAction::Quit
            }

            // Submit
            KeyCode::Enter => {
                if !self.buffer.is_empty() {
                    let input = self.buffer.clone();
                    self.history.push(input.clone());
                    self.buffer.clear();
                    self.cursor = 0;
                    self.history_index = -1;
                    InputAction::Submit(input)
                } else {
                    InputAction::None
                }
            }

            // Editing
            KeyCode::Backspace => {
                self.remove_char_before_cursor();
                InputAction::Edited
            }
            KeyCode::Delete => {
                self.remove_char_at_cursor();
                InputAction::Edited
            }

            // Clear line
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer.clear();
                self.cursor = 0;
                InputAction::Edited
            }

            // Delete word
            KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.delete_word();
                InputAction::Edited
            }

            // Cursor movement
            KeyCode::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                }
                InputAction::None
            }
            KeyCode::Right => {
                if self.cursor < self.char_count() {
                    self.cursor += 1;
                }
                InputAction::None
            }
            KeyCode::Home | KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.cursor = 0;
                InputAction::None
            }
            KeyCode::End | KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.cursor = self.char_count();
                InputAction::None
            }

            // Up/Down: history when typing, scroll otherwise (app decides)
            KeyCode::Up => InputAction::Up,
            KeyCode::Down => InputAction::Down,

            // PageUp/PageDown for faster scrolling
            KeyCode::PageUp => InputAction::ScrollUp,
            KeyCode::PageDown => InputAction::ScrollDown,

            // Tab for autocomplete
            KeyCode::Tab => InputAction::Tab,

            // Escape to close popup or clear
            KeyCode::Esc => InputAction::Escape,

            // Regular input
            KeyCode::Char(c) => {
                self.insert_char(c);
                InputAction::Edited
            }

            _ => InputAction::None,
        }
    }

    /// Check if buffer starts with a slash (potential command)
    pub fn is_slash_command(&self) -> bool {
        self.buffer.starts_with('/')
    }

    /// The text after `/` up to the first space, for popup filtering
    pub fn slash_prefix(&self) -> Option<&str> {
        if self.buffer.starts_with('/') {
            let after_slash = &self.buffer[1..];
            let end = after_slash.find(' ').unwrap_or(after_slash.len());
            Some(&after_slash[..end])
        } else {
            None
        }
    }

    /// Replace buffer content (for autocomplete)
    pub fn set_buffer(&mut self, content: &str) {
        self.buffer = content.to_string();
        self.cursor = self.char_count();
    }

    fn delete_word(&mut self) {
        while self.cursor > 0 {
            let prev = self.buffer.chars().nth(self.cursor - 1);
            if prev != Some(' ') {
                break;
            }
            self.remove_char_before_cursor();
        }
        while self.cursor > 0 {
            let prev = self.buffer.chars().nth(self.cursor - 1);
            if prev == Some(' ') {
                break;
            }
            self.remove_char_before_cursor();
        }
    }

    /// Recall the previous submission into the buffer.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }

        if self.history_index == -1 {
            self.saved_input = self.buffer.clone();
        }

        if self.history_index < self.history.len() as isize - 1 {
            self.history_index += 1;
            let idx = self.history.len() - 1 - self.history_index as usize;
            self.buffer = self.history[idx].clone();
            self.cursor = self.char_count();
        }
    }

    /// Walk back toward the in-progress input.
    pub fn history_next(&mut self) {
        if self.history_index > 0 {
            self.history_index -= 1;
            let idx = self.history.len() - 1 - self.history_index as usize;
            self.buffer = self.history[idx].clone();
            self.cursor = self.char_count();
        } else if self.history_index == 0 {
            self.history_index = -1;
            self.buffer = self.saved_input.clone();
            self.cursor = self.char_count();
        }
    }

    /// Cursor position in terminal columns, accounting for wide chars.
    pub fn cursor_display_width(&self) -> usize {
        self.buffer
            .chars()
            .take(self.cursor)
            .map(|c| unicode_width::UnicodeWidthChar::width(c).unwrap_or(1))
            .sum()
    }
}
