//! Custom widgets for the TUI

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::session::{Message, Sender};

use super::shimmer::{shimmer_spans, AnimatedDots};
use super::theme::Theme;

/// Parse simple Markdown formatting and return styled spans
/// Supports: **bold**, *italic*, `code`, ***bold italic***
fn parse_markdown(text: &str, base_style: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut remaining = text.to_string();

    let bold_italic = Regex::new(r"\*\*\*(.+?)\*\*\*").unwrap();
    let bold = Regex::new(r"\*\*(.+?)\*\*").unwrap();
    let italic = Regex::new(r"\*([^*]+?)\*").unwrap();
    let code = Regex::new(r"`([^`]+?)`").unwrap();

    // Process patterns in order of priority
    let patterns: Vec<(&Regex, Style)> = vec![
        (
            &bold_italic,
            base_style.add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ),
        (&bold, base_style.add_modifier(Modifier::BOLD)),
        (&code, Style::default().fg(Color::Yellow)),
        (&italic, base_style.add_modifier(Modifier::ITALIC)),
    ];

    fn find_first_match(
        text: &str,
        patterns: &[(&Regex, Style)],
    ) -> Option<(usize, usize, String, Style)> {
        let mut best: Option<(usize, usize, String, Style)> = None;
        for (regex, style) in patterns {
            if let Some(m) = regex.find(text) {
                if best.is_none() || m.start() < best.as_ref().map(|b| b.0).unwrap_or(usize::MAX) {
                    if let Some(caps) = regex.captures(text) {
                        let inner = caps
                            .get(1)
                            .map(|c| c.as_str().to_string())
                            .unwrap_or_default();
                        best = Some((m.start(), m.end(), inner, *style));
                    }
                }
            }
        }
        best
    }

    while !remaining.is_empty() {
        if let Some((start, end, inner, style)) = find_first_match(&remaining, &patterns) {
            if start > 0 {
                spans.push(Span::styled(remaining[..start].to_string(), base_style));
            }
            spans.push(Span::styled(inner, style));
            remaining = remaining[end..].to_string();
        } else {
            spans.push(Span::styled(remaining.clone(), base_style));
            break;
        }
    }

    if spans.is_empty() {
        spans.push(Span::styled(text.to_string(), base_style));
    }

    spans
}

/// Wrap a long string into multiple lines, respecting unicode width
fn wrap_text(text: &str, max_width: usize, indent: &str) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let indent_width = indent.width();
    let content_width = max_width.saturating_sub(indent_width);

    if content_width == 0 || text.width() <= content_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for c in text.chars() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(1);

        if current_width + char_width > content_width && !current_line.is_empty() {
            lines.push(current_line);
            current_line = String::new();
            current_width = 0;
        }

        current_line.push(c);
        current_width += char_width;
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}

/// Truncate a string to at most `max_width` display columns.
pub fn truncate_to_width_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut width = 0;
    for c in s.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(1);
        if width + cw + 1 > max_width {
            break;
        }
        result.push(c);
        width += cw;
    }
    result.push('…');
    result
}

/// Header bar with title and active mode
pub struct HeaderBar<'a> {
    pub title: &'a str,
    pub mode_label: &'a str,
    pub is_processing: bool,
}

impl Widget for HeaderBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        // Title with shimmer effect while a reply is pending
        let title_spans = if self.is_processing {
            let mut spans = vec![Span::styled("◆ ", Theme::accent())];
            spans.extend(shimmer_spans(self.title));
            spans
        } else {
            vec![
                Span::styled("◆ ", Theme::accent()),
                Span::styled(self.title.to_string(), Theme::title()),
            ]
        };

        let title_line = Line::from(title_spans);
        buf.set_line(area.x + 1, area.y, &title_line, area.width.saturating_sub(2));

        // Active mode on the right
        let mode_str = format!("{} ", self.mode_label);
        let mode_len = mode_str.width() as u16;
        let mode_x = area.x + area.width.saturating_sub(mode_len + 1);
        let mode_span = Span::styled(mode_str, Theme::muted());
        buf.set_span(mode_x, area.y, &mode_span, mode_len + 1);
    }
}

/// Status bar: spinner while waiting, last notice otherwise
pub struct StatusBar<'a> {
    pub is_processing: bool,
    pub spinner_frame: usize,
    pub notice: Option<&'a str>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = if self.is_processing {
            let spinner = AnimatedDots::new(self.spinner_frame);
            Line::from(vec![
                Span::styled(format!("{} ", spinner.current()), Theme::accent()),
                Span::styled("يفكر...", Theme::accent()),
            ])
        } else if let Some(notice) = self.notice {
            Line::from(vec![
                Span::styled("● ", Theme::warning()),
                Span::styled(notice.to_string(), Theme::dim()),
            ])
        } else {
            Line::from(vec![
                Span::styled("● ", Theme::success()),
                Span::styled("جاهز", Theme::dim()),
            ])
        };

        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));
    }
}

/// Input box widget
pub struct InputBox<'a> {
    pub content: &'a str,
    pub focused: bool,
}

impl Widget for InputBox<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Theme::border_focused()
        } else {
            Theme::border()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(" رسالتك ", Theme::muted()));

        let inner = block.inner(area);
        block.render(area, buf);

        let display_text = if self.content.is_empty() {
            "اكتب رسالتك... (Enter للإرسال، / للأوامر)"
        } else {
            self.content
        };

        let style = if self.content.is_empty() {
            Theme::muted()
        } else {
            Theme::text()
        };

        let text = Paragraph::new(display_text)
            .style(style)
            .wrap(Wrap { trim: false });
        text.render(inner, buf);
    }
}

/// Help bar showing key bindings
pub struct HelpBar;

impl Widget for HelpBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bindings = [
            ("/", "commands"),
            ("Tab", "complete"),
            ("↑↓", "history/scroll"),
            ("Enter", "send"),
            ("Ctrl+C", "quit"),
        ];

        let mut spans = vec![Span::raw(" ")];
        for (i, (key, desc)) in bindings.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", Theme::muted()));
            }
            spans.push(Span::styled(*key, Theme::key()));
            spans.push(Span::styled(format!(" {}", desc), Theme::key_desc()));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

/// Render one transcript message to display lines.
/// max_width: terminal width for text wrapping (0 = no wrapping)
pub fn render_message_lines(msg: &Message, max_width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let content_width = max_width.saturating_sub(4);

    let (badge_text, badge_style) = match msg.sender {
        Sender::User => (" أنت ", Theme::user_badge()),
        Sender::Assistant => (" رفيق ", Theme::assistant_badge()),
    };

    let timestamp = msg
        .created_at
        .with_timezone(&chrono::Local)
        .format("%H:%M")
        .to_string();

    lines.push(Line::from(vec![
        Span::styled(badge_text, badge_style),
        Span::styled(format!(" {timestamp}"), Theme::muted()),
    ]));

    // Markdown styling only for assistant output; user text stays raw
    let use_markdown = msg.sender == Sender::Assistant;
    let content_style = Theme::text();

    for content_line in msg.text.lines() {
        let wrapped = wrap_text(content_line, content_width, "  ");
        for (i, wrapped_line) in wrapped.into_iter().enumerate() {
            let indent = if i == 0 { "  " } else { "    " };
            if use_markdown {
                let mut spans = vec![Span::raw(indent.to_string())];
                spans.extend(parse_markdown(&wrapped_line, content_style));
                lines.push(Line::from(spans));
            } else {
                lines.push(Line::from(vec![
                    Span::raw(indent.to_string()),
                    Span::styled(wrapped_line, content_style),
                ]));
            }
        }
    }

    // Empty line for spacing
    lines.push(Line::from(""));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(sender: Sender, text: &str) -> Message {
        Message {
            sender,
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let wrapped = wrap_text("aaaa bbbb cccc", 6, "  ");
        assert!(wrapped.len() > 1);
        for line in &wrapped {
            assert!(line.width() <= 6);
        }
    }

    #[test]
    fn test_wrap_short_text_untouched() {
        assert_eq!(wrap_text("قصير", 40, "  "), vec!["قصير".to_string()]);
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width_str("abc", 10), "abc");
        let truncated = truncate_to_width_str("abcdefghij", 5);
        assert!(truncated.ends_with('…'));
        assert!(truncated.width() <= 5);
    }

    #[test]
    fn test_render_message_has_badge_and_spacing() {
        let lines = render_message_lines(&message(Sender::User, "مرحبا"), 80);
        // badge line + content line + trailing spacer
        assert_eq!(lines.len(), 3);

        let lines = render_message_lines(&message(Sender::Assistant, "سطر\nسطر آخر"), 80);
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_markdown_bold_split() {
        let spans = parse_markdown("قبل **غامق** بعد", Style::default());
        assert!(spans.len() >= 3);
        assert!(spans
            .iter()
            .any(|s| s.style.add_modifier.contains(Modifier::BOLD)));
    }
}
