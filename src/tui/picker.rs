//! Generic picker widget for selecting from a list

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use super::widgets::truncate_to_width_str;

/// A selectable item in the picker
#[derive(Debug, Clone)]
pub struct PickerItem {
    pub id: String,
    pub title: String,
    pub subtitle: String,
}

/// Generic picker state
#[derive(Debug, Clone, Default)]
pub struct Picker {
    /// Whether the picker is visible
    pub visible: bool,
    /// Title of the picker
    pub title: String,
    /// Available items
    pub items: Vec<PickerItem>,
    /// Currently selected index
    pub selected: usize,
    /// Scroll offset for long lists
    pub scroll_offset: usize,
}

impl Picker {
    /// Open the picker with a title and items, preselecting `selected`.
    pub fn open(&mut self, title: &str, items: Vec<PickerItem>, selected: usize) {
        self.visible = true;
        self.title = title.to_string();
        self.selected = selected.min(items.len().saturating_sub(1));
        self.items = items;
        self.scroll_offset = 0;
        self.ensure_visible();
    }

    /// Close the picker
    pub fn close(&mut self) {
        self.visible = false;
        self.items.clear();
        self.selected = 0;
    }

    /// Move selection up
    pub fn select_prev(&mut self) {
        if !self.items.is_empty() {
            if self.selected == 0 {
                self.selected = self.items.len() - 1;
            } else {
                self.selected -= 1;
            }
            self.ensure_visible();
        }
    }

    /// Move selection down
    pub fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
            self.ensure_visible();
        }
    }

    fn ensure_visible(&mut self) {
        const VISIBLE_ITEMS: usize = 8;
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + VISIBLE_ITEMS {
            self.scroll_offset = self.selected - VISIBLE_ITEMS + 1;
        }
    }

    /// Get the selected item
    pub fn selected_item(&self) -> Option<&PickerItem> {
        self.items.get(self.selected)
    }

    /// Render the picker centered over the given area
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        if !self.visible || area.width < 20 || area.height < 7 {
            return;
        }

        let width = (area.width * 3 / 4).clamp(40, 80).min(area.width);
        let height = 14.min(area.height.saturating_sub(4)).max(3);
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;

        let picker_area = Rect::new(x, y, width, height);

        Clear.render(picker_area, buf);

        let inner_height = height.saturating_sub(2) as usize;
        let inner_width = width.saturating_sub(2) as usize;

        let lines: Vec<Line> = if self.items.is_empty() {
            vec![Line::styled("No items.", Theme::muted())]
        } else {
            self.items
                .iter()
                .enumerate()
                .skip(self.scroll_offset)
                .take(inner_height)
                .map(|(i, item)| {
                    let is_selected = i == self.selected;
                    let prefix = if is_selected { "> " } else { "  " };
                    let style = if is_selected {
                        Theme::accent()
                    } else {
                        Theme::text()
                    };

                    let prefix_w = prefix.width();
                    let title_w = item.title.width();
                    let avail_for_subtitle =
                        inner_width.saturating_sub(prefix_w + title_w + 3);
                    let subtitle = truncate_to_width_str(&item.subtitle, avail_for_subtitle);

                    let mut spans = vec![
                        Span::styled(prefix, style),
                        Span::styled(item.title.clone(), style.bold()),
                    ];
                    if !subtitle.is_empty() {
                        spans.push(Span::styled(format!(" — {subtitle}"), Theme::muted()));
                    }
                    Line::from(spans)
                })
                .collect()
        };

        let title = format!(" {} ", self.title);
        let help = " Up/Down Enter Esc ";

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::accent())
            .title_top(Line::styled(title, Theme::title()))
            .title_bottom(Line::styled(help, Theme::muted()));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        paragraph.render(picker_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<PickerItem> {
        (0..n)
            .map(|i| PickerItem {
                id: format!("id-{i}"),
                title: format!("item {i}"),
                subtitle: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_selection_wraps() {
        let mut picker = Picker::default();
        picker.open("اختر", items(3), 0);

        picker.select_prev();
        assert_eq!(picker.selected, 2);
        picker.select_next();
        assert_eq!(picker.selected, 0);
    }

    #[test]
    fn test_open_preselects() {
        let mut picker = Picker::default();
        picker.open("اختر", items(5), 3);
        assert_eq!(picker.selected_item().unwrap().id, "id-3");

        // Out-of-range preselect clamps to the last item.
        picker.open("اختر", items(2), 9);
        assert_eq!(picker.selected, 1);
    }

    #[test]
    fn test_close_clears() {
        let mut picker = Picker::default();
        picker.open("اختر", items(2), 0);
        picker.close();
        assert!(!picker.visible);
        assert!(picker.selected_item().is_none());
    }
}
