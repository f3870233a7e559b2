//! Terminal user interface for the chat view.

mod app;
mod input;
mod picker;
mod shimmer;
mod slash_commands;
mod theme;
mod widgets;

pub use app::App;
