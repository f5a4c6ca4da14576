// Terminal front end for fplwatch: the TUI and the command task behind it.

pub mod commands;
pub mod tui;
