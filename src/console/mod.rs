pub mod commands;
pub mod files;
pub mod render;
pub mod shell;
pub mod theme;

pub use commands::{CommandParser, ShellCommand};
pub use render::{ConsoleSink, TerminalProgress};
pub use theme::Theme;
