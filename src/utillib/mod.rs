pub mod get_terminal_width;
pub mod logging;
