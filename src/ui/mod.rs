//! Shared presentation pieces: colors and the screen layout.

mod layout;
mod theme;

pub use layout::Layout;
pub use theme::Theme;
