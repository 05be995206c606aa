//! HTML templates and styling for the papers page.
//!
//! ## Module Structure
//!
//! - `styles` - CSS constants and theme definitions
//! - `components` - Shared HTML components (header, theme toggle, base template)
//! - `papers` - The listing with its filter and selection controls
//! - `notes_editor` - The per-paper notes editor

mod styles;
mod components;
mod papers;
mod notes_editor;

pub use styles::STYLE;
pub use components::{base_html, header_bar, theme_toggle};
pub use papers::{render_papers_page, render_share_page};
pub use notes_editor::render_note_editor;
