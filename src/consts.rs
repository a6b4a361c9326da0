//! Project-wide constants.

use std::time::Duration;

/// Redraw period of the progress frame.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub const DEFAULT_PREFIX: &str = "[";
pub const DEFAULT_SUFFIX: &str = "] ";

/// Classic ASCII spinner, one glyph per frame.
pub const DEFAULT_PROGRESS_GLYPHS: &[&str] = &["|", "/", "-", "\\"];

/// Check mark.
pub const DEFAULT_SUCCESS_GLYPH: &str = "\u{2713}";

/// Middle cross.
pub const DEFAULT_FAIL_GLYPH: &str = "\u{00D7}";

/// Hide the cursor, wrapped in carriage returns so the column is unchanged.
pub const HIDE_CURSOR: &str = "\r\x1b[?25l\r";

/// Show the cursor again.
pub const SHOW_CURSOR: &str = "\r\x1b[?25h\r";
