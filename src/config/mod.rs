//! Spinner configuration: the visual [`Style`], the per-state [`Messages`]
//! and the output sink.
//!
//! A [`Style`] is plain data and can be loaded from a JSON file, so tools
//! can ship their own glyph sets without recompiling.

use std::fmt;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_FAIL_GLYPH, DEFAULT_PREFIX, DEFAULT_PROGRESS_GLYPHS, DEFAULT_SUCCESS_GLYPH,
    DEFAULT_SUFFIX,
};
use crate::error::{SpinnerError, SpinnerResult};
use crate::sink::Sink;

/// Glyphs and decorations. Missing keys in a style file take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub prefix: String,
    pub suffix: String,
    /// Cycled one per frame while spinning.
    pub progress_glyphs: Vec<String>,
    pub success_glyph: String,
    pub fail_glyph: String,
    pub hide_cursor: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            progress_glyphs: DEFAULT_PROGRESS_GLYPHS
                .iter()
                .map(|g| g.to_string())
                .collect(),
            success_glyph: DEFAULT_SUCCESS_GLYPH.to_string(),
            fail_glyph: DEFAULT_FAIL_GLYPH.to_string(),
            hide_cursor: true,
        }
    }
}

impl Style {
    /// Load a style from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read style file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse style file {}", path.display()))
    }
}

/// Trailing text for each state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    pub progress: String,
    pub success: String,
    pub fail: String,
}

impl Messages {
    /// One message for all three states.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            progress: message.clone(),
            success: message.clone(),
            fail: message,
        }
    }

    /// Positional messages: progress, then success, then fail.
    /// Success and fail fall back to the progress message.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let progress = args.first().map(|s| s.as_ref().to_string()).unwrap_or_default();
        let success = args
            .get(1)
            .map(|s| s.as_ref().to_string())
            .unwrap_or_else(|| progress.clone());
        let fail = args
            .get(2)
            .map(|s| s.as_ref().to_string())
            .unwrap_or_else(|| progress.clone());
        Self {
            progress,
            success,
            fail,
        }
    }
}

/// Everything a spinner needs. `sink: None` means standard output.
#[derive(Default)]
pub struct Config {
    pub style: Style,
    pub messages: Messages,
    pub sink: Option<Sink>,
}

impl Config {
    pub fn new(style: Style, messages: Messages) -> Self {
        Self {
            style,
            messages,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn validate(&self) -> SpinnerResult<()> {
        if self.style.progress_glyphs.is_empty() {
            return Err(SpinnerError::EmptyGlyphs);
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("style", &self.style)
            .field("messages", &self.messages)
            .field("sink", &self.sink.as_ref().map(|_| "<sink>"))
            .finish()
    }
}
