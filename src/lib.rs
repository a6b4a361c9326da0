//! Single-line terminal spinners that finish in place with a success or
//! failure glyph.
//!
//! Build a [`spinner::Spinner`] from a [`config::Config`], call
//! [`renderer::Renderer::run`], then `success().await` or `fail().await`
//! once the work is done.

pub mod config;
pub mod consts;
pub mod error;
pub mod renderer;
pub mod sink;
pub mod spinner;
