//! irtdeck-report — Rendering collaborators for irtdeck model reports.
//!
//! Every renderer reads a [`irtdeck_core::report::ModelReport`] and writes
//! one artifact kind: a self-contained HTML page, a Markdown slide deck with
//! its SVG charts, or long-format CSV tables.

pub mod charts;
pub mod csv;
pub mod deck;
mod escape;
pub mod html;
pub mod svg;
