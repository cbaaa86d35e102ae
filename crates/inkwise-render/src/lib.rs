//! Inkwise Render Library
//!
//! CPU rasterizer producing PNG or JPEG snapshots of an Inkwise board.

mod encode;
mod rasterizer;

pub use encode::{encode_jpeg, encode_png};
pub use rasterizer::{RenderError, RenderResult, TinySkiaRasterizer};
