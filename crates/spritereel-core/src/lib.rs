//! # spritereel-core
//!
//! Core types and primitives for the spritereel compositor.
//! This crate contains foundational types shared across all spritereel crates:
//! frame buffers, colors, sprites, aspect ratios, durations, and error types.

pub mod aspect;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod hash;
pub mod math;
pub mod sprite;
pub mod time;

pub use config::*;

pub use aspect::AspectRatio;
pub use color::Color;
pub use error::{ReelError, ReelResult};
pub use frame::FrameBuffer;
pub use math::{Rect, ScaleTransform, Size2D};
pub use sprite::{Sprite, SpriteCollection, SpriteId};
pub use time::{Duration, Timestamp};
