// SPDX-License-Identifier: GPL-3.0-only

//! snapcam - a single-screen camera for the terminal
//!
//! Previews a camera, captures one photo, and saves it to a photo library.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Capture state machine, controller task and preview surface
//! - [`backends`]: Camera backends and camera authorization
//! - [`pipelines`]: Photo encoding
//! - [`storage`]: Photo library
//! - [`config`]: User configuration handling
//! - [`terminal`]: Interactive terminal screen
//!
//! # Example
//!
//! ```ignore
//! // Run the camera screen:
//! // snapcam
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureController, CaptureState, Message, SessionPhase, Transition};
pub use config::Config;
pub use errors::{CaptureError, CaptureErrorKind, CaptureResult};
