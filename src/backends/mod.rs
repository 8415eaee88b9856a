// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera access
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Capture Controller              │
//! └──────────┬──────────────────────┬───────────┘
//!            │                      │
//! ┌──────────┴──────────┐ ┌─────────┴───────────┐
//! │     Permission      │ │       Camera        │
//! │ portal/device/static│ │   virtual / V4L2    │
//! └─────────────────────┘ └─────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Camera backend trait, manager and V4L2 backend
//! - [`permission`]: Camera authorization providers
//! - [`virtual_camera`]: Synthetic camera (test pattern or still image)

pub mod camera;
pub mod permission;
pub mod virtual_camera;
