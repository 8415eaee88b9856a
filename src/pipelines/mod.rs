// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │  JPEG bytes  │
//! │ (RGBA/YUYV)  │     │  - RGB conversion │     │              │
//! │              │     │  - Encoding       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! Encoding runs off the caller's thread so the preview never freezes.
//!
//! # Modules
//!
//! - [`photo`]: JPEG encoding of captured frames

pub mod photo;
