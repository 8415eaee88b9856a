// SPDX-License-Identifier: GPL-3.0-only

//! Photo output pipeline
//!
//! ```text
//! Latest frame → Encoding (worker thread) → oneshot → Capture Controller
//! ```
//!
//! The preview stream is never blocked: the frame is cloned out of the
//! frame channel and encoded off the streaming thread.

pub mod encoding;

pub use encoding::{EncodingQuality, PhotoEncoder};

use crate::backends::camera::types::{BackendError, CameraFrame, PhotoReceiver};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::warn;

/// Encode `frame` on a worker thread and deliver the bytes through the returned receiver
///
/// A missing frame resolves immediately with a capture error.
pub fn request_photo(frame: Option<Arc<CameraFrame>>, encoder: PhotoEncoder) -> PhotoReceiver {
    let (sender, receiver) = oneshot::channel();

    let Some(frame) = frame else {
        let _ = sender.send(Err(BackendError::CaptureFailed(
            "no frame available".to_string(),
        )));
        return receiver;
    };

    std::thread::spawn(move || {
        let result = encoder
            .encode_frame(&frame)
            .map_err(|e| BackendError::CaptureFailed(e.to_string()));
        if sender.send(result).is_err() {
            warn!("Photo request dropped before encoding finished");
        }
    });

    receiver
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_without_frame_fails() {
        let result = request_photo(None, PhotoEncoder::default()).await.unwrap();
        assert!(matches!(result, Err(BackendError::CaptureFailed(_))));
    }

    #[tokio::test]
    async fn test_request_encodes_frame() {
        let frame = Arc::new(CameraFrame::from_rgba(2, 2, vec![10; 16], 1));
        let bytes = request_photo(Some(frame), PhotoEncoder::default())
            .await
            .unwrap()
            .unwrap();
        assert!(!bytes.is_empty());
    }
}
