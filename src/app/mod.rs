// SPDX-License-Identifier: GPL-3.0-only

//! Camera screen logic
//!
//! # Architecture
//!
//! - `state`: [`CaptureState`] snapshot and derived [`SessionPhase`]
//! - `controller`: [`CaptureController`] state machine
//! - `preview`: [`PreviewSurface`] passive frame view
//!
//! The UI never touches the controller directly. It sends [`Message`]s to a
//! controller task and reads published states back:
//!
//! ```text
//! key press ─▶ Message ─▶ controller task ─▶ session/output
//!                                 │
//!   redraw ◀── watch::Receiver ◀──┘
//! ```

pub mod controller;
pub mod preview;
pub mod state;

pub use controller::{CaptureController, DeviceSelection, Transition};
pub use preview::PreviewSurface;
pub use state::{CaptureState, SessionPhase};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// User intents and screen lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Screen appeared: check camera access
    Authorize,
    /// Attach input and output
    Configure,
    /// Preview surface bound: start streaming
    Start,
    /// Shutter pressed
    Capture,
    /// Retake pressed
    Retake,
    /// Save pressed
    Save,
    /// Screen closing
    Shutdown,
}

/// UI-side handle to a running controller task
pub struct ControllerHandle {
    sender: mpsc::UnboundedSender<Message>,
    state: watch::Receiver<CaptureState>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    /// Queue a message; messages are handled strictly in order
    pub fn send(&self, message: Message) {
        if self.sender.send(message).is_err() {
            debug!(?message, "Controller task has exited, dropping message");
        }
    }

    /// Newest published state
    pub fn state(&self) -> CaptureState {
        self.state.borrow().clone()
    }

    /// A receiver for awaiting state changes
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.clone()
    }

    /// Stop the session and wait for the controller task to finish
    pub async fn close(self) {
        self.send(Message::Shutdown);
        if let Err(e) = self.task.await {
            debug!(error = %e, "Controller task ended abnormally");
        }
    }
}

/// Move `controller` onto its own task
///
/// Must be called from within a tokio runtime.
pub fn spawn(mut controller: CaptureController) -> ControllerHandle {
    let state = controller.subscribe();
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            // Failures are logged and recorded in the state by the controller
            if let Err(e) = controller.update(message).await {
                debug!(?message, error = %e, "Message failed");
            }
            if message == Message::Shutdown {
                break;
            }
        }
        let _ = controller.shutdown().await;
        info!("Controller task finished");
    });

    ControllerHandle {
        sender,
        state,
        task,
    }
}
