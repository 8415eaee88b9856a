// SPDX-License-Identifier: GPL-3.0-only
//! Streaming thread lifecycle
//!
//! Every backend produces preview frames from a dedicated OS thread. A
//! [`StreamLoop`] owns that thread: it runs one iteration closure until the
//! closure returns [`LoopAction::Stop`] or the owner calls [`StreamLoop::stop`].
//! Dropping a `StreamLoop` stops and joins the thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Returned by a loop iteration to control the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// Handle to a running streaming thread
pub struct StreamLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl StreamLoop {
    /// Spawn a streaming thread running `iteration` repeatedly
    pub fn spawn<F>(name: &str, mut iteration: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        Self::spawn_with_init(name, || Ok(()), move |_: &mut ()| iteration())
    }

    /// Spawn a streaming thread that first builds its state with `init`
    ///
    /// Device handles that must live on the streaming thread are opened in
    /// `init`. If `init` fails the thread exits without iterating.
    pub fn spawn_with_init<S, I, F>(name: &str, init: I, mut iteration: F) -> Self
    where
        S: 'static,
        I: FnOnce() -> Result<S, String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();

        info!(name = %name, "Starting stream loop");

        let thread_handle = thread::spawn(move || {
            let mut state = match init() {
                Ok(state) => state,
                Err(e) => {
                    warn!(name = %thread_name, error = %e, "Stream loop initialization failed");
                    return;
                }
            };

            while !stop.load(Ordering::SeqCst) {
                if iteration(&mut state) == LoopAction::Stop {
                    debug!(name = %thread_name, "Stream loop requested stop");
                    break;
                }
            }

            info!(name = %thread_name, "Stream loop exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the thread is still alive
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Stream loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Stream loop joined");
            }
        }
    }
}

impl Drop for StreamLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.stop();
        }
    }
}
