//! Background paging.
//!
//! Runs on a dedicated thread that owns one session. The UI thread sends a
//! page request, the pager pulls the page from the [`SessionStore`] and sends
//! the result back over an [`mpsc`] channel. Pulls can block on extractor
//! lookups, which is why they never run on the UI thread.
//!
//! While the user is reading, the pager keeps the session alive with
//! zero-sized pulls so the sliding TTL never runs out under an open screen.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rstream::{MediaPost, SessionStore, StreamError};

/// Messages sent from the pager thread to the UI thread.
pub enum PollMsg {
    /// A page arrived.
    Page { posts: Vec<MediaPost>, exhausted: bool },
    /// A pull failed; the session is still usable.
    Error(String),
    /// The session expired or was ended; the pager has stopped.
    Expired,
}

/// Handle held by the UI thread.
pub struct Pager {
    requests: mpsc::Sender<usize>,
    pub messages: mpsc::Receiver<PollMsg>,
}

impl Pager {
    /// Ask for `count` more posts. Returns `false` once the pager has stopped.
    pub fn request(&self, count: usize) -> bool {
        self.requests.send(count).is_ok()
    }
}

/// Interval between keep-alive pulls, well inside the session TTL.
fn keepalive_interval(ttl: Duration) -> Duration {
    (ttl / 2).max(Duration::from_millis(100))
}

/// Spawn the pager thread for session `key`.
///
/// The thread ends the session and exits when the [`Pager`] is dropped.
pub fn spawn(store: Arc<SessionStore>, key: String) -> Pager {
    let (req_tx, req_rx) = mpsc::channel::<usize>();
    let (msg_tx, msg_rx) = mpsc::channel();
    let keepalive = keepalive_interval(store.config().session_ttl());

    thread::spawn(move || loop {
        let count = match req_rx.recv_timeout(keepalive) {
            Ok(count) => count,
            Err(RecvTimeoutError::Timeout) => 0,
            Err(RecvTimeoutError::Disconnected) => {
                store.end_session(&key);
                return;
            }
        };

        let msg = match store.pull_next(&key, count) {
            Ok(_) if count == 0 => continue,
            Ok(page) => PollMsg::Page {
                posts: page.posts,
                exhausted: page.exhausted,
            },
            Err(StreamError::UnknownSession(_)) => {
                let _ = msg_tx.send(PollMsg::Expired);
                return;
            }
            Err(e) => {
                tracing::error!(session = %key, error = %e, "page pull failed");
                PollMsg::Error(e.to_string())
            }
        };
        // If the receiver is gone the main thread has exited.
        if msg_tx.send(msg).is_err() {
            store.end_session(&key);
            return;
        }
    });

    Pager {
        requests: req_tx,
        messages: msg_rx,
    }
}
