use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use shared_models::notice::{Notice, NoticeLevel, Screen};

const MAX_PENDING_NOTICES: usize = 32;

/// Process-wide queue of pending notices. Producers push from any task; the
/// presentation layer drains them when it renders the next screen.
#[derive(Clone, Default)]
pub struct Notices {
    inner: Arc<Mutex<VecDeque<Notice>>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!("notice: {}", notice.message),
            NoticeLevel::Warning => warn!("notice: {}", notice.message),
            NoticeLevel::Info | NoticeLevel::Success => info!("notice: {}", notice.message),
        }

        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() == MAX_PENDING_NOTICES {
            queue.pop_front();
        }
        queue.push_back(notice);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Notice::info(message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Notice::success(message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(Notice::warning(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Notice::error(message));
    }

    pub fn drain(&self) -> Vec<Notice> {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.drain(..).collect()
    }

    /// Wraps `view` with every pending notice, emptying the queue.
    pub fn screen<T>(&self, view: T) -> Screen<T> {
        Screen { view, notices: self.drain() }
    }

    pub fn pending(&self) -> Vec<Notice> {
        let queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.iter().cloned().collect()
    }
}
