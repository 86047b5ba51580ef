//! # Operator Notices
//!
//! Messages surfaced to the operator on the settings screen.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Severity of an operator notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Error,
    Info,
}

/// A message for the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Surface for operator-visible messages
pub trait AdminNotices: Send + Sync {
    fn add_error(&self, message: &str);
    fn add_info(&self, message: &str);
}

/// Collects notices until the next settings page render drains them
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(Notice {
                level,
                message: message.to_string(),
            });
        }
    }

    /// Error messages currently queued
    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .map(|n| {
                n.iter()
                    .filter(|notice| notice.level == NoticeLevel::Error)
                    .map(|notice| notice.message.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drain all queued notices
    pub fn take(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AdminNotices for NoticeBoard {
    fn add_error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }

    fn add_info(&self, message: &str) {
        self.push(NoticeLevel::Info, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_board_collects_and_drains() {
        let board = NoticeBoard::new();
        board.add_error("Error: keys are invalid");
        board.add_info("Settings saved");

        assert_eq!(board.len(), 2);
        assert_eq!(board.errors(), vec!["Error: keys are invalid".to_string()]);

        let drained = board.take();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].level, NoticeLevel::Info);
        assert!(board.is_empty());
    }
}
