use std::time::{Duration, Instant};

use iced::Color;

const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Loading,
    Success,
    Error,
}

impl Severity {
    pub fn color(self) -> Color {
        match self {
            Severity::Loading => Color::from_rgb8(0x63, 0x66, 0xf1),
            Severity::Success => Color::from_rgb8(0x22, 0xc5, 0x5e),
            Severity::Error => Color::from_rgb8(0xef, 0x44, 0x44),
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Loading => "…",
            Severity::Success => "✔",
            Severity::Error => "✖",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub key: Option<&'static str>,
    pub severity: Severity,
    pub message: String,
    expires_at: Option<Instant>,
}

/// Transient notifications. A toast pushed with the key of a visible toast
/// takes its place instead of stacking.
#[derive(Debug)]
pub struct ToastManager {
    toasts: Vec<Toast>,
    lifetime: Duration,
}

impl ToastManager {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            lifetime,
        }
    }

    /// Stays until replaced by a toast with the same key.
    pub fn loading(&mut self, key: &'static str, message: impl Into<String>) {
        self.push(Some(key), Severity::Loading, message.into(), None);
    }

    pub fn success(&mut self, key: Option<&'static str>, message: impl Into<String>, now: Instant) {
        let expires_at = Some(now + self.lifetime);
        self.push(key, Severity::Success, message.into(), expires_at);
    }

    pub fn error(&mut self, key: Option<&'static str>, message: impl Into<String>, now: Instant) {
        let expires_at = Some(now + self.lifetime);
        self.push(key, Severity::Error, message.into(), expires_at);
    }

    fn push(
        &mut self,
        key: Option<&'static str>,
        severity: Severity,
        message: String,
        expires_at: Option<Instant>,
    ) {
        let toast = Toast {
            key,
            severity,
            message,
            expires_at,
        };

        let existing = key.and_then(|key| self.toasts.iter().position(|t| t.key == Some(key)));
        match existing {
            Some(index) => self.toasts[index] = toast,
            None => {
                self.toasts.push(toast);
                if self.toasts.len() > MAX_VISIBLE {
                    self.toasts.remove(0);
                }
            }
        }
    }

    /// Drop expired toasts.
    pub fn tick(&mut self, now: Instant) {
        self.toasts
            .retain(|toast| toast.expires_at.map_or(true, |expires_at| expires_at > now));
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.toasts.len() {
            self.toasts.remove(index);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }
}
