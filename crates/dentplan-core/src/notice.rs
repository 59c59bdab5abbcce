//! User-facing notifications.
//!
//! Rejected or partially applied operator actions never raise: they leave a
//! [`Notice`] behind for the enclosing UI to show as a toast or inline
//! warning, and are logged.

use std::fmt;

use dentplan_model::ToothId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
        };
        f.write_str(s)
    }
}

/// A message for the operator, optionally about one tooth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub tooth: Option<ToothId>,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            tooth: None,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            tooth: None,
            message: message.into(),
        }
    }

    pub fn for_tooth(mut self, tooth: ToothId) -> Self {
        self.tooth = Some(tooth);
        self
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tooth {
            Some(tooth) => write!(f, "[{}] tooth {}: {}", self.level, tooth, self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}
