// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced by the drag pipeline.
//!
//! Resolution failures (no container under the pointer, no orientation, no
//! drop target among the ancestors) are never errors; they resolve to
//! defaults. What remains are programmer errors and transport failures.

use std::fmt;

/// A failure reported by the native drag transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportError {
    /// Human-readable description from the platform layer.
    pub message: String,
}

impl TransportError {
    /// Create a transport error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drag transport failed: {}", self.message)
    }
}

impl std::error::Error for TransportError {}

/// Errors that abort the current drag operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragDropError {
    /// A handler asked for a custom adorner that was never registered.
    UnknownAdorner {
        /// The requested adorner name.
        name: &'static str,
    },
    /// The transport failed and the source's exception hook declined it.
    Transport(TransportError),
}

impl fmt::Display for DragDropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAdorner { name } => {
                write!(f, "drop adorner `{name}` is not registered")
            }
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DragDropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Transport(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<TransportError> for DragDropError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}
