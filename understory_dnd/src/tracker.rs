// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drop-target tracking: derive enter/leave transitions from the target
//! resolved on each drag tick.
//!
//! The native transport reports drag-over for whatever element is under the
//! pointer. Several elements map to the same registered drop target, so the
//! coordinator resolves the target first and feeds it here; a transition is
//! produced only when the resolved target changes.
//!
//! ```
//! use understory_dnd::tracker::{TargetTracker, TargetTransition};
//! let mut t: TargetTracker<u32> = TargetTracker::new();
//! assert_eq!(t.update(Some(1)), vec![TargetTransition::Enter(1)]);
//! assert!(t.update(Some(1)).is_empty());
//! assert_eq!(t.update(Some(2)), vec![TargetTransition::Leave(1), TargetTransition::Enter(2)]);
//! ```

/// Tracks the drop target currently under the pointer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetTracker<N> {
    current: Option<N>,
}

/// A target transition.
///
/// A leave always precedes the enter of the next target.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetTransition<N> {
    /// The pointer entered this target.
    Enter(N),
    /// The pointer left this target.
    Leave(N),
}

impl<N: Copy + Eq> TargetTracker<N> {
    /// Create a tracker with no current target.
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Target the pointer is over.
    pub fn current(&self) -> Option<N> {
        self.current
    }

    /// Forget the current target, returning its leave transition.
    pub fn clear(&mut self) -> Option<TargetTransition<N>> {
        self.current.take().map(TargetTransition::Leave)
    }

    /// Move to `target` and return the transitions needed to get there.
    pub fn update(&mut self, target: Option<N>) -> Vec<TargetTransition<N>> {
        if self.current == target {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(2);
        if let Some(old) = self.current {
            out.push(TargetTransition::Leave(old));
        }
        if let Some(new) = target {
            out.push(TargetTransition::Enter(new));
        }
        self.current = target;
        out
    }
}
