// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters to integrate with other Understory crates.
//!
//! Enabled via feature flags; the engine itself only depends on the traits in
//! [`host`](crate::host).

#[cfg(feature = "scene_adapter")]
pub mod scene;
