// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Domain types for the Becon operator console
//!
//! This crate contains the core domain types that are shared between the
//! REST contract, the command orchestration engine and the front-ends.
//! These types are transport-agnostic and UI-agnostic.

pub mod agent;
pub mod command;
pub mod status;

// Re-export commonly used types
pub use agent::*;
pub use command::*;
pub use status::*;
