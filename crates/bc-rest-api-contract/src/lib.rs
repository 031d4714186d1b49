// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Becon platform REST API contract types and validation
//!
//! This crate defines the request and response payloads exchanged with the
//! platform server's operator-facing endpoints. These types are shared by the
//! REST client, the scripted mock client and the tests.

pub mod error;
pub mod types;
pub mod validation;

pub use error::*;
pub use types::*;
