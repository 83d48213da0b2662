// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fiducia Client - Wallet-authenticated ordering client
//!
//! Signs in to the Fiducia backend by proving ownership of an EVM address,
//! then runs the approve-then-pay token flows used to buy A3A and to settle
//! orders.
//!
//! ## Modules
//!
//! - `auth` - Challenge/signature login and role selection
//! - `session` - Session value, read-only handle and persistence
//! - `payment` - Approval and payment state machines and their controller
//! - `api` - Fiducia backend HTTP client (reqwest)
//! - `blockchain` - Wallet, receipt and credential collaborators (alloy)
//! - `orders` - Order status rules

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod orders;
pub mod payment;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
