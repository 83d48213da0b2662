// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Wallet-signature login against the Fiducia backend.
//!
//! ## Auth Flow
//!
//! 1. Client requests a challenge for the connected address
//! 2. Backend answers with a message embedding `Nonce: <hex>`
//! 3. Client extracts the nonce and has the wallet personal-sign the
//!    **nonce string only**
//! 4. Client posts `{address, signature}` and receives `{token, user}`
//! 5. If the user has no role yet, the client collects one and posts it
//!    with `Authorization: Bearer <token>`; the backend may reissue the token
//!
//! ## Merchant Role
//!
//! Selecting the merchant role requires the merchant NFT. Without it the
//! selection is kept pending while the credential is minted, then retried.

pub mod challenge;
pub mod controller;
pub mod roles;

pub use challenge::{extract_nonce, Challenge};
pub use controller::{AuthController, AuthState, LoginOutcome, RestoreOutcome, RoleOutcome};
pub use roles::Role;
