// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use super::HttpBackend;
use crate::error::BackendError;
use crate::models::MerchantProfile;

impl HttpBackend {
    /// `GET /merchant/:id/profile`. A merchant without a profile yet gets
    /// `Ok(None)`.
    pub async fn merchant_profile(
        &self,
        token: &str,
        merchant_id: &str,
    ) -> Result<Option<MerchantProfile>, BackendError> {
        let path = format!("/merchant/{merchant_id}/profile");
        self.send_optional(self.get(&path, Some(token))).await
    }
}
