// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Order listing and customer order actions.

use tracing::info;

use super::HttpBackend;
use crate::error::{BackendError, ClientError};
use crate::models::{DisputeRequest, MessageResponse, Order};

impl HttpBackend {
    /// `GET /orders`
    pub async fn list_orders(&self, token: &str) -> Result<Vec<Order>, BackendError> {
        self.send_json(self.get("/orders", Some(token))).await
    }

    /// `POST /orders/:id/confirm-finish`
    pub async fn confirm_order(
        &self,
        token: &str,
        order_id: &str,
    ) -> Result<MessageResponse, ClientError> {
        let order_id = non_empty(order_id, "Order id is required")?;
        let path = format!("/orders/{order_id}/confirm-finish");
        let resp: MessageResponse = self.send_json(self.post(&path, Some(token))).await?;
        info!(order_id, "Order confirmed");
        Ok(resp)
    }

    /// `POST /orders/:id/dispute`
    ///
    /// An empty reason is rejected before any request is made.
    pub async fn dispute_order(
        &self,
        token: &str,
        order_id: &str,
        reason: &str,
    ) -> Result<MessageResponse, ClientError> {
        let order_id = non_empty(order_id, "Order id is required")?;
        let reason = non_empty(reason, "Please provide a reason for the dispute")?;
        let path = format!("/orders/{order_id}/dispute");
        let body = DisputeRequest {
            reason: reason.to_string(),
        };
        let resp: MessageResponse = self.post_json(&path, Some(token), &body).await?;
        info!(order_id, "Dispute raised");
        Ok(resp)
    }
}

fn non_empty<'a>(value: &'a str, message: &str) -> Result<&'a str, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ClientError::InvalidInput(message.to_string()))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::orders::OrderStatus;

    #[tokio::test]
    async fn lists_orders() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"orderId": "1", "cid": "bafy", "status": "COMPLETED", "amount": "5 PyUSD"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
        let orders = backend.list_orders("tok1").await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn confirm_trims_order_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/9/confirm-finish"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Confirmed"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
        let resp = backend.confirm_order("tok1", " 9 ").await.unwrap();
        assert_eq!(resp.message.as_deref(), Some("Confirmed"));
    }

    #[tokio::test]
    async fn dispute_sends_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders/9/dispute"))
            .and(header("authorization", "Bearer tok1"))
            .and(body_json(json!({"reason": "cold food"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Dispute raised"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
        let resp = backend.dispute_order("tok1", "9", "cold food").await.unwrap();
        assert_eq!(resp.message.as_deref(), Some("Dispute raised"));
    }

    #[tokio::test]
    async fn empty_dispute_reason_is_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = backend.dispute_order("tok1", "9", "   ").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }
}
