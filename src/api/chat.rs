// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use super::HttpBackend;
use crate::error::BackendError;
use crate::models::{ChatMessage, ChatReply, ChatRequest, ChatResponse};

impl HttpBackend {
    /// `POST /chat/messages` with the full conversation so far.
    pub async fn send_chat(
        &self,
        token: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatReply, BackendError> {
        let body = ChatRequest { messages };
        let resp: ChatResponse = self.post_json("/chat/messages", Some(token), &body).await?;
        ChatReply::try_from(resp).map_err(BackendError::InvalidResponse)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn posts_conversation_and_decodes_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/messages"))
            .and(header("authorization", "Bearer tok1"))
            .and(body_json(json!({
                "messages": [{"role": "user", "content": "one pizza"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "What size?"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
        let reply = backend
            .send_chat("tok1", vec![ChatMessage::user("one pizza")])
            .await
            .unwrap();
        assert_eq!(reply, ChatReply::Text("What size?".into()));
    }
}
