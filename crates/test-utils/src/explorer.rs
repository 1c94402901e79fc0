// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;

use serde_json::json;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// GUID returned for accepted source submissions.
pub const SOURCE_GUID: &str = "vfx7crkgwmnbyfhrznrd2qqzbuuue2ryy1v5ucmkzdruhnyjkv";
/// GUID returned for accepted proxy verifications.
pub const PROXY_GUID: &str = "gwgrrnfy56zf6vc1fljuejwg6pelnc5yns";

/// Mock of the Etherscan v2 contract API.
///
/// By default every source submission is queued, every status check passes, and every proxy
/// verification is accepted.
pub struct ExplorerMockServer {
    server: MockServer,
}

impl ExplorerMockServer {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let mock_server = Self { server };

        mock_server.mount("verifysourcecode", "1", SOURCE_GUID, u8::MAX).await;
        mock_server.mount("checkverifystatus", "1", "Pass - Verified", u8::MAX).await;
        mock_server.mount("verifyproxycontract", "1", PROXY_GUID, u8::MAX).await;
        mock_server
    }

    /// URL to configure as the explorer API endpoint.
    pub fn api_url(&self) -> String {
        format!("{}/v2/api", self.server.uri())
    }

    /// Answer `action` requests with the given `status` and `result` instead of the default.
    pub async fn respond(&self, action: &str, status: &str, result: &str) {
        self.mount(action, status, result, 1).await;
    }

    async fn mount(&self, action: &str, status: &str, result: &str, priority: u8) {
        let message = if status == "1" { "OK" } else { "NOTOK" };
        let body = json!({ "status": status, "message": message, "result": result });
        let action = action.to_string();

        Mock::given(move |req: &Request| {
            request_params(req).get("action").is_some_and(|a| *a == action)
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .with_priority(priority)
        .mount(&self.server)
        .await;
    }

    /// Query and form parameters of every request received so far, in order.
    pub async fn requests(&self) -> Vec<HashMap<String, String>> {
        let requests = self.server.received_requests().await.unwrap_or_default();
        requests.iter().map(request_params).collect()
    }
}

/// Query parameters of `request` merged with its urlencoded form body.
pub fn request_params(request: &Request) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = request.url.query_pairs().into_owned().collect();
    params.extend(url::form_urlencoded::parse(&request.body).into_owned());
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_by_action() {
        let server = ExplorerMockServer::new().await;
        server.respond("checkverifystatus", "0", "Pending in queue").await;
        let client = reqwest::Client::new();

        let body = client
            .post(server.api_url())
            .query(&[("chainid", "97")])
            .form(&[("module", "contract"), ("action", "verifyproxycontract")])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains(PROXY_GUID));

        let body = client
            .get(server.api_url())
            .query(&[("action", "checkverifystatus"), ("guid", SOURCE_GUID)])
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("Pending in queue"));

        let requests = server.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["chainid"], "97");
        assert_eq!(requests[0]["action"], "verifyproxycontract");
        assert_eq!(requests[1]["guid"], SOURCE_GUID);
    }
}
