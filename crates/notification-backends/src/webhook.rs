// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use meta_relayer_types::EnvUrl;
use meta_relayer_utils::probe;

use crate::Notifier;

/// Sends each message as `GET <hook-url><urlencoded message>`.
///
/// The request runs on the current tokio runtime and its outcome is only
/// logged.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    hook: EnvUrl,
}

impl WebhookNotifier {
    /// Creates a notifier for the given hook URL.
    pub fn new(hook: EnvUrl) -> Self {
        Self {
            client: reqwest::Client::new(),
            hook,
        }
    }

    /// The URL a message is sent to.
    pub fn url_for(
        &self,
        message: &str,
    ) -> meta_relayer_utils::Result<url::Url> {
        let encoded: String =
            url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
        let url = url::Url::parse(&format!("{}{encoded}", self.hook.as_str()))?;
        Ok(url)
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, message: &str) {
        let url = match self.url_for(message) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(%e, "could not build the notification url");
                return;
            }
        };
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(%e, "no runtime to send the notification on");
                return;
            }
        };
        let client = self.client.clone();
        let message = message.to_owned();
        handle.spawn(async move {
            match client.get(url).send().await {
                Ok(response) => {
                    tracing::event!(
                        target: probe::TARGET,
                        tracing::Level::DEBUG,
                        kind = %probe::Kind::Notification,
                        status = %response.status(),
                        note = %message,
                    );
                }
                Err(e) => {
                    tracing::warn!(%e, note = %message, "notification hook failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn hook(url: &str) -> EnvUrl {
        EnvUrl::from(url::Url::parse(url).unwrap())
    }

    #[test]
    fn message_is_urlencoded_onto_the_hook() {
        let notifier =
            WebhookNotifier::new(hook("https://hooks.example.org/n?text="));
        let url = notifier.url_for("New vote & more").unwrap();
        assert_eq!(
            url.as_str(),
            "https://hooks.example.org/n?text=New+vote+%26+more"
        );
    }

    #[test]
    fn notify_without_a_runtime_does_not_panic() {
        let notifier = WebhookNotifier::new(hook("http://127.0.0.1:9/?m="));
        notifier.notify("dropped");
    }

    #[tokio::test]
    async fn notify_sends_a_get_request() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();
        let notifier = WebhookNotifier::new(hook(&format!(
            "http://127.0.0.1:{port}/hook?content="
        )));
        notifier.notify("New vote");

        let received = tokio::time::timeout(Duration::from_secs(5), async {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 512];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 204 No Content\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        })
        .await
        .unwrap();
        assert!(received.starts_with("GET /hook?content=New+vote HTTP/1.1"));
    }
}
