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

use serde::{Deserialize, Serialize};

/// A wrapper around [`url::Url`] that can be deserialized either from a URL
/// string or from `$VAR`, naming an environment variable holding the URL.
///
/// The `Debug` output drops credentials and query parameters, since hook URLs
/// and RPC endpoints often carry API keys there.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct EnvUrl(url::Url);

impl EnvUrl {
    /// Returns the inner [`url::Url`].
    pub fn as_url(&self) -> &url::Url {
        &self.0
    }
}

impl std::fmt::Display for EnvUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for EnvUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.scheme())?;
        if let Some(host) = self.0.host_str() {
            write!(f, "://{host}")?;
        }
        if let Some(port) = self.0.port() {
            write!(f, ":{port}")?;
        }
        write!(f, "{}", self.0.path())
    }
}

impl From<url::Url> for EnvUrl {
    fn from(url: url::Url) -> Self {
        EnvUrl(url)
    }
}

impl From<EnvUrl> for url::Url {
    fn from(env_url: EnvUrl) -> Self {
        env_url.0
    }
}

impl std::ops::Deref for EnvUrl {
    type Target = url::Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EnvUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct EnvUrlVisitor;
        impl<'de> serde::de::Visitor<'de> for EnvUrlVisitor {
            type Value = url::Url;

            fn expecting(
                &self,
                formatter: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                formatter.write_str(
                    "url string or an env var containing a url string in it",
                )
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let raw = match value.strip_prefix('$') {
                    Some(var) => {
                        tracing::trace!("Reading {} from env", var);
                        std::env::var(var).map_err(|e| {
                            serde::de::Error::custom(format!(
                                "error while loading this env {var}: {e}",
                            ))
                        })?
                    }
                    None => value.to_owned(),
                };
                url::Url::parse(&raw)
                    .map_err(|e| serde::de::Error::custom(format!("{e:?}")))
            }
        }

        let url = deserializer.deserialize_str(EnvUrlVisitor)?;
        Ok(Self(url))
    }
}
