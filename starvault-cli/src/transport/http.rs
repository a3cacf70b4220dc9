use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use starvault_core::error::StarVaultError;
use starvault_core::traits::{RemoteDocument, RemoteStore};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// [`RemoteStore`] speaking JSON to a `starvault-server`.
///
/// Request deadlines are applied by the sync engine; only the connect phase
/// is bounded here.
pub struct HttpRemote {
    client: Client,
    base_url: Url,
}

impl HttpRemote {
    /// `base_url` is the server root, e.g. `http://localhost:8080`.
    pub fn new(base_url: &str) -> Result<Self, StarVaultError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StarVaultError::Remote(format!("invalid server URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StarVaultError::Remote(format!(
                "server URL '{base_url}' cannot carry a path"
            )));
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| StarVaultError::Remote(format!("HTTP client setup failed: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// `{base}/api/documents/{user_id}` with the id percent-encoded.
    fn document_url(&self, user_id: &str) -> Result<Url, StarVaultError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StarVaultError::Remote("server URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["api", "documents", user_id]);
        Ok(url)
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn upsert(&self, user_id: &str, doc: &RemoteDocument) -> Result<(), StarVaultError> {
        let url = self.document_url(user_id)?;
        let response = self
            .client
            .put(url.clone())
            .json(doc)
            .send()
            .await
            .map_err(|e| StarVaultError::Remote(format!("PUT {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StarVaultError::Remote(format!("PUT {url} returned {status}")));
        }
        debug!("Uploaded document for '{}' ({} bytes)", user_id, doc.encrypted_data.len());
        Ok(())
    }

    async fn fetch_authoritative(
        &self,
        user_id: &str,
    ) -> Result<Option<RemoteDocument>, StarVaultError> {
        let url = self.document_url(user_id)?;
        let response = self
            .client
            .get(url.clone())
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| StarVaultError::Remote(format!("GET {url} failed: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("No remote document for '{}'", user_id);
                Ok(None)
            }
            status if status.is_success() => {
                let doc = response.json::<RemoteDocument>().await.map_err(|e| {
                    StarVaultError::Remote(format!("GET {url} returned an unreadable body: {e}"))
                })?;
                Ok(Some(doc))
            }
            status => Err(StarVaultError::Remote(format!("GET {url} returned {status}"))),
        }
    }

    async fn delete(&self, user_id: &str) -> Result<(), StarVaultError> {
        let url = self.document_url(user_id)?;
        let response = self
            .client
            .delete(url.clone())
            .send()
            .await
            .map_err(|e| StarVaultError::Remote(format!("DELETE {url} failed: {e}")))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            debug!("Deleted remote document for '{}'", user_id);
            Ok(())
        } else {
            Err(StarVaultError::Remote(format!("DELETE {url} returned {status}")))
        }
    }
}
