//! Supabase Storage adapter.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url, header};
use tracing::{debug, warn};

use super::client::map_send_error;
use crate::domain::entities::SecretKey;
use crate::domain::errors::NetworkError;
use crate::domain::ports::ObjectStoragePort;

/// Downloads objects through the Storage REST API using the service-role
/// key.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: Url,
    service_key: SecretKey,
}

impl SupabaseStorage {
    /// Creates an adapter for the project at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: Url, service_key: SecretKey) -> Self {
        Self {
            client,
            base_url,
            service_key,
        }
    }

    /// `{base}/storage/v1/object/{bucket}/{path}` with each segment escaped.
    fn object_url(&self, bucket: &str, path: &str) -> Result<Url, NetworkError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| NetworkError::Client {
                message: format!("storage URL {} cannot be a base", self.base_url),
            })?
            .pop_if_empty()
            .extend(["storage", "v1", "object", bucket])
            .extend(path.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl ObjectStoragePort for SupabaseStorage {
    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, NetworkError> {
        let url = self.object_url(bucket, path)?;
        debug!(bucket, path, "Downloading storage object");

        let response = self
            .client
            .get(url.clone())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.service_key.expose()),
            )
            .header("apikey", self.service_key.expose())
            .send()
            .await
            .map_err(|e| {
                warn!(bucket, path, error = %e, "Storage request failed");
                map_send_error(url.as_str(), &e)
            })?;

        match response.status() {
            status if status.is_success() => response
                .bytes()
                .await
                .map_err(|e| NetworkError::body(e.to_string())),
            // Storage answers 400 for missing objects in some versions.
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Err(NetworkError::NotFound {
                path: format!("{bucket}/{path}"),
            }),
            status => Err(NetworkError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

/// Storage stand-in used when no service-role key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredStorage;

#[async_trait]
impl ObjectStoragePort for UnconfiguredStorage {
    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, NetworkError> {
        warn!(bucket, path, "Storage path requested but storage is not configured");
        Err(NetworkError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::get;

    use super::*;

    async fn fake_storage() -> String {
        let router = Router::new().route(
            "/storage/v1/object/{bucket}/{*path}",
            get(|Path((bucket, path)): Path<(String, String)>, headers: HeaderMap| async move {
                let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
                let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
                if auth != Some("Bearer service-role-key") || apikey != Some("service-role-key") {
                    return (AxumStatus::UNAUTHORIZED, Vec::new());
                }
                if bucket == "books" && path == "covers/my book.png" {
                    (AxumStatus::OK, b"PNGDATA".to_vec())
                } else {
                    (AxumStatus::NOT_FOUND, Vec::new())
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn storage(base: &str, key: &str) -> SupabaseStorage {
        SupabaseStorage::new(
            Client::new(),
            Url::parse(base).unwrap(),
            SecretKey::new(key).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_download() {
        let base = fake_storage().await;
        let bytes = storage(&base, "service-role-key")
            .download("books", "covers/my book.png")
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"PNGDATA");
    }

    #[tokio::test]
    async fn test_missing_object() {
        let base = fake_storage().await;
        let err = storage(&base, "service-role-key")
            .download("books", "nope.png")
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_wrong_key() {
        let base = fake_storage().await;
        let err = storage(&base, "anon-key")
            .download("books", "covers/my book.png")
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let err = UnconfiguredStorage.download("a", "b").await.unwrap_err();
        assert!(matches!(err, NetworkError::NotConfigured));
    }
}
