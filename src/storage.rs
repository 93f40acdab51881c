//! Object storage client.
//!
//! Receipts, QR codes, hero images and media assets live in an external
//! bucket service reached over HTTP. When the service is not configured
//! the store runs disabled: uploads fail with [`StorageError::Disabled`]
//! and callers decide whether that is fatal (receipt uploads are not).

use reqwest::Client;
use thiserror::Error;

use crate::domain::value_objects::OrderId;

pub const RECEIPTS_BUCKET: &str = "receipts";
pub const QR_CODES_BUCKET: &str = "qr-codes";
pub const HERO_IMAGES_BUCKET: &str = "hero-images";
pub const ASSETS_BUCKET: &str = "assets";

/// Key for a payment receipt: `<orderId>_receipt.<ext>`.
pub fn receipt_object_key(order_id: &OrderId, extension: &str) -> String {
    format!("{}_receipt.{}", order_id.as_str(), extension)
}

/// Key for admin-uploaded media: millisecond timestamp prefix keeps
/// repeated uploads of the same file name from colliding.
pub fn timestamped_object_key(file_name: &str) -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        file_name.trim().replace(' ', "-")
    )
}

/// Recover the object key from a public URL this store produced.
/// `None` when the URL points somewhere else.
pub fn object_key_from_public_url<'a>(url: &'a str, bucket: &str) -> Option<&'a str> {
    let marker = format!("/storage/v1/object/public/{bucket}/");
    url.find(&marker)
        .map(|idx| &url[idx + marker.len()..])
        .filter(|key| !key.is_empty())
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage is not configured")]
    Disabled,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct ObjectStore {
    inner: Option<Remote>,
}

#[derive(Debug, Clone)]
struct Remote {
    base_url: String,
    key: String,
    http: Client,
}

impl ObjectStore {
    pub fn new(base_url: &str, key: &str) -> Self {
        Self {
            inner: Some(Remote {
                base_url: base_url.trim_end_matches('/').to_string(),
                key: key.to_string(),
                http: Client::new(),
            }),
        }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Publicly reachable URL for an object, without talking to the
    /// service. `None` when the store is disabled.
    pub fn public_url(&self, bucket: &str, object_key: &str) -> Option<String> {
        self.inner.as_ref().map(|remote| {
            format!(
                "{}/storage/v1/object/public/{}/{}",
                remote.base_url, bucket, object_key
            )
        })
    }

    /// Upload raw bytes and return the object's public URL.
    pub async fn upload(
        &self,
        bucket: &str,
        object_key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let remote = self.inner.as_ref().ok_or(StorageError::Disabled)?;
        let url = format!("{}/storage/v1/object/{}/{}", remote.base_url, bucket, object_key);

        let response = remote
            .http
            .post(&url)
            .bearer_auth(&remote.key)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected { status, body });
        }

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            remote.base_url, bucket, object_key
        ))
    }

    pub async fn delete(&self, bucket: &str, object_key: &str) -> Result<(), StorageError> {
        let remote = self.inner.as_ref().ok_or(StorageError::Disabled)?;
        let url = format!("{}/storage/v1/object/{}/{}", remote.base_url, bucket, object_key);

        let response = remote
            .http
            .delete(&url)
            .bearer_auth(&remote.key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_key_uses_order_id_and_extension() {
        let order_id = OrderId::parse("DOPE-1736603461000-7GK2MQ4XZ").unwrap();
        assert_eq!(
            receipt_object_key(&order_id, "jpg"),
            "DOPE-1736603461000-7GK2MQ4XZ_receipt.jpg"
        );
        assert_eq!(
            receipt_object_key(&order_id, "pdf"),
            "DOPE-1736603461000-7GK2MQ4XZ_receipt.pdf"
        );
    }

    #[test]
    fn test_timestamped_key_prefixes_and_normalizes() {
        let key = timestamped_object_key("  esewa QR final.png ");
        let (prefix, rest) = key.split_once('-').unwrap();
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "esewa-QR-final.png");
    }

    #[test]
    fn test_public_url_shape() {
        let store = ObjectStore::new("https://storage.example.com/", "service-key");
        assert_eq!(
            store.public_url(RECEIPTS_BUCKET, "DOPE-1-AAAAAAAAA_receipt.png"),
            Some(
                "https://storage.example.com/storage/v1/object/public/receipts/DOPE-1-AAAAAAAAA_receipt.png"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_object_key_recovered_from_public_url() {
        let url = "https://storage.example.com/storage/v1/object/public/qr-codes/1736603461000-esewa.png";
        assert_eq!(object_key_from_public_url(url, QR_CODES_BUCKET), Some("1736603461000-esewa.png"));
        assert_eq!(object_key_from_public_url(url, HERO_IMAGES_BUCKET), None);
        assert_eq!(object_key_from_public_url("https://cdn.elsewhere.com/x.png", QR_CODES_BUCKET), None);
    }

    #[test]
    fn test_disabled_store_has_no_urls() {
        let store = ObjectStore::disabled();
        assert!(!store.is_enabled());
        assert_eq!(store.public_url(RECEIPTS_BUCKET, "x.png"), None);
    }

    #[tokio::test]
    async fn test_disabled_store_refuses_uploads() {
        let store = ObjectStore::disabled();
        let result = store.upload(RECEIPTS_BUCKET, "x.png", "image/png", vec![1, 2, 3]).await;
        assert!(matches!(result, Err(StorageError::Disabled)));
    }
}
