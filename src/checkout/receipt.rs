//! Proof-of-payment receipt handling.
//!
//! Receipts travel inside the order submission as a base64 data URL and
//! are persisted server-side as an object-storage URL. The conversion is
//! single-shot and unstreamed, so the file size is capped well below
//! anything that would hurt.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

/// Client-enforced ceiling for receipt files.
pub const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

/// MIME types a receipt may carry. `image/jpg` is not a real MIME type,
/// but enough browsers report it that it stays on the list.
pub const ALLOWED_RECEIPT_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "application/pdf"];

/// A validated receipt file, held client-side until submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptAttachment {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl ReceiptAttachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ReceiptError> {
        let content_type = content_type.into();
        if !ALLOWED_RECEIPT_TYPES.contains(&content_type.as_str()) {
            return Err(ReceiptError::UnsupportedType(content_type));
        }
        if bytes.len() > MAX_RECEIPT_BYTES {
            return Err(ReceiptError::TooLarge { size: bytes.len() });
        }
        Ok(Self { file_name: file_name.into(), content_type, bytes })
    }

    pub fn file_name(&self) -> &str { &self.file_name }
    pub fn content_type(&self) -> &str { &self.content_type }
    pub fn bytes(&self) -> &[u8] { &self.bytes }
    pub fn len(&self) -> usize { self.bytes.len() }
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// File extension used for the storage key `<order id>_receipt.<ext>`.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "application/pdf" => "pdf",
            _ => "jpg",
        }
    }

    /// Encode for transport: `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, BASE64.encode(&self.bytes))
    }

    /// Decode a transported receipt. Re-applies the type and size rules,
    /// since the data URL arrives from the network.
    pub fn from_data_url(data_url: &str, file_name: impl Into<String>) -> Result<Self, ReceiptError> {
        let rest = data_url.strip_prefix("data:").ok_or(ReceiptError::InvalidDataUrl)?;
        let (content_type, payload) = rest.split_once(";base64,").ok_or(ReceiptError::InvalidDataUrl)?;
        let bytes = BASE64.decode(payload)?;
        Self::new(file_name, content_type, bytes)
    }
}

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("receipt is {size} bytes, over the {MAX_RECEIPT_BYTES} byte limit")]
    TooLarge { size: usize },
    #[error("receipt type {0} is not accepted (JPEG, PNG or PDF only)")]
    UnsupportedType(String),
    #[error("receipt is not a base64 data URL")]
    InvalidDataUrl,
    #[error("receipt base64 payload is invalid")]
    InvalidBase64(#[from] base64::DecodeError),
}
