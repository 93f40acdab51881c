//! DopeTech Nepal commerce service
//!
//! Single-binary backend for the storefront and its admin panel.
//!
//! ## Features
//! - Product catalog with categories, hero carousel and payment QR codes
//! - Multi-step checkout with phone validation and receipt upload
//! - Order intake with line-item snapshots and an admin status workflow
//! - Best-effort customer and shop notification emails

pub mod api;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod state;
pub mod storage;
