//! # Tether HTTP
//!
//! A thin wrapper over `reqwest` that runs every request through four
//! replaceable hooks:
//!
//! ```text
//!  prepare ──> [dump request] ──> send ──┬── 200 ──> success (or `next`)
//!                                        └── else ─> error
//!  finish runs last on every path
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let http = tether_http::HttpClient::default();
//! let request = http.get("https://api.huobi.pro/v1/common/timestamp").build()?;
//! let body: serde_json::Value = http.result(request).await?;
//! ```

pub mod client;
pub mod dump;
pub mod error;
pub mod hooks;

pub use client::HttpClient;
pub use dump::{dump_request, ResponseSummary};
pub use error::{HttpError, Result};
pub use hooks::{
    ErrorHook, FinishHook, LogElapsed, LogFailure, LogSuccess, NoCache, PrepareHook, SuccessHook,
};
