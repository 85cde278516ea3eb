//! 時刻ソース
//!
//! wasm32-unknown-unknown では `std::time::Instant` が使えないため `web-time` に切り替える。

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub(crate) use web_time::Instant;

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
pub(crate) use std::time::Instant;
