//! Status - sweep / dispatch の結果ビュー
//!
//! ログと CLI 出力のためだけの値で、呼び出し側が無視しても挙動は変わりません。

use serde::{Deserialize, Serialize};

/// Result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Site-local "now" used for the comparison (`Y-m-d H:i:s`).
    pub now: String,
    /// Items returned by the expired-items query.
    pub matched: usize,
    /// Items moved to draft and flagged.
    pub drafted: usize,
    /// Items whose writes failed (logged, not retried).
    pub failed: usize,
}

/// Result of one dispatch tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub fired: usize,
    pub failed: usize,
}
