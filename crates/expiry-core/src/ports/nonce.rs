//! NonceVerifier port - request-forgery token
//!
//! editor の保存処理は token が正しい場合だけ metadata を書きます。

/// How old a valid token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    /// Issued in the current tick.
    Fresh,
    /// Issued in the previous tick; still accepted.
    Aging,
}

/// NonceVerifier は action + user に束縛された token を発行・検証
pub trait NonceVerifier: Send + Sync {
    fn create(&self, action: &str, user: &str) -> String;

    /// `None` when the token is invalid or expired.
    fn verify(&self, token: &str, action: &str, user: &str) -> Option<NonceAge>;
}
