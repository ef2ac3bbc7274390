//! HashNonceVerifier - SHA-256 ベースの request-forgery token
//!
//! token は `lifetime / 2` ごとに切り替わる tick に束縛されます。
//! 現在の tick で発行されたものは Fresh、一つ前の tick なら Aging として受理し、
//! それより古いものは拒否します。

use std::sync::Arc;

use chrono::Duration;
use sha2::{Digest, Sha256};

use crate::ports::{Clock, NonceAge, NonceVerifier};

const TOKEN_LEN: usize = 10;

pub struct HashNonceVerifier {
    secret: String,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
}

impl HashNonceVerifier {
    pub fn new(secret: impl Into<String>, clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            clock,
            lifetime,
        }
    }

    fn tick(&self) -> i64 {
        let half = (self.lifetime.num_seconds() / 2).max(1);
        let now = self.clock.now().timestamp();
        // ceil(now / half) for non-negative now
        (now + half - 1).div_euclid(half)
    }

    fn token_for(&self, tick: i64, action: &str, user: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(tick.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(action.as_bytes());
        hasher.update(b"|");
        hasher.update(user.as_bytes());
        hasher.update(b"|");
        hasher.update(self.secret.as_bytes());
        let digest = hex::encode(hasher.finalize());
        let end = digest.len() - 2;
        digest[end - TOKEN_LEN..end].to_string()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl NonceVerifier for HashNonceVerifier {
    fn create(&self, action: &str, user: &str) -> String {
        self.token_for(self.tick(), action, user)
    }

    fn verify(&self, token: &str, action: &str, user: &str) -> Option<NonceAge> {
        if token.is_empty() {
            return None;
        }
        let tick = self.tick();
        if constant_time_eq(token.as_bytes(), self.token_for(tick, action, user).as_bytes()) {
            return Some(NonceAge::Fresh);
        }
        if constant_time_eq(token.as_bytes(), self.token_for(tick - 1, action, user).as_bytes()) {
            return Some(NonceAge::Aging);
        }
        None
    }
}
