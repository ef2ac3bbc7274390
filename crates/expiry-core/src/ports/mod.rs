//! Ports - 抽象化レイヤー
//!
//! ホスト側のサービス（content store, recurring scheduler, 時計, token 検証）
//! への入口を trait として定義し、実装の詳細を隠蔽します。
//! sweeper はこれらを注入されて動くだけで、特定のホストには依存しません。

pub mod clock;
pub mod content_store;
pub mod id_generator;
pub mod nonce;
pub mod scheduler;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::content_store::ContentStore;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::nonce::{NonceAge, NonceVerifier};
pub use self::scheduler::{Recurrence, Scheduler};
