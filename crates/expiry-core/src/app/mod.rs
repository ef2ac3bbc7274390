//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **ExpirationSweeper**: 期限切れ item を draft に戻す
//! - **ensure_scheduled**: sweep hook の recurring 登録（冪等）
//! - **Dispatcher**: due になった hook を実行するループ
//! - **ExpirationEditor**: 編集画面からの期限保存

pub mod builder;
pub mod dispatch;
pub mod editor;
pub mod hooks;
pub mod setup;
pub mod status;
pub mod sweeper;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::dispatch::{DispatchHandle, Dispatcher};
pub use self::editor::{ExpirationEditor, SaveOutcome, SaveRequest};
pub use self::hooks::{HookHandler, HookRegistry};
pub use self::setup::{EXPIRATION_HOOK, SetupOutcome, ensure_scheduled};
pub use self::status::{SweepReport, TickReport};
pub use self::sweeper::ExpirationSweeper;
