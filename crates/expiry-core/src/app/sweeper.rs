//! ExpirationSweeper - 期限切れ item を draft に戻す
//!
//! # フロー
//! 1. Clock から現在時刻を取り、サイトのローカル時刻 `Y-m-d H:i:s` に正規化
//! 2. ContentStore::query() で `_expiration_date <= now`（DATETIME 比較）の item を全件取得
//! 3. 各 item の status を draft にし、`_expired = true` を書く
//!
//! `_expired` は書くだけで query の条件には使いません。公開に戻された
//! 期限切れ item は次の sweep でまた draft になります。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::app::hooks::HookHandler;
use crate::app::status::SweepReport;
use crate::domain::expiration::{normalize, site_local};
use crate::domain::{
    Compare, EXPIRATION_META_KEY, EXPIRED_META_KEY, ExpiryError, ItemId, ItemQuery, ItemType,
    MetaClause, MetaType, PublicationStatus, StoreError,
};
use crate::ports::{Clock, ContentStore};

/// ExpirationSweeper は一回の sweep を実行する
///
/// 排他制御はしません。同時に一つだけ走ることは dispatch 側が保証します。
pub struct ExpirationSweeper {
    store: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
    item_type: ItemType,
    utc_offset: FixedOffset,
}

impl ExpirationSweeper {
    pub fn new(store: Arc<dyn ContentStore>, clock: Arc<dyn Clock>, item_type: ItemType) -> Self {
        Self {
            store,
            clock,
            item_type,
            utc_offset: Utc.fix(),
        }
    }

    /// Site-local offset used to render "now".
    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    pub fn item_type(&self) -> &ItemType {
        &self.item_type
    }

    /// Query for items of the swept type expiring at or before `now`.
    pub fn expired_query(&self, now: &str) -> ItemQuery {
        ItemQuery::new(self.item_type.clone()).with_meta(MetaClause::new(
            EXPIRATION_META_KEY,
            Compare::Le,
            now,
            MetaType::DateTime,
        ))
    }

    /// Run one sweep.
    ///
    /// Only the query error is returned. A failed write is logged and the
    /// sweep moves on to the next item.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let now = normalize(site_local(self.clock.now(), self.utc_offset));
        let expired = self.store.query(&self.expired_query(&now)).await?;

        let mut report = SweepReport {
            now,
            matched: expired.len(),
            ..SweepReport::default()
        };
        info!(
            item_type = %self.item_type,
            now = %report.now,
            matched = report.matched,
            "sweep: start"
        );

        for item in &expired {
            match self.expire(item.id).await {
                Ok(()) => {
                    debug!(item_id = %item.id, previous = %item.status, "sweep: drafted");
                    report.drafted += 1;
                }
                Err(e) => {
                    warn!(item_id = %item.id, error = %e, "sweep: failed to expire item");
                    report.failed += 1;
                }
            }
        }

        info!(
            drafted = report.drafted,
            failed = report.failed,
            "sweep: done"
        );
        Ok(report)
    }

    async fn expire(&self, id: ItemId) -> Result<(), StoreError> {
        self.store
            .update_status(id, PublicationStatus::Draft)
            .await?;
        self.store
            .update_meta(id, EXPIRED_META_KEY, json!(true))
            .await
    }
}

#[async_trait]
impl HookHandler for ExpirationSweeper {
    async fn fire(&self) -> Result<(), ExpiryError> {
        self.sweep().await?;
        Ok(())
    }
}
