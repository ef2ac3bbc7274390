//! ExpirationEditor - 編集画面からの保存処理
//!
//! # フロー
//! 1. `expiration_date_nonce` を検証（無い・不正なら何もせずに終了）
//! 2. `expiration_date` が送られていれば、テキストとして整形してそのまま保存
//!
//! 値は日付として正規化しません（`2024-01-01T09:30` のまま保存）。
//! 読めない値も保存しますが、sweep では一致しません。

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::expiration::parse_expiration;
use crate::domain::{EXPIRATION_META_KEY, ItemId, StoreError};
use crate::ports::{ContentStore, NonceVerifier};

/// Form field carrying the expiration value.
pub const EXPIRATION_FIELD: &str = "expiration_date";

/// Form field carrying the request-forgery token.
pub const NONCE_FIELD: &str = "expiration_date_nonce";

/// Action the token is bound to.
pub const SAVE_ACTION: &str = "save_expiration_date";

/// A submitted edit form.
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    /// Who submitted the form (tokens are per user).
    pub user: String,
    /// Raw form fields.
    pub fields: HashMap<String, String>,
}

impl SaveRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            fields: HashMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Token missing or invalid; nothing written.
    Skipped,
    /// Token valid but no expiration field submitted.
    Unchanged,
    /// The sanitized value was stored.
    Saved(String),
}

pub struct ExpirationEditor {
    store: Arc<dyn ContentStore>,
    nonces: Arc<dyn NonceVerifier>,
}

impl ExpirationEditor {
    pub fn new(store: Arc<dyn ContentStore>, nonces: Arc<dyn NonceVerifier>) -> Self {
        Self { store, nonces }
    }

    /// Token to embed in the edit form for `user`.
    pub fn issue_nonce(&self, user: &str) -> String {
        self.nonces.create(SAVE_ACTION, user)
    }

    /// Current stored value, for pre-filling the form.
    pub async fn field_value(&self, item_id: ItemId) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(item_id)
            .await?
            .and_then(|item| item.expiration()))
    }

    pub async fn save(&self, item_id: ItemId, request: &SaveRequest) -> Result<SaveOutcome, StoreError> {
        let verified = request
            .fields
            .get(NONCE_FIELD)
            .and_then(|token| self.nonces.verify(token, SAVE_ACTION, &request.user));
        if verified.is_none() {
            debug!(%item_id, user = %request.user, "editor: token missing or invalid, skipping save");
            return Ok(SaveOutcome::Skipped);
        }

        let Some(raw) = request.fields.get(EXPIRATION_FIELD) else {
            return Ok(SaveOutcome::Unchanged);
        };

        let value = sanitize_text_field(raw);
        if !value.is_empty() && parse_expiration(&value).is_none() {
            warn!(%item_id, value = %value, "editor: expiration is not a readable date-time and will never match");
        }
        self.store
            .update_meta(item_id, EXPIRATION_META_KEY, json!(value))
            .await?;
        debug!(%item_id, value = %value, "editor: expiration saved");
        Ok(SaveOutcome::Saved(value))
    }
}

/// Clean a single-line text field.
///
/// Drops markup tags (script and style elements with their contents) and
/// percent-encoded octets, turns line breaks and tabs into spaces, collapses
/// whitespace runs and trims. A `<` that does not open a tag is kept.
pub fn sanitize_text_field(raw: &str) -> String {
    let without_tags = strip_tags(raw);
    let without_octets = strip_percent_octets(&without_tags);
    without_octets.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Elements removed together with their contents.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if !opens_tag(tail) {
            out.push('<');
            rest = &tail[1..];
            continue;
        }
        if let Some(end) = raw_text_element_len(tail) {
            rest = &tail[end..];
            continue;
        }
        // an unterminated tag swallows the rest of the value
        rest = match tail.find('>') {
            Some(close) => &tail[close + 1..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}

fn opens_tag(tail: &str) -> bool {
    tail[1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

/// Byte length of a complete script/style element at the start of `tail`.
fn raw_text_element_len(tail: &str) -> Option<usize> {
    let lower = tail.to_ascii_lowercase();
    RAW_TEXT_ELEMENTS.iter().find_map(|name| {
        let after_name = lower.strip_prefix('<')?.strip_prefix(name)?;
        if after_name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            return None;
        }
        let open_end = lower.find('>')?;
        let closing = format!("</{name}>");
        let close_start = open_end + lower[open_end..].find(&closing)?;
        Some(close_start + closing.len())
    })
}

fn strip_percent_octets(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '%'
            && i + 2 < chars.len()
            && chars[i + 1].is_ascii_hexdigit()
            && chars[i + 2].is_ascii_hexdigit()
        {
            i += 3;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentItem, ItemType, PublicationStatus};
    use crate::impls::{HashNonceVerifier, InMemoryContentStore};
    use crate::ports::FixedClock;
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    struct Fixture {
        editor: ExpirationEditor,
        store: Arc<InMemoryContentStore>,
        item: ContentItem,
    }

    async fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 1).unwrap(),
        ));
        let store = Arc::new(InMemoryContentStore::new(clock.clone()));
        let item = store
            .create(ItemType::post(), "Hello", PublicationStatus::Publish)
            .await;
        let nonces = Arc::new(HashNonceVerifier::new("secret", clock, Duration::days(1)));
        Fixture {
            editor: ExpirationEditor::new(store.clone(), nonces),
            store,
            item,
        }
    }

    #[tokio::test]
    async fn valid_token_saves_value_verbatim() {
        let f = fixture().await;
        let request = SaveRequest::new("42")
            .field(NONCE_FIELD, f.editor.issue_nonce("42"))
            .field(EXPIRATION_FIELD, "2024-01-01T09:30");

        let outcome = f.editor.save(f.item.id, &request).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Saved("2024-01-01T09:30".to_string()));
        assert_eq!(
            f.editor.field_value(f.item.id).await.unwrap().as_deref(),
            Some("2024-01-01T09:30")
        );
    }

    #[tokio::test]
    async fn missing_token_skips_silently() {
        let f = fixture().await;
        let request = SaveRequest::new("42").field(EXPIRATION_FIELD, "2024-01-01T09:30");

        assert_eq!(f.editor.save(f.item.id, &request).await.unwrap(), SaveOutcome::Skipped);
        assert_eq!(f.editor.field_value(f.item.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn token_for_another_user_skips() {
        let f = fixture().await;
        let request = SaveRequest::new("42")
            .field(NONCE_FIELD, f.editor.issue_nonce("7"))
            .field(EXPIRATION_FIELD, "2024-01-01T09:30");

        assert_eq!(f.editor.save(f.item.id, &request).await.unwrap(), SaveOutcome::Skipped);
    }

    #[tokio::test]
    async fn absent_field_leaves_existing_value() {
        let f = fixture().await;
        f.store
            .update_meta(f.item.id, EXPIRATION_META_KEY, json!("2030-01-01T00:00"))
            .await
            .unwrap();
        let request = SaveRequest::new("42").field(NONCE_FIELD, f.editor.issue_nonce("42"));

        assert_eq!(f.editor.save(f.item.id, &request).await.unwrap(), SaveOutcome::Unchanged);
        assert_eq!(
            f.editor.field_value(f.item.id).await.unwrap().as_deref(),
            Some("2030-01-01T00:00")
        );
    }

    #[tokio::test]
    async fn empty_field_is_stored_as_empty_text() {
        let f = fixture().await;
        let request = SaveRequest::new("42")
            .field(NONCE_FIELD, f.editor.issue_nonce("42"))
            .field(EXPIRATION_FIELD, "   ");

        assert_eq!(
            f.editor.save(f.item.id, &request).await.unwrap(),
            SaveOutcome::Saved(String::new())
        );
        assert_eq!(f.editor.field_value(f.item.id).await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn unknown_item_is_a_store_error() {
        let f = fixture().await;
        let ghost = ItemId::from_ulid(ulid::Ulid::new());
        let request = SaveRequest::new("42")
            .field(NONCE_FIELD, f.editor.issue_nonce("42"))
            .field(EXPIRATION_FIELD, "2024-01-01T09:30");

        assert!(matches!(
            f.editor.save(ghost, &request).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[rstest]
    #[case::plain("2024-01-01T09:30", "2024-01-01T09:30")]
    #[case::trimmed("  2024-01-01T09:30\n", "2024-01-01T09:30")]
    #[case::tags("<b>2024-01-01</b> 09:30", "2024-01-01 09:30")]
    #[case::script("<script>alert(1)</script>2024", "2024")]
    #[case::style_any_case("<STYLE type=\"text/css\">p{}</Style>2024", "2024")]
    #[case::unclosed_script("<script>alert(1)", "alert(1)")]
    #[case::lookalike_element("<scripts>2024</scripts>", "2024")]
    #[case::lone_less_than("a < b", "a < b")]
    #[case::less_than_digit("1<2 and 3>2", "1<2 and 3>2")]
    #[case::comment("<!-- note -->2024", "2024")]
    #[case::unterminated_tag("2024 <b", "2024")]
    #[case::whitespace_runs("a \t\n b", "a b")]
    #[case::octets("2024%2D01%2d01", "20240101")]
    #[case::lone_percent("100% sure", "100% sure")]
    fn sanitizes_text(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_text_field(raw), expected);
    }
}
