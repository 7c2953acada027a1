/// トリガーイベントパーサー
///
/// 関数を起動するイベントペイロードからPub/Subメッセージを取り出し、
/// base64エンコードされた`data`フィールドをテキストにデコードする。
/// ペイロードはpushエンベロープ形式（`{"message": {...}}`）と
/// メッセージ単体形式（`{"data": ...}`）の両方を受け付ける。
use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// トリガーイベントパースエラー
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TriggerEventError {
    /// ペイロードがPub/Subメッセージとして解釈できない
    #[error("イベントペイロードの形式が不正です: {0}")]
    InvalidPayload(String),

    /// `data`フィールドが存在しない
    #[error("メッセージに'data'フィールドがありません")]
    MissingData,

    /// base64デコードに失敗
    #[error("base64デコードに失敗しました: {0}")]
    InvalidBase64(String),

    /// UTF-8デコードに失敗
    #[error("UTF-8デコードに失敗しました: {0}")]
    InvalidUtf8(String),
}

/// 関数を起動したPub/Subメッセージ
///
/// # フィールド
/// - `data`: base64エンコードされたメッセージ本文（DICOMストアのリソースパス）
/// - `message_id`: Pub/SubのメッセージID（ログ用）
/// - `attributes`: メッセージ属性（ログ用）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerEvent {
    data: Option<String>,
    #[serde(rename = "messageId", alias = "message_id")]
    message_id: Option<String>,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

impl TriggerEvent {
    /// イベントペイロードからメッセージを取り出す
    ///
    /// pushエンベロープ形式の場合は`message`オブジェクトを、
    /// それ以外はペイロード自体をメッセージとして解釈する。
    ///
    /// # 引数
    /// * `payload` - Lambdaイベントのペイロード
    ///
    /// # 戻り値
    /// * `Ok(TriggerEvent)` - 解釈成功時
    /// * `Err(TriggerEventError::InvalidPayload)` - メッセージとして解釈できない
    pub fn from_payload(payload: &Value) -> Result<Self, TriggerEventError> {
        let message = payload.get("message").unwrap_or(payload);

        serde_json::from_value(message.clone())
            .map_err(|e| TriggerEventError::InvalidPayload(e.to_string()))
    }

    /// メッセージID（ログ用）
    pub fn message_id(&self) -> &str {
        self.message_id.as_deref().unwrap_or("unknown")
    }

    /// メッセージ属性（ログ用）
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// `data`フィールドをデコードしてリソースパス文字列を取り出す
    ///
    /// base64デコード、UTF-8デコードの順で変換し、前後の空白をトリムする。
    ///
    /// # 戻り値
    /// * `Ok(String)` - トリム済みのデコード結果（空文字列の可能性あり）
    /// * `Err(TriggerEventError)` - `data`欠落、またはデコード失敗
    pub fn decoded_path(&self) -> Result<String, TriggerEventError> {
        let data = self.data.as_deref().ok_or(TriggerEventError::MissingData)?;

        let bytes = STANDARD
            .decode(data)
            .map_err(|e| TriggerEventError::InvalidBase64(e.to_string()))?;

        let text =
            String::from_utf8(bytes).map_err(|e| TriggerEventError::InvalidUtf8(e.to_string()))?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(text: &str) -> String {
        STANDARD.encode(text)
    }

    // ==================== from_payload テスト ====================

    #[test]
    fn test_from_payload_bare_message() {
        let payload = json!({"data": encode("hello")});

        let event = TriggerEvent::from_payload(&payload).unwrap();

        assert_eq!(event.decoded_path().unwrap(), "hello");
    }

    #[test]
    fn test_from_payload_push_envelope() {
        let payload = json!({
            "message": {
                "data": encode("hello"),
                "messageId": "1234567890",
                "attributes": {"eventType": "export"}
            },
            "subscription": "projects/p1/subscriptions/sub1"
        });

        let event = TriggerEvent::from_payload(&payload).unwrap();

        assert_eq!(event.decoded_path().unwrap(), "hello");
        assert_eq!(event.message_id(), "1234567890");
        assert_eq!(
            event.attributes().get("eventType").map(String::as_str),
            Some("export")
        );
    }

    #[test]
    fn test_from_payload_missing_message_id() {
        let payload = json!({"data": encode("hello")});

        let event = TriggerEvent::from_payload(&payload).unwrap();

        assert_eq!(event.message_id(), "unknown");
    }

    #[test]
    fn test_from_payload_not_an_object() {
        let payload = json!("just a string");

        let result = TriggerEvent::from_payload(&payload);

        assert!(matches!(result, Err(TriggerEventError::InvalidPayload(_))));
    }

    // ==================== decoded_path テスト ====================

    #[test]
    fn test_decoded_path_trims_whitespace() {
        let payload = json!({"data": encode("  projects/p1/x  \n")});

        let event = TriggerEvent::from_payload(&payload).unwrap();

        assert_eq!(event.decoded_path().unwrap(), "projects/p1/x");
    }

    #[test]
    fn test_decoded_path_whitespace_only_becomes_empty() {
        let payload = json!({"data": encode("   \n\t  ")});

        let event = TriggerEvent::from_payload(&payload).unwrap();

        assert_eq!(event.decoded_path().unwrap(), "");
    }

    #[test]
    fn test_decoded_path_missing_data() {
        let payload = json!({"messageId": "123"});

        let event = TriggerEvent::from_payload(&payload).unwrap();

        assert_eq!(event.decoded_path(), Err(TriggerEventError::MissingData));
    }

    #[test]
    fn test_decoded_path_invalid_base64() {
        let payload = json!({"data": "!!not-base64!!"});

        let event = TriggerEvent::from_payload(&payload).unwrap();

        assert!(matches!(
            event.decoded_path(),
            Err(TriggerEventError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_decoded_path_invalid_utf8() {
        // 0xFF, 0xFEは有効なUTF-8シーケンスではない
        let payload = json!({"data": STANDARD.encode([0xFF, 0xFE, 0xFD])});

        let event = TriggerEvent::from_payload(&payload).unwrap();

        assert!(matches!(
            event.decoded_path(),
            Err(TriggerEventError::InvalidUtf8(_))
        ));
    }

    // ==================== TriggerEventError テスト ====================

    #[test]
    fn test_error_display() {
        let error = TriggerEventError::MissingData;
        assert!(error.to_string().contains("data"));

        let error = TriggerEventError::InvalidBase64("bad symbol".to_string());
        assert!(error.to_string().contains("base64"));
        assert!(error.to_string().contains("bad symbol"));
    }
}
