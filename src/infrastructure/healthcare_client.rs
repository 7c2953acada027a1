// HealthcareApiClient - Cloud Healthcare APIクライアント
//
// DICOMストアの内容をCloud Storageバケットへエクスポートする
// dicomStores.export呼び出しを発行する。再試行は行わず、1回のみ試行する。

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use super::config::ExporterConfig;
use crate::domain::{DicomStorePath, GcsDestination};

/// Cloud Healthcare APIのバージョン
const API_VERSION: &str = "v1";

/// リクエストタイムアウト（秒）
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// 接続タイムアウト（秒）
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// エクスポート呼び出しのエラー型
///
/// # エラー種別
/// - `HttpError`: APIのエラーレスポンス
/// - `NetworkError`: ネットワーク接続エラー
/// - `InvalidResponse`: レスポンスボディの解釈失敗
#[derive(Debug, Error)]
pub enum ExportError {
    /// HTTPエラー（ステータスコード付き）
    #[error("Healthcare APIエラー: status={status}, message={message}")]
    HttpError {
        /// HTTPステータスコード
        status: u16,
        /// エラーメッセージ
        message: String,
    },

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    NetworkError(String),

    /// レスポンス解釈エラー
    #[error("レスポンスの解釈に失敗しました: {0}")]
    InvalidResponse(String),
}

/// DICOMストアエクスポート操作トレイト（テスト用の抽象化）
#[async_trait]
pub trait DicomExporter: Send + Sync {
    /// DICOMストアの内容をCloud Storageへエクスポートする
    ///
    /// # 引数
    /// * `store` - エクスポート対象のDICOMストア
    /// * `destination` - エクスポート先のCloud Storageバケット
    ///
    /// # 戻り値
    /// * `Ok(Value)` - APIが返したオペレーションのレスポンスボディ
    /// * `Err(ExportError)` - エラー
    async fn export(
        &self,
        store: &DicomStorePath,
        destination: &GcsDestination,
    ) -> Result<Value, ExportError>;
}

/// Cloud Healthcare APIを使用したエクスポート実装
///
/// `POST {endpoint}/v1/{storeリソース名}:export` を1回発行する。
/// エクスポート自体はサーバー側で非同期に実行されるが、
/// このクライアントはオペレーションの完了を追跡しない。
#[derive(Clone)]
pub struct HealthcareApiClient {
    /// HTTPクライアント
    client: Client,
    /// Healthcare APIのベースURL
    endpoint: String,
    /// Bearerトークン
    access_token: String,
}

impl std::fmt::Debug for HealthcareApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthcareApiClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HealthcareApiClient {
    /// 設定からHealthcareApiClientを作成
    ///
    /// # 引数
    /// * `config` - エクスポーター設定
    ///
    /// # 戻り値
    /// * `HealthcareApiClient` - 初期化されたクライアント
    pub fn new(config: &ExporterConfig) -> Self {
        info!(endpoint = config.endpoint(), "HealthcareApiClientを初期化");

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .expect("HTTPクライアントの構築に失敗");

        Self {
            client,
            endpoint: config.endpoint().to_string(),
            access_token: config.access_token().to_string(),
        }
    }

    /// エクスポートエンドポイントURLを構築
    fn export_url(&self, resource_name: &str) -> String {
        format!(
            "{}/{}/{}:export",
            self.endpoint.trim_end_matches('/'),
            API_VERSION,
            resource_name
        )
    }
}

#[async_trait]
impl DicomExporter for HealthcareApiClient {
    #[instrument(skip(self, store, destination), fields(store = %store.resource_name()))]
    async fn export(
        &self,
        store: &DicomStorePath,
        destination: &GcsDestination,
    ) -> Result<Value, ExportError> {
        let url = self.export_url(&store.resource_name());
        let body = json!({
            "gcsDestination": {
                "uriPrefix": destination.uri()
            }
        });

        debug!(url = %url, "エクスポートリクエストを送信");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "エクスポートリクエスト失敗");
                ExportError::NetworkError(e.to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            // レスポンスボディは長時間実行オペレーションを表すJSON
            let operation: Value = response.json().await.map_err(|e| {
                error!(error = %e, "オペレーションレスポンスの解釈に失敗");
                ExportError::InvalidResponse(e.to_string())
            })?;

            info!(
                store = %store.resource_name(),
                destination = %destination.uri(),
                "DICOMインスタンスをバケットへエクスポート"
            );
            return Ok(operation);
        }

        // エラーレスポンスを処理
        let body = response.text().await.unwrap_or_default();
        error!(
            status = %status,
            body = %body,
            store = %store.resource_name(),
            "エクスポートエラー"
        );

        Err(ExportError::HttpError {
            status: status.as_u16(),
            message: body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ExporterConfig {
        ExporterConfig::new("https://example.com", "test-token", "test-bucket")
    }

    // ==================== ExportError テスト ====================

    #[test]
    fn test_error_display_http_error() {
        let error = ExportError::HttpError {
            status: 403,
            message: "permission denied".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("Healthcare APIエラー"));
        assert!(display.contains("403"));
        assert!(display.contains("permission denied"));
    }

    #[test]
    fn test_error_display_network_error() {
        let error = ExportError::NetworkError("connection refused".to_string());
        let display = error.to_string();
        assert!(display.contains("ネットワークエラー"));
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn test_error_display_invalid_response() {
        let error = ExportError::InvalidResponse("expected value".to_string());
        let display = error.to_string();
        assert!(display.contains("レスポンス"));
        assert!(display.contains("expected value"));
    }

    // ==================== URL構築テスト ====================

    #[test]
    fn test_export_url_without_trailing_slash() {
        let client = HealthcareApiClient::new(&test_config());

        assert_eq!(
            client.export_url("projects/p1/locations/us/datasets/d1/dicomStores/s1"),
            "https://example.com/v1/projects/p1/locations/us/datasets/d1/dicomStores/s1:export"
        );
    }

    #[test]
    fn test_export_url_with_trailing_slash() {
        let config = ExporterConfig::new("https://example.com/", "token", "bucket");
        let client = HealthcareApiClient::new(&config);

        assert_eq!(
            client.export_url("projects/p1/locations/us/datasets/d1/dicomStores/s1"),
            "https://example.com/v1/projects/p1/locations/us/datasets/d1/dicomStores/s1:export"
        );
    }

    // ==================== クライアント作成テスト ====================

    #[test]
    fn test_new_creates_client() {
        let client = HealthcareApiClient::new(&test_config());

        // Debug出力にはエンドポイントのみ含まれ、トークンは含まれない
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("HealthcareApiClient"));
        assert!(debug_str.contains("https://example.com"));
        assert!(!debug_str.contains("test-token"));
    }

    #[test]
    fn test_client_is_clone() {
        let client = HealthcareApiClient::new(&test_config());
        let _cloned = client.clone();
    }

    // ==================== 定数値テスト ====================

    #[test]
    fn test_request_timeout() {
        assert_eq!(REQUEST_TIMEOUT_SECS, 30);
    }

    #[test]
    fn test_connect_timeout() {
        assert_eq!(CONNECT_TIMEOUT_SECS, 10);
    }
}
