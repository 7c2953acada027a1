// エクスポーター設定
//
// Cloud Healthcare APIへの接続設定とエクスポート先バケットを管理

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::export_destination::DEFAULT_URI_PREFIX;
use crate::domain::GcsDestination;

/// Cloud Healthcare APIのデフォルトエンドポイント
const DEFAULT_ENDPOINT: &str = "https://healthcare.googleapis.com";

/// GCEメタデータサーバーのアクセストークン取得URL
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// メタデータサーバーへのリクエストタイムアウト（秒）
const METADATA_TIMEOUT_SECS: u64 = 5;

/// エクスポーター設定エラー
#[derive(Debug, Error)]
pub enum ExporterConfigError {
    /// アクセストークンが取得できない
    #[error("アクセストークンが取得できません: {0}")]
    MissingToken(String),

    /// メタデータサーバーからのトークン取得に失敗
    #[error("メタデータサーバーからのトークン取得に失敗しました: {0}")]
    MetadataError(String),
}

/// メタデータサーバーのトークンレスポンス
#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// エクスポーターの設定
///
/// # フィールド
/// - `endpoint`: Cloud Healthcare APIのベースURL
/// - `access_token`: APIへのBearerトークン
/// - `uri_prefix`: エクスポート先のCloud Storageバケット名
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    endpoint: String,
    access_token: String,
    uri_prefix: String,
}

impl ExporterConfig {
    /// 新しい設定を作成
    ///
    /// # 引数
    /// - `endpoint`: Cloud Healthcare APIのベースURL
    /// - `access_token`: APIへのBearerトークン
    /// - `uri_prefix`: エクスポート先バケット名
    pub fn new(
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
        uri_prefix: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: access_token.into(),
            uri_prefix: uri_prefix.into(),
        }
    }

    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数
    /// - `GOOGLE_ACCESS_TOKEN`: APIへのBearerトークン（必須）
    /// - `HEALTHCARE_API_ENDPOINT`: APIのベースURL（省略時はデフォルト）
    /// - `EXPORT_URI_PREFIX`: エクスポート先バケット名（省略時は組み込みのバケット名）
    ///
    /// # 戻り値
    /// - `Ok(ExporterConfig)`: 設定が正常に読み込まれた
    /// - `Err(ExporterConfigError::MissingToken)`: トークンが設定されていない
    pub fn from_env() -> Result<Self, ExporterConfigError> {
        let access_token = std::env::var("GOOGLE_ACCESS_TOKEN").map_err(|_| {
            ExporterConfigError::MissingToken(
                "環境変数GOOGLE_ACCESS_TOKENが設定されていません".to_string(),
            )
        })?;

        Ok(Self {
            endpoint: Self::endpoint_from_env(),
            access_token,
            uri_prefix: Self::uri_prefix_from_env(),
        })
    }

    /// 環境変数から設定を読み込み（トークンはメタデータサーバーから取得）
    ///
    /// `GOOGLE_ACCESS_TOKEN`が設定されていればそれを使用し、
    /// 未設定の場合はGCEメタデータサーバーからアクセストークンを取得する。
    /// 初期化時に一度だけ呼び出されることを想定している。
    ///
    /// # 戻り値
    /// - `Ok(ExporterConfig)`: 設定が正常に読み込まれた
    /// - `Err(ExporterConfigError::MetadataError)`: トークン取得失敗
    pub async fn from_env_with_metadata() -> Result<Self, ExporterConfigError> {
        if let Ok(config) = Self::from_env() {
            debug!("環境変数からアクセストークンを取得");
            return Ok(config);
        }

        info!("メタデータサーバーからアクセストークンを取得");
        let access_token = Self::fetch_metadata_token(METADATA_TOKEN_URL).await?;

        Ok(Self {
            endpoint: Self::endpoint_from_env(),
            access_token,
            uri_prefix: Self::uri_prefix_from_env(),
        })
    }

    /// メタデータサーバーからアクセストークンを取得
    async fn fetch_metadata_token(url: &str) -> Result<String, ExporterConfigError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(METADATA_TIMEOUT_SECS))
            .build()
            .map_err(|e| ExporterConfigError::MetadataError(e.to_string()))?;

        let response = client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ExporterConfigError::MetadataError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExporterConfigError::MetadataError(format!(
                "status={}",
                response.status()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| ExporterConfigError::MetadataError(e.to_string()))?;

        Ok(token.access_token)
    }

    /// エンドポイントURLを環境変数から取得（省略時はデフォルト）
    fn endpoint_from_env() -> String {
        std::env::var("HEALTHCARE_API_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string())
    }

    /// エクスポート先バケット名を環境変数から取得（省略時は組み込みのバケット名）
    fn uri_prefix_from_env() -> String {
        std::env::var("EXPORT_URI_PREFIX").unwrap_or_else(|_| DEFAULT_URI_PREFIX.to_string())
    }

    /// エンドポイントURLを取得
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// アクセストークンを取得
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// エクスポート先を構築
    pub fn destination(&self) -> GcsDestination {
        GcsDestination::new(&self.uri_prefix)
    }
}
