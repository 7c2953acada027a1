/// エクスポート先Cloud Storageバケット
///
/// DICOMストアのエクスポート先となる `gs://` URIプレフィックスを表す。

/// デフォルトのエクスポート先バケット名（環境変数で差し替え可能）
pub const DEFAULT_URI_PREFIX: &str = "da-test-dicom";

/// Cloud Storageエクスポート先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsDestination {
    uri_prefix: String,
}

impl GcsDestination {
    /// バケット名からエクスポート先を作成
    ///
    /// # 引数
    /// * `uri_prefix` - バケット名（`gs://` スキームは含めない）
    pub fn new(uri_prefix: impl Into<String>) -> Self {
        Self {
            uri_prefix: uri_prefix.into(),
        }
    }

    /// バケット名を取得
    pub fn uri_prefix(&self) -> &str {
        &self.uri_prefix
    }

    /// エクスポートリクエストボディに埋め込む完全なURIを構築
    ///
    /// # 戻り値
    /// `gs://{uri_prefix}` 形式のURI
    pub fn uri(&self) -> String {
        format!("gs://{}", self.uri_prefix)
    }
}

impl Default for GcsDestination {
    fn default() -> Self {
        Self::new(DEFAULT_URI_PREFIX)
    }
}
