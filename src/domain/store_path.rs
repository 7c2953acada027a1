/// DICOMストアリソースパスパーサー
///
/// Pub/Subメッセージで通知されるCloud Healthcare APIのリソースパス
/// （`projects/<p>/locations/<l>/datasets/<d>/dicomStores/<s>`）をパースし、
/// 4つの識別子を抽出する。
use thiserror::Error;

/// リソースパスに必要な最小セグメント数
///
/// `projects/<p>/locations/<l>/datasets/<d>/dicomStores/<s>` で8セグメント。
const MIN_SEGMENTS: usize = 8;

/// リソースパスパースエラー
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorePathError {
    /// パスが空（空白のみを含む）
    #[error("DICOMストアパスが空です")]
    Empty,

    /// セグメント数が不足している
    #[error("DICOMストアパスの形式が不正です: {found}セグメント（最低{MIN_SEGMENTS}セグメント必要）")]
    TooFewSegments {
        /// 実際に見つかったセグメント数
        found: usize,
    },
}

/// DICOMストアの階層リソース識別子
///
/// # フィールド
/// - `project_id`: GCPプロジェクトID（セグメント1）
/// - `location`: リージョン（セグメント3）
/// - `dataset_id`: Healthcare データセットID（セグメント5）
/// - `store_id`: DICOMストアID（セグメント7）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DicomStorePath {
    pub project_id: String,
    pub location: String,
    pub dataset_id: String,
    pub store_id: String,
}

impl DicomStorePath {
    /// スラッシュ区切りのリソースパスをパースする
    ///
    /// セグメント位置1, 3, 5, 7を固定オフセットで抽出する。
    /// セグメントの内容自体は検証しない（セグメント数のみチェック）。
    ///
    /// # 引数
    /// * `path` - リソースパス文字列（前後の空白は呼び出し側でトリム済みであること）
    ///
    /// # 戻り値
    /// * `Ok(DicomStorePath)` - パース成功時
    /// * `Err(StorePathError)` - パスが空、またはセグメント数不足
    ///
    /// # 例
    /// ```
    /// use dicom_exporter::domain::DicomStorePath;
    ///
    /// let path = DicomStorePath::parse(
    ///     "projects/p1/locations/us/datasets/d1/dicomStores/s1",
    /// ).unwrap();
    /// assert_eq!(path.project_id, "p1");
    /// assert_eq!(path.store_id, "s1");
    /// ```
    pub fn parse(path: &str) -> Result<Self, StorePathError> {
        if path.is_empty() {
            return Err(StorePathError::Empty);
        }

        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < MIN_SEGMENTS {
            return Err(StorePathError::TooFewSegments {
                found: segments.len(),
            });
        }

        Ok(Self {
            project_id: segments[1].to_string(),
            location: segments[3].to_string(),
            dataset_id: segments[5].to_string(),
            store_id: segments[7].to_string(),
        })
    }

    /// 親データセットのリソース名を構築
    ///
    /// # 戻り値
    /// `projects/{project_id}/locations/{location}/datasets/{dataset_id}`
    pub fn parent(&self) -> String {
        format!(
            "projects/{}/locations/{}/datasets/{}",
            self.project_id, self.location, self.dataset_id
        )
    }

    /// DICOMストアの完全修飾リソース名を構築
    ///
    /// # 戻り値
    /// `{parent}/dicomStores/{store_id}`
    pub fn resource_name(&self) -> String {
        format!("{}/dicomStores/{}", self.parent(), self.store_id)
    }
}
