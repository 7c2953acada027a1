/// エクスポートハンドラー
///
/// トリガーイベントからDICOMストアのリソースパスを取り出し、
/// Cloud Storageへのエクスポート呼び出しを1回発行する。
///
/// ペイロードの不備（dataフィールド欠落、デコード失敗、パス形式不正）は
/// すべてエラーログを出力して正常終了する。エクスポート呼び出しの失敗のみ
/// `Err`として呼び出し元に伝播する（エントリポイント側でログ出力して握りつぶす）。
use serde_json::Value;
use tracing::{error, info};

use crate::application::trigger_event::TriggerEvent;
use crate::domain::{DicomStorePath, GcsDestination};
use crate::infrastructure::{DicomExporter, ExportError};

/// ハンドラー処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// エクスポート呼び出しを発行した
    Exported,
    /// ペイロード不備のためエクスポートせずに終了した
    Skipped,
}

/// エクスポートハンドラー
///
/// エクスポート呼び出しは`DicomExporter`トレイトで抽象化されており、
/// テストではモック実装に差し替えられる。
pub struct ExportHandler<E: DicomExporter> {
    exporter: E,
    destination: GcsDestination,
}

impl<E: DicomExporter> ExportHandler<E> {
    /// 新しいハンドラーを作成
    ///
    /// # 引数
    /// * `exporter` - エクスポート呼び出しの実装
    /// * `destination` - エクスポート先のCloud Storageバケット
    pub fn new(exporter: E, destination: GcsDestination) -> Self {
        Self {
            exporter,
            destination,
        }
    }

    /// イベントペイロードを処理する
    ///
    /// # 処理フロー
    /// 1. ペイロードからPub/Subメッセージを取り出す
    /// 2. `data`フィールドをbase64 → UTF-8の順でデコードし、空白をトリム
    /// 3. リソースパスをパースして4つの識別子を抽出
    /// 4. エクスポート呼び出しを1回発行
    ///
    /// # 戻り値
    /// * `Ok(ExportOutcome::Exported)` - エクスポート呼び出し成功
    /// * `Ok(ExportOutcome::Skipped)` - ペイロード不備（ログ出力済み）
    /// * `Err(ExportError)` - エクスポート呼び出し失敗（ログ出力済み）
    pub async fn handle(&self, payload: &Value) -> Result<ExportOutcome, ExportError> {
        let event = match TriggerEvent::from_payload(payload) {
            Ok(event) => event,
            Err(err) => {
                error!(error = %err, "イベントペイロードの解釈に失敗");
                return Ok(ExportOutcome::Skipped);
            }
        };

        let path_text = match event.decoded_path() {
            Ok(text) => text,
            Err(err) => {
                error!(
                    message_id = event.message_id(),
                    error = %err,
                    "メッセージデータのデコードに失敗"
                );
                return Ok(ExportOutcome::Skipped);
            }
        };

        info!(
            message_id = event.message_id(),
            path = %path_text,
            "Pub/Subメッセージを受信"
        );

        let store_path = match DicomStorePath::parse(&path_text) {
            Ok(store_path) => store_path,
            Err(err) => {
                error!(
                    message_id = event.message_id(),
                    path = %path_text,
                    error = %err,
                    "DICOMストアパスのパースに失敗"
                );
                return Ok(ExportOutcome::Skipped);
            }
        };

        self.exporter.export(&store_path, &self.destination).await?;

        info!(
            message_id = event.message_id(),
            store = %store_path.resource_name(),
            destination = %self.destination.uri(),
            "DICOMストアのエクスポートを発行"
        );

        Ok(ExportOutcome::Exported)
    }
}
