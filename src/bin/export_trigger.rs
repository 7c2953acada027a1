/// DICOMストアエクスポートトリガー関数
///
/// Pub/Subメッセージで通知されたDICOMストアのリソースパスをパースし、
/// Cloud Healthcare APIのdicomStores.exportを1回呼び出して
/// ストアの内容をCloud Storageバケットへエクスポートする。
///
/// ペイロード不備・エクスポート失敗のいずれもログに記録して正常終了し、
/// イベントソースへはエラーを返さない（再試行はトリガーしない）。
use dicom_exporter::application::{ExportHandler, ExportOutcome};
use dicom_exporter::infrastructure::{init_logging, ExporterConfig, HealthcareApiClient};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// ExportHandlerの静的インスタンス
///
/// warm start時にHTTPクライアントとアクセストークンを再利用するため、
/// 一度初期化したハンドラーを静的に保持する。
/// トークンをメタデータサーバーから取得するため初期化は非同期。
static EXPORT_HANDLER: OnceCell<ExportHandler<HealthcareApiClient>> = OnceCell::const_new();

/// ExportHandlerを取得（初期化されていなければ初期化）
///
/// # 戻り値
/// * `Ok(&'static ExportHandler<HealthcareApiClient>)` - 静的参照へのハンドラー
/// * `Err(ExporterConfigError)` - 設定読み込みエラー
async fn get_export_handler() -> Result<
    &'static ExportHandler<HealthcareApiClient>,
    dicom_exporter::infrastructure::ExporterConfigError,
> {
    EXPORT_HANDLER
        .get_or_try_init(|| async {
            let config = ExporterConfig::from_env_with_metadata().await?;
            let client = HealthcareApiClient::new(&config);
            Ok(ExportHandler::new(client, config.destination()))
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // Lambda関数を初期化して実行
    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. エクスポーター設定を読み込み（warm start時はキャッシュを再利用）
/// 2. ExportHandlerでペイロードを処理
/// 3. 処理結果をログに記録
///
/// エクスポート失敗を含むすべてのエラーはログ出力のみで、
/// 呼び出し元には常に正常レスポンスを返す。
async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let request_id = event.context.request_id.clone();

    info!(request_id = %request_id, "トリガーイベントを受信");

    // エクスポーター設定を読み込み
    let export_handler = match get_export_handler().await {
        Ok(handler) => handler,
        Err(err) => {
            error!(
                request_id = %request_id,
                error = %err,
                "エクスポーター設定読み込み失敗"
            );
            return Ok(serde_json::json!({
                "statusCode": 500,
                "body": "Internal server error"
            }));
        }
    };

    match export_handler.handle(&event.payload).await {
        Ok(ExportOutcome::Exported) => {
            info!(request_id = %request_id, "エクスポート処理完了");
            Ok(serde_json::json!({
                "statusCode": 200,
                "body": "Export accepted"
            }))
        }
        Ok(ExportOutcome::Skipped) => {
            // ペイロード不備の詳細はハンドラー内でログ出力済み
            info!(request_id = %request_id, "エクスポートをスキップ");
            Ok(serde_json::json!({
                "statusCode": 200,
                "body": "Message skipped"
            }))
        }
        Err(err) => {
            // エラー時はログ出力のみ（イベントソースへはエラーを返さない）
            error!(
                request_id = %request_id,
                error = %err,
                "エクスポート処理エラー"
            );
            Ok(serde_json::json!({
                "statusCode": 200,
                "body": "Export error"
            }))
        }
    }
}
