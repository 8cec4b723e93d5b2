//! バックエンドAPIクライアント
//!
//! - POST /detect_shots: multipart (`file`, `threshold`) → JSON
//! - POST /background_subtraction: multipart (`file`, `method`) → 動画ファイル
//! - GET /: エンドポイント一覧
//!
//! タイムアウトは操作ごとにリクエスト単位で設定し、超過時は接続を破棄する。

use crate::config::{normalize_base_url, Config};
use crate::download;
use crate::error::{ClientError, Result};
use crate::upload;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::Form;
use reqwest::Response;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use video_cv_common::{
    extract_backend_error, filename_from_content_disposition, parse_backend_index,
    parse_shot_response, AnalysisResult, BackendIndex, BackgroundSubtractionOutput, Method,
    Operation, SelectedFile, ShotSummary, SubmissionRequest, Threshold,
};

/// 背景差分完了時のメッセージ
pub const BGSUB_COMPLETED_MESSAGE: &str = "Background subtraction completed and downloaded";

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    shots_timeout: Duration,
    bgsub_timeout: Duration,
    output_dir: PathBuf,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("video-cv/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
            shots_timeout: Operation::ShotDetection.default_timeout(),
            bgsub_timeout: Operation::BackgroundSubtraction.default_timeout(),
            output_dir: PathBuf::from("."),
        })
    }

    pub fn from_config(config: &Config, base_url: &str) -> Result<Self> {
        Ok(Self::new(base_url)?
            .with_timeout(Operation::ShotDetection, config.timeout_for(Operation::ShotDetection))
            .with_timeout(
                Operation::BackgroundSubtraction,
                config.timeout_for(Operation::BackgroundSubtraction),
            )
            .with_output_dir(config.output_dir.clone()))
    }

    pub fn with_timeout(mut self, operation: Operation, timeout: Duration) -> Self {
        match operation {
            Operation::ShotDetection => self.shots_timeout = timeout,
            Operation::BackgroundSubtraction => self.bgsub_timeout = timeout,
        }
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    pub fn timeout(&self, operation: Operation) -> Duration {
        match operation {
            Operation::ShotDetection => self.shots_timeout,
            Operation::BackgroundSubtraction => self.bgsub_timeout,
        }
    }

    pub fn endpoint_url(&self, operation: Operation) -> String {
        format!("{}{}", self.base_url, operation.endpoint())
    }

    /// 送信内容に応じて操作を実行
    pub async fn submit(&self, request: &SubmissionRequest) -> Result<AnalysisResult> {
        match request {
            SubmissionRequest::ShotDetection { file, threshold } => self
                .detect_shots(file, *threshold)
                .await
                .map(AnalysisResult::Shots),
            SubmissionRequest::BackgroundSubtraction { file, method } => self
                .background_subtraction(file, *method)
                .await
                .map(AnalysisResult::BackgroundSubtraction),
        }
    }

    /// ショット境界検出
    pub async fn detect_shots(&self, file: &SelectedFile, threshold: Threshold) -> Result<ShotSummary> {
        let operation = Operation::ShotDetection;
        let timeout = self.timeout(operation);
        let form = Form::new()
            .part("file", upload::file_part(file).await?)
            .text("threshold", threshold.as_form_value());

        info!(file = %file.name, %threshold, "submitting shot detection");
        let response = self.post_form(operation, form).await?;

        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;
        let summary = parse_shot_response(&body)?;

        info!(count = summary.count, "shot detection finished");
        if summary.count as usize != summary.boundaries.len() {
            warn!(
                count = summary.count,
                boundaries = summary.boundaries.len(),
                "count does not match number of boundaries"
            );
        }
        Ok(summary)
    }

    /// 背景差分（結果動画を output_dir に保存）
    pub async fn background_subtraction(
        &self,
        file: &SelectedFile,
        method: Method,
    ) -> Result<BackgroundSubtractionOutput> {
        let operation = Operation::BackgroundSubtraction;
        let timeout = self.timeout(operation);
        let form = Form::new()
            .part("file", upload::file_part(file).await?)
            .text("method", method.as_str());

        info!(file = %file.name, %method, "submitting background subtraction");
        let response = self.post_form(operation, form).await?;

        let header = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok());
        debug!(content_disposition = ?header, "response headers");
        let filename = filename_from_content_disposition(header);

        let (saved_path, bytes) =
            download::save_response(response, &self.output_dir, &filename, timeout).await?;
        info!(path = %saved_path.display(), bytes, "background subtraction saved");

        Ok(BackgroundSubtractionOutput {
            message: BGSUB_COMPLETED_MESSAGE.to_string(),
            filename,
            saved_path: Some(saved_path),
            bytes,
        })
    }

    /// GET / （疎通確認・エンドポイント一覧）
    pub async fn index(&self) -> Result<BackendIndex> {
        let timeout = self.shots_timeout;
        let url = format!("{}/", self.base_url);
        debug!(%url, "fetching backend index");

        let response = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;
        let response = ensure_success(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;
        Ok(parse_backend_index(&body)?)
    }

    async fn post_form(&self, operation: Operation, form: Form) -> Result<Response> {
        let url = self.endpoint_url(operation);
        let timeout = self.timeout(operation);
        debug!(%url, ?timeout, "POST");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        ensure_success(response).await
    }
}

/// 2xx以外を ClientError::Server に変換
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let reason = status.canonical_reason().unwrap_or("Unknown Status").to_string();
    let body = response.text().await.unwrap_or_default();
    let detail = extract_backend_error(&body);
    warn!(status = status.as_u16(), %reason, ?detail, "backend returned error status");

    Err(ClientError::Server {
        status: status.as_u16(),
        reason,
        detail,
    })
}

/// reqwest のエラーを分類
pub(crate) fn map_transport_error(e: reqwest::Error, timeout: Duration) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout(timeout)
    } else if e.is_decode() {
        ClientError::Parse(e.to_string())
    } else {
        ClientError::Network(e.to_string())
    }
}
