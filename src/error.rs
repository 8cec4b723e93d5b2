use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("request timed out after {}", format_duration(.0))]
    Timeout(Duration),

    #[error("Server error: {status} {reason}{}", format_detail(.detail))]
    Server {
        status: u16,
        reason: String,
        detail: Option<String>,
    },

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// ユーザー向けの1行メッセージ（バックエンドURLを含める）
    pub fn user_message(&self, backend_url: &str) -> String {
        video_cv_common::user_error_message(&self.to_string(), backend_url)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }
}

impl From<video_cv_common::Error> for ClientError {
    fn from(e: video_cv_common::Error) -> Self {
        match e {
            video_cv_common::Error::InvalidParameter(msg) => ClientError::Validation(msg),
            other => ClientError::Parse(other.to_string()),
        }
    }
}

fn format_duration(d: &Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

fn format_detail(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ClientError>;
