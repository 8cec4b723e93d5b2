//! セッション状態と状態遷移
//!
//! 画面全体の状態を1つの構造体で持ち、遷移は `(状態, イベント) → 状態` の
//! 純粋関数として表す。描画層（CLI/対話セッション）はこれを読むだけ。

use crate::types::{AnalysisResult, Method, Operation, SelectedFile, SubmissionRequest, Threshold};

/// ファイル未選択時のメッセージ
pub const NO_FILE_SELECTED: &str = "no file selected";

/// ユーザー向けのエラー文言（バックエンドURLを含める）
pub fn user_error_message(message: &str, backend_url: &str) -> String {
    format!("Error: {}. Backend URL: {}", message, backend_url)
}

/// 送信フェーズ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
}

/// セッション状態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub active: Operation,
    pub file: Option<SelectedFile>,
    pub threshold: Threshold,
    pub method: Method,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
    pub phase: Phase,
    /// エラー文言に含めるバックエンドURL
    pub backend_url: String,
}

/// 状態遷移イベント
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    FileSelected(SelectedFile),
    ThresholdChanged(Threshold),
    MethodChanged(Method),
    TabSwitched(Operation),
    SubmitRequested,
    Succeeded(AnalysisResult),
    Failed(String),
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend_url(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_url = backend_url.into();
        self
    }

    /// イベントを適用して次の状態を返す
    pub fn apply(mut self, event: Event) -> Self {
        match event {
            Event::FileSelected(file) => {
                self.file = Some(file);
                self.result = None;
                self.error = None;
            }
            Event::ThresholdChanged(threshold) => self.threshold = threshold,
            Event::MethodChanged(method) => self.method = method,
            Event::TabSwitched(operation) => {
                if operation != self.active {
                    self.active = operation;
                    self.result = None;
                    self.error = None;
                }
            }
            // 送信中の再送信は無視（先行リクエストはキャンセルしない）
            Event::SubmitRequested if self.phase == Phase::Submitting => {}
            Event::SubmitRequested => {
                if self.file.is_none() {
                    self.error = Some(user_error_message(NO_FILE_SELECTED, &self.backend_url));
                } else {
                    self.phase = Phase::Submitting;
                    self.error = None;
                }
            }
            Event::Succeeded(result) => {
                self.phase = Phase::Idle;
                self.result = Some(result);
                self.error = None;
            }
            Event::Failed(message) => {
                self.phase = Phase::Idle;
                self.error = Some(message);
            }
        }
        self
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Submitting
    }

    /// 送信ボタンを押せるか
    pub fn can_submit(&self) -> bool {
        self.file.is_some() && !self.is_loading()
    }

    /// アクティブなタブの送信内容（ファイル未選択なら None）
    pub fn request(&self) -> Option<SubmissionRequest> {
        let file = self.file.clone()?;
        Some(match self.active {
            Operation::ShotDetection => SubmissionRequest::ShotDetection {
                file,
                threshold: self.threshold,
            },
            Operation::BackgroundSubtraction => SubmissionRequest::BackgroundSubtraction {
                file,
                method: self.method,
            },
        })
    }
}
