//! 操作・パラメータ・解析結果の型定義
//!
//! CLIと対話セッションで共有される型:
//! - Operation: バックエンドの操作（ショット検出 / 背景差分）
//! - Threshold, Method: 操作ごとのパラメータ
//! - SubmissionRequest: 送信内容（ファイル＋パラメータ）
//! - AnalysisResult: レスポンス形状ごとのタグ付き結果

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// バックエンドの操作（UIのタブに相当）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// ショット境界検出
    #[default]
    #[serde(rename = "shots")]
    ShotDetection,
    /// 背景差分
    #[serde(rename = "bgsub")]
    BackgroundSubtraction,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::ShotDetection, Operation::BackgroundSubtraction];

    /// エンドポイントのパス
    pub fn endpoint(&self) -> &'static str {
        match self {
            Operation::ShotDetection => "/detect_shots",
            Operation::BackgroundSubtraction => "/background_subtraction",
        }
    }

    /// クライアント側のデフォルトタイムアウト
    pub fn default_timeout(&self) -> Duration {
        match self {
            Operation::ShotDetection => Duration::from_secs(60),
            Operation::BackgroundSubtraction => Duration::from_secs(300),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Operation::ShotDetection => "shots",
            Operation::BackgroundSubtraction => "bgsub",
        }
    }

    /// 表示名
    pub fn label(&self) -> &'static str {
        match self {
            Operation::ShotDetection => "Shot Detection",
            Operation::BackgroundSubtraction => "Background Subtraction",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// ショット検出の閾値（0.0-1.0）
///
/// 相関がこの値を下回るフレームをショット境界とみなす（判定はバックエンド側）。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    pub const DEFAULT: f64 = 0.6;

    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidParameter(format!(
                "threshold must be within [0, 1], got {}",
                value
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// multipartフィールド用の文字列
    ///
    /// 入力値をそのまま送る（丸めない）。小数2桁未満なら2桁に揃える（0.6 → "0.60"）。
    pub fn as_form_value(&self) -> String {
        let exact = self.0.to_string();
        let decimals = exact.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0);
        if decimals < 2 {
            format!("{:.2}", self.0)
        } else {
            exact
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Threshold::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(t: Threshold) -> f64 {
        t.0
    }
}

impl FromStr for Threshold {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidParameter(format!("threshold is not a number: {}", s)))?;
        Threshold::new(value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_form_value())
    }
}

/// 背景差分の手法
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    #[default]
    #[serde(rename = "MOG2")]
    Mog2,
    #[serde(rename = "KNN")]
    Knn,
}

impl Method {
    pub const ALL: [Method; 2] = [Method::Mog2, Method::Knn];

    /// multipartフィールドの値
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Mog2 => "MOG2",
            Method::Knn => "KNN",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MOG2" => Ok(Method::Mog2),
            "KNN" => Ok(Method::Knn),
            _ => Err(Error::InvalidParameter(format!(
                "unknown method: {}. Use MOG2 or KNN",
                s
            ))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 選択中の動画ファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// 表示名（multipartのファイル名にも使う）
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self { name, path, size }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// 1回の送信内容
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionRequest {
    ShotDetection { file: SelectedFile, threshold: Threshold },
    BackgroundSubtraction { file: SelectedFile, method: Method },
}

impl SubmissionRequest {
    pub fn operation(&self) -> Operation {
        match self {
            SubmissionRequest::ShotDetection { .. } => Operation::ShotDetection,
            SubmissionRequest::BackgroundSubtraction { .. } => Operation::BackgroundSubtraction,
        }
    }

    pub fn file(&self) -> &SelectedFile {
        match self {
            SubmissionRequest::ShotDetection { file, .. } => file,
            SubmissionRequest::BackgroundSubtraction { file, .. } => file,
        }
    }

    /// ファイル以外のmultipartフィールド（名前, 値）
    pub fn form_field(&self) -> (&'static str, String) {
        match self {
            SubmissionRequest::ShotDetection { threshold, .. } => {
                ("threshold", threshold.as_form_value())
            }
            SubmissionRequest::BackgroundSubtraction { method, .. } => {
                ("method", method.as_str().to_string())
            }
        }
    }
}

/// ショット検出の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotSummary {
    pub count: u64,
    /// ショット境界のフレーム番号（バックエンドの順序のまま）
    pub boundaries: Vec<u64>,
    /// バックエンドが返したファイル名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

/// 背景差分の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundSubtractionOutput {
    pub message: String,
    pub filename: String,
    /// 保存先パス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<PathBuf>,
    #[serde(default)]
    pub bytes: u64,
}

/// 解析結果（レスポンス形状ごとのタグ付きユニオン）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AnalysisResult {
    #[serde(rename = "shots")]
    Shots(ShotSummary),
    #[serde(rename = "bgsub")]
    BackgroundSubtraction(BackgroundSubtractionOutput),
}

impl AnalysisResult {
    pub fn operation(&self) -> Operation {
        match self {
            AnalysisResult::Shots(_) => Operation::ShotDetection,
            AnalysisResult::BackgroundSubtraction(_) => Operation::BackgroundSubtraction,
        }
    }
}

/// /detect_shots のレスポンスボディ
#[derive(Debug, Deserialize)]
struct ShotDetectionResponse {
    count: u64,
    shot_boundaries: Vec<u64>,
    #[serde(default)]
    video: Option<String>,
}

impl From<ShotDetectionResponse> for ShotSummary {
    fn from(r: ShotDetectionResponse) -> Self {
        Self {
            count: r.count,
            boundaries: r.shot_boundaries,
            video: r.video,
        }
    }
}

/// /detect_shots のJSONをパース
///
/// `count` と `shot_boundaries` が必須。境界の昇順は検証しない。
pub fn parse_shot_response(body: &str) -> Result<ShotSummary> {
    let response: ShotDetectionResponse = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("unexpected shot detection response: {}", e)))?;
    Ok(response.into())
}

/// GET / のレスポンス（エンドポイント一覧）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendIndex {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

pub fn parse_backend_index(body: &str) -> Result<BackendIndex> {
    serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("unexpected index response: {}", e)))
}

#[derive(Deserialize)]
struct BackendErrorBody {
    error: String,
}

/// エラーレスポンスの `{"error": "..."}` から詳細を取り出す
pub fn extract_backend_error(body: &str) -> Option<String> {
    serde_json::from_str::<BackendErrorBody>(body)
        .ok()
        .map(|b| b.error.trim().to_string())
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_default() {
        assert_eq!(Threshold::default().value(), 0.6);
        assert_eq!(Threshold::default().as_form_value(), "0.60");
    }

    #[test]
    fn test_threshold_form_value_keeps_precision() {
        for input in ["0.333", "0.005", "0.6", "0.75", "1", "0", "0.123456789"] {
            let t: Threshold = input.parse().unwrap();
            let form = t.as_form_value();
            assert_eq!(form.parse::<f64>().unwrap(), t.value(), "input {}", input);
        }
        assert_eq!(Threshold::new(0.333).unwrap().as_form_value(), "0.333");
        assert_eq!(Threshold::new(1.0).unwrap().as_form_value(), "1.00");
        assert_eq!(Threshold::new(0.0).unwrap().as_form_value(), "0.00");
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(Threshold::new(0.0).is_ok());
        assert!(Threshold::new(1.0).is_ok());
        assert!(Threshold::new(-0.01).is_err());
        assert!(Threshold::new(1.01).is_err());
        assert!(Threshold::new(f64::NAN).is_err());
    }

    #[test]
    fn test_threshold_from_str() {
        let t: Threshold = "0.35".parse().unwrap();
        assert_eq!(t.as_form_value(), "0.35");
        assert!("abc".parse::<Threshold>().is_err());
        assert!("2".parse::<Threshold>().is_err());
    }

    #[test]
    fn test_threshold_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Threshold>("0.8").is_ok());
        assert!(serde_json::from_str::<Threshold>("3.0").is_err());
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("MOG2".parse::<Method>().unwrap(), Method::Mog2);
        assert_eq!("knn".parse::<Method>().unwrap(), Method::Knn);
        assert!("GMG".parse::<Method>().is_err());
        assert_eq!(Method::default(), Method::Mog2);
    }

    #[test]
    fn test_operation_endpoints_and_timeouts() {
        assert_eq!(Operation::ShotDetection.endpoint(), "/detect_shots");
        assert_eq!(Operation::BackgroundSubtraction.endpoint(), "/background_subtraction");
        assert_eq!(Operation::ShotDetection.default_timeout(), Duration::from_secs(60));
        assert_eq!(Operation::BackgroundSubtraction.default_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_selected_file_display_name() {
        let file = SelectedFile::new("/videos/clip 01.mp4", 1024);
        assert_eq!(file.name, "clip 01.mp4");
        assert_eq!(file.size, 1024);
    }

    #[test]
    fn test_submission_form_field() {
        let file = SelectedFile::new("a.mp4", 1);
        let shots = SubmissionRequest::ShotDetection {
            file: file.clone(),
            threshold: Threshold::new(0.6).unwrap(),
        };
        assert_eq!(shots.form_field(), ("threshold", "0.60".to_string()));
        assert_eq!(shots.operation(), Operation::ShotDetection);

        let bgsub = SubmissionRequest::BackgroundSubtraction { file, method: Method::Knn };
        assert_eq!(bgsub.form_field(), ("method", "KNN".to_string()));
        assert_eq!(bgsub.file().name, "a.mp4");
    }

    #[test]
    fn test_parse_shot_response() {
        let summary = parse_shot_response(r#"{"count": 3, "shot_boundaries": [10, 42, 87]}"#).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.boundaries, vec![10, 42, 87]);
        assert_eq!(summary.video, None);
    }

    #[test]
    fn test_parse_shot_response_with_video() {
        let body = r#"{"video": "clip.mp4", "shot_boundaries": [], "count": 0}"#;
        let summary = parse_shot_response(body).unwrap();
        assert_eq!(summary.video.as_deref(), Some("clip.mp4"));
        assert!(summary.boundaries.is_empty());
    }

    #[test]
    fn test_parse_shot_response_malformed() {
        assert!(matches!(parse_shot_response("not json"), Err(Error::Parse(_))));
        assert!(matches!(parse_shot_response(r#"{"count": 3}"#), Err(Error::Parse(_))));
        assert!(matches!(
            parse_shot_response(r#"{"count": 1, "shot_boundaries": [-4]}"#),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_analysis_result_is_tagged() {
        let result = AnalysisResult::Shots(ShotSummary {
            count: 1,
            boundaries: vec![5],
            video: None,
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "shots");
        assert_eq!(json["boundaries"][0], 5);

        let back: AnalysisResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.operation(), Operation::ShotDetection);
    }

    #[test]
    fn test_parse_backend_index() {
        let body = r#"{
            "message": "Computer Vision Flask API",
            "endpoints": {"/detect_shots": "POST a video", "/background_subtraction": "POST a video"}
        }"#;
        let index = parse_backend_index(body).unwrap();
        assert_eq!(index.endpoints.len(), 2);
        assert!(index.endpoints.contains_key("/detect_shots"));
    }

    #[test]
    fn test_extract_backend_error() {
        assert_eq!(
            extract_backend_error(r#"{"error": "Cannot open video"}"#).as_deref(),
            Some("Cannot open video")
        );
        assert_eq!(extract_backend_error("<html>oops</html>"), None);
        assert_eq!(extract_backend_error(r#"{"error": ""}"#), None);
    }
}
