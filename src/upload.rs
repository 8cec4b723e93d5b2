//! アップロードするファイルの選択とmultipartパートの生成

use crate::error::{ClientError, Result};
use reqwest::multipart::Part;
use std::path::Path;
use video_cv_common::SelectedFile;

/// パスを検証して SelectedFile にする
pub fn select_file(path: &Path) -> Result<SelectedFile> {
    let meta = std::fs::metadata(path)
        .map_err(|_| ClientError::Validation(format!("file not found: {}", path.display())))?;
    if !meta.is_file() {
        return Err(ClientError::Validation(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    Ok(SelectedFile::new(path, meta.len()))
}

/// 拡張子からContent-Typeを推定
pub fn guess_video_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mpg" | "mpeg" => "video/mpeg",
        _ => "application/octet-stream",
    }
}

/// ファイルをストリームで送るmultipartパート
pub async fn file_part(file: &SelectedFile) -> Result<Part> {
    let handle = tokio::fs::File::open(&file.path).await?;
    let length = handle.metadata().await?.len();

    Part::stream_with_length(reqwest::Body::from(handle), length)
        .file_name(file.name.clone())
        .mime_str(guess_video_mime(&file.path))
        .map_err(|e| ClientError::Validation(e.to_string()))
}
