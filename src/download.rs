//! 背景差分の結果動画を保存する

use crate::client::map_transport_error;
use crate::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// 衝突時の候補名（0 は元の名前、n ≥ 1 は `out (n).mp4`）
pub fn candidate_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }

    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    match path.extension() {
        Some(ext) => format!("{} ({}).{}", stem, n, ext.to_string_lossy()),
        None => format!("{} ({})", stem, n),
    }
}

/// 既存ファイルを上書きせずに新規作成する
///
/// `create_new` で開き、既に存在すれば次の候補名で再試行する。
pub async fn create_unique(dir: &Path, filename: &str) -> Result<(PathBuf, File)> {
    let mut n = 0;
    loop {
        let path = dir.join(candidate_name(filename, n));
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// レスポンスボディをファイルに書き出す
///
/// 途中で失敗した場合は書きかけのファイルを削除する。
pub async fn save_response(
    response: reqwest::Response,
    dir: &Path,
    filename: &str,
    timeout: Duration,
) -> Result<(PathBuf, u64)> {
    tokio::fs::create_dir_all(dir).await?;
    let (path, file) = create_unique(dir, filename).await?;
    debug!(path = %path.display(), "saving output");

    match write_body(response, file, timeout).await {
        Ok(bytes) => Ok((path, bytes)),
        Err(e) => {
            warn!(path = %path.display(), "removing partial output");
            let _ = tokio::fs::remove_file(&path).await;
            Err(e)
        }
    }
}

async fn write_body(mut response: reqwest::Response, mut file: File, timeout: Duration) -> Result<u64> {
    let mut written: u64 = 0;

    while let Some(chunk) = response.chunk().await.map_err(|e| map_transport_error(e, timeout))? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}
