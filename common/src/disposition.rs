//! Content-Disposition ヘッダーからのファイル名抽出
//!
//! 対応するケース:
//! - ヘッダーなし / `filename` パラメータなし → `output.mp4`
//! - `filename="out.mp4"`（引用符あり、`\"` エスケープ可）
//! - `filename=out.mp4`（引用符なし）
//! - 複数パラメータ（`; size=...` など）。引用符内の `;` では区切らない
//! - `filename*=UTF-8''...`（RFC 5987）。`filename` より優先
//! - パラメータ名は大文字小文字を区別しない
//! - ディレクトリ部分は捨てる（`../../x.mp4` → `x.mp4`）

use percent_encoding::percent_decode_str;

/// ファイル名が得られないときのデフォルト
pub const DEFAULT_OUTPUT_FILENAME: &str = "output.mp4";

/// Content-Disposition ヘッダーから保存用ファイル名を決める
///
/// # Examples
/// ```
/// use video_cv_common::filename_from_content_disposition;
///
/// let name = filename_from_content_disposition(Some(r#"attachment; filename="out_knn.mp4""#));
/// assert_eq!(name, "out_knn.mp4");
/// assert_eq!(filename_from_content_disposition(None), "output.mp4");
/// ```
pub fn filename_from_content_disposition(header: Option<&str>) -> String {
    header
        .and_then(parse_filename)
        .unwrap_or_else(|| DEFAULT_OUTPUT_FILENAME.to_string())
}

fn parse_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for segment in split_params(header) {
        let Some((name, value)) = segment.split_once('=') else {
            // disposition-type（attachment / inline）
            continue;
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(unquote(value.trim())),
            "filename*" => extended = decode_ext_value(value.trim()),
            _ => {}
        }
    }

    extended
        .and_then(|v| sanitize(&v))
        .or_else(|| plain.and_then(|v| sanitize(&v)))
}

/// `;` で分割（引用符の内側は分割しない）
fn split_params(header: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in header.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&header[start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"') else {
        return value.trim_matches('"').to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' => break,
            _ => out.push(c),
        }
    }
    out
}

/// RFC 5987 の ext-value（`charset'lang'pct-encoded`）をデコード
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    let bytes: Vec<u8> = percent_decode_str(encoded.trim_matches('"')).collect();
    if charset.eq_ignore_ascii_case("utf-8") {
        String::from_utf8(bytes).ok()
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(bytes.into_iter().map(char::from).collect())
    } else {
        None
    }
}

/// パス区切りを除いた最後の要素だけを使う
fn sanitize(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "" | "." | ".." => None,
        _ => Some(base.to_string()),
    }
}
