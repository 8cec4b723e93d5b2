//! 結果・状態の表示とスピナー

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use video_cv_common::{AnalysisResult, Operation, SessionState};

/// 送信中に表示するスピナー
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// 解析結果の表示行
pub fn result_lines(result: &AnalysisResult) -> Vec<String> {
    match result {
        AnalysisResult::Shots(summary) => {
            let mut lines = vec![format!("✔ ショット境界: {}件", summary.count)];
            if let Some(video) = &summary.video {
                lines.push(format!("  動画: {}", video));
            }
            if !summary.boundaries.is_empty() {
                let frames = summary
                    .boundaries
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!("  フレーム: {}", frames));
            }
            lines
        }
        AnalysisResult::BackgroundSubtraction(output) => {
            let mut lines = vec![
                format!("✔ {}", output.message),
                format!("  ファイル名: {}", output.filename),
            ];
            if let Some(path) = &output.saved_path {
                lines.push(format!("  保存先: {} ({} bytes)", path.display(), output.bytes));
            }
            lines
        }
    }
}

pub fn print_result(result: &AnalysisResult) {
    for line in result_lines(result) {
        println!("{}", line);
    }
}

/// セッション状態の要約（エラーを結果より優先）
pub fn state_lines(state: &SessionState) -> Vec<String> {
    let mut lines = Vec::new();

    let tabs = Operation::ALL
        .iter()
        .map(|op| {
            if *op == state.active {
                format!("[{}]", op.label())
            } else {
                format!(" {} ", op.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(tabs);

    match &state.file {
        Some(file) => lines.push(format!("  ファイル: {} ({} bytes)", file.name, file.size)),
        None => lines.push("  ファイル: 未選択".to_string()),
    }
    match state.active {
        Operation::ShotDetection => lines.push(format!("  閾値: {}", state.threshold)),
        Operation::BackgroundSubtraction => lines.push(format!("  手法: {}", state.method)),
    }

    if let Some(error) = &state.error {
        lines.push(format!("✖ {}", error));
    } else if let Some(result) = state.result.as_ref().filter(|r| r.operation() == state.active) {
        lines.extend(result_lines(result));
    }
    lines
}
