//! セッション送信と対話モード
//!
//! `submit` は SessionState を受け取り、送信→結果/エラーの遷移まで行う。
//! 失敗はすべてバックエンドURL付きの1行メッセージに変換して状態に入れる。

use crate::client::BackendClient;
use crate::error::{ClientError, Result};
use crate::render;
use crate::upload::select_file;
use dialoguer::{Input, Select};
use std::path::PathBuf;
use tracing::{debug, warn};
use video_cv_common::{Event, Method, Operation, SessionState, Threshold, NO_FILE_SELECTED};

/// アクティブなタブの内容で送信し、次の状態を返す
///
/// ファイル未選択ならネットワークに触れずに Failed にする。
/// 送信中の状態で呼ばれた場合は何もしない。
pub async fn submit(client: &BackendClient, state: SessionState) -> SessionState {
    if state.is_loading() {
        debug!("submit ignored: request already in flight");
        return state;
    }

    // ファイル未選択の検証は状態遷移側で行う
    let state = state
        .with_backend_url(client.base_url())
        .apply(Event::SubmitRequested);
    let Some(request) = state.request().filter(|_| state.is_loading()) else {
        warn!("submit rejected: {}", NO_FILE_SELECTED);
        return state;
    };

    match client.submit(&request).await {
        Ok(result) => state.apply(Event::Succeeded(result)),
        Err(e) => {
            warn!(operation = request.operation().tag(), error = %e, "submission failed");
            state.apply(Event::Failed(e.user_message(client.base_url())))
        }
    }
}

/// 送信しつつスピナーを表示
pub async fn submit_with_spinner(client: &BackendClient, state: SessionState) -> SessionState {
    let operation = state.active;
    let pb = render::spinner(format!(
        "{} を実行中... (timeout {}s)",
        operation.label(),
        client.timeout(operation).as_secs()
    ));
    let next = submit(client, state).await;
    pb.finish_and_clear();
    next
}

/// 対話アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// ファイルを選択
    SelectFile,
    /// タブを切り替え
    SwitchTab(Operation),
    /// 閾値を変更
    EditThreshold,
    /// 手法を変更
    EditMethod,
    /// 送信
    Submit,
    /// 終了
    Quit,
}

impl SessionAction {
    fn label(&self) -> String {
        match self {
            SessionAction::SelectFile => "ファイルを選択".into(),
            SessionAction::SwitchTab(op) => format!("タブ切替 → {}", op.label()),
            SessionAction::EditThreshold => "閾値を変更".into(),
            SessionAction::EditMethod => "手法を変更".into(),
            SessionAction::Submit => "送信".into(),
            SessionAction::Quit => "終了".into(),
        }
    }
}

/// 現在の状態で選べるアクション
pub fn available_actions(state: &SessionState) -> Vec<SessionAction> {
    let other = match state.active {
        Operation::ShotDetection => Operation::BackgroundSubtraction,
        Operation::BackgroundSubtraction => Operation::ShotDetection,
    };
    let edit = match state.active {
        Operation::ShotDetection => SessionAction::EditThreshold,
        Operation::BackgroundSubtraction => SessionAction::EditMethod,
    };

    let mut actions = vec![SessionAction::SelectFile, edit, SessionAction::SwitchTab(other)];
    if state.can_submit() {
        actions.insert(0, SessionAction::Submit);
    }
    actions.push(SessionAction::Quit);
    actions
}

/// 対話式セッション
pub async fn run_interactive_session(client: &BackendClient) -> Result<()> {
    println!("🎬 video-cv - 対話モード");
    println!("  バックエンド: {}", client.base_url());
    println!("  出力先: {}", client.output_dir().display());
    println!("---");

    let mut state = SessionState::new().with_backend_url(client.base_url());

    loop {
        println!();
        for line in render::state_lines(&state) {
            println!("{}", line);
        }

        let actions = available_actions(&state);
        let labels: Vec<String> = actions.iter().map(SessionAction::label).collect();
        let choice = Select::new()
            .with_prompt("操作")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(|e| ClientError::Prompt(e.to_string()))?;

        state = match actions[choice] {
            SessionAction::SelectFile => {
                let input: String = Input::new()
                    .with_prompt("動画ファイルのパス")
                    .interact_text()
                    .map_err(|e| ClientError::Prompt(e.to_string()))?;
                match select_file(&PathBuf::from(input.trim())) {
                    Ok(file) => state.apply(Event::FileSelected(file)),
                    Err(e) => state.apply(Event::Failed(e.user_message(client.base_url()))),
                }
            }
            SessionAction::SwitchTab(op) => state.apply(Event::TabSwitched(op)),
            SessionAction::EditThreshold => {
                let threshold = prompt_threshold(state.threshold)?;
                state.apply(Event::ThresholdChanged(threshold))
            }
            SessionAction::EditMethod => {
                let method = prompt_method(state.method)?;
                state.apply(Event::MethodChanged(method))
            }
            SessionAction::Submit => submit_with_spinner(client, state).await,
            SessionAction::Quit => break,
        };
    }

    println!("終了します");
    Ok(())
}

fn prompt_threshold(current: Threshold) -> Result<Threshold> {
    let input: String = Input::new()
        .with_prompt("閾値 (0.0-1.0)")
        .with_initial_text(current.to_string())
        .validate_with(|s: &String| -> std::result::Result<(), String> {
            s.parse::<Threshold>().map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(|e| ClientError::Prompt(e.to_string()))?;

    Ok(input.parse::<Threshold>()?)
}

fn prompt_method(current: Method) -> Result<Method> {
    let labels: Vec<&str> = Method::ALL.iter().map(Method::as_str).collect();
    let default = Method::ALL.iter().position(|m| *m == current).unwrap_or(0);
    let choice = Select::new()
        .with_prompt("手法")
        .items(&labels)
        .default(default)
        .interact()
        .map_err(|e| ClientError::Prompt(e.to_string()))?;
    Ok(Method::ALL[choice])
}
