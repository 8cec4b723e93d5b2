use clap::Parser;
use video_cv_client::{cli, client, config, logging, render, session, upload};
use cli::{Cli, Commands};
use client::BackendClient;
use config::Config;
use video_cv_common::{AnalysisResult, Event, Operation, SessionState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    // 壊れた設定ファイルでも `config` コマンドで上書きできるようにする
    let config = match cli.command {
        Commands::Config { .. } => Config::load_or_default(),
        _ => Config::load()?,
    };
    let backend_url = config.resolve_backend_url(cli.backend_url.as_deref());

    match cli.command {
        Commands::Shots { file, threshold, output } => {
            println!("🎞 video-cv - ショット検出\n");
            let client = BackendClient::from_config(&config, &backend_url)?;

            let state = SessionState::new()
                .apply(Event::TabSwitched(Operation::ShotDetection))
                .apply(Event::ThresholdChanged(threshold));
            let result = run_once(&client, state, &file).await;

            if let Some(output) = output {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&output, json)?;
                println!("✔ 結果を保存: {}", output.display());
            }
        }

        Commands::Bgsub { file, method, output_dir } => {
            println!("🎞 video-cv - 背景差分\n");
            let mut client = BackendClient::from_config(&config, &backend_url)?;
            if let Some(dir) = output_dir {
                client = client.with_output_dir(dir);
            }

            let state = SessionState::new()
                .apply(Event::TabSwitched(Operation::BackgroundSubtraction))
                .apply(Event::MethodChanged(method));
            run_once(&client, state, &file).await;
        }

        Commands::Session { output_dir } => {
            let mut client = BackendClient::from_config(&config, &backend_url)?;
            if let Some(dir) = output_dir {
                client = client.with_output_dir(dir);
            }
            session::run_interactive_session(&client).await?;
        }

        Commands::Ping => {
            let client = BackendClient::from_config(&config, &backend_url)?;
            println!("バックエンド: {}", client.base_url());
            match client.index().await {
                Ok(index) => {
                    println!("✔ {}", index.message);
                    for (path, description) in &index.endpoints {
                        println!("  {} - {}", path, description);
                    }
                }
                Err(e) => exit_with(&e.user_message(client.base_url())),
            }
        }

        Commands::Config { set_backend_url, show } => {
            let mut config = config;

            if let Some(url) = set_backend_url {
                config.set_backend_url(url)?;
                println!("✔ バックエンドURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  バックエンドURL: {}", config.backend_url);
                println!("  使用中のURL: {}", config.resolve_backend_url(cli.backend_url.as_deref()));
                println!("  ショット検出タイムアウト: {}s", config.shots_timeout_secs);
                println!("  背景差分タイムアウト: {}s", config.bgsub_timeout_secs);
                println!("  出力先: {}", config.output_dir.display());
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

/// ファイルを選択して1回だけ送信。失敗時は終了コード1で終わる
async fn run_once(
    client: &BackendClient,
    state: SessionState,
    file: &std::path::Path,
) -> AnalysisResult {
    let state = match upload::select_file(file) {
        Ok(file) => state.apply(Event::FileSelected(file)),
        Err(e) => exit_with(&e.user_message(client.base_url())),
    };

    let state = session::submit_with_spinner(client, state).await;
    if let Some(error) = &state.error {
        exit_with(error);
    }

    match state.result {
        Some(result) => {
            render::print_result(&result);
            result
        }
        None => exit_with(&format!("Error: no result. Backend URL: {}", client.base_url())),
    }
}

fn exit_with(message: &str) -> ! {
    eprintln!("✖ {}", message);
    std::process::exit(1);
}
