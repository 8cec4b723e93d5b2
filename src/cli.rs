use clap::{Parser, Subcommand};
use std::path::PathBuf;
use video_cv_common::{Method, Threshold};

#[derive(Parser)]
#[command(name = "video-cv")]
#[command(about = "動画解析バックエンド（ショット検出・背景差分）のクライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドURL（環境変数・設定ファイルより優先）
    #[arg(long, global = true)]
    pub backend_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ショット境界を検出
    Shots {
        /// 動画ファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 閾値（0.0-1.0、相関がこれを下回るとショット境界）
        #[arg(short, long, default_value = "0.6", value_parser = parse_threshold)]
        threshold: Threshold,

        /// 結果JSONの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 背景差分を実行して結果動画を保存
    Bgsub {
        /// 動画ファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 手法 (MOG2/KNN)
        #[arg(short, long, default_value = "MOG2", value_parser = parse_method)]
        method: Method,

        /// 保存先ディレクトリ（省略時は設定ファイルの output_dir）
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// 対話モード（タブ切替・ファイル選択・送信）
    Session {
        /// 保存先ディレクトリ
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// バックエンドの疎通確認
    Ping,

    /// 設定を表示/編集
    Config {
        /// バックエンドURLを設定
        #[arg(long)]
        set_backend_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

fn parse_threshold(s: &str) -> Result<Threshold, String> {
    s.parse().map_err(|e: video_cv_common::Error| e.to_string())
}

fn parse_method(s: &str) -> Result<Method, String> {
    s.parse().map_err(|e: video_cv_common::Error| e.to_string())
}
