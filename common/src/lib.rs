//! video-cv Common Library
//!
//! CLIと対話セッションで共有される型・パーサー・状態遷移（I/Oなし）

pub mod types;
pub mod disposition;
pub mod error;
pub mod state;

pub use types::{
    AnalysisResult, BackendIndex, BackgroundSubtractionOutput, Method, Operation, SelectedFile,
    ShotSummary, SubmissionRequest, Threshold,
    extract_backend_error, parse_backend_index, parse_shot_response,
};
pub use disposition::{filename_from_content_disposition, DEFAULT_OUTPUT_FILENAME};
pub use error::{Error, Result};
pub use state::{user_error_message, Event, Phase, SessionState, NO_FILE_SELECTED};
