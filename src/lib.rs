pub mod config;
pub mod edge;
pub mod error;
pub mod fake_slate;
pub mod history;
pub mod identity;
pub mod ingest;
pub mod merge;
pub mod odds;
pub mod pipeline;
pub mod projection;
pub mod rankings;
pub mod report_export;
pub mod slate;
