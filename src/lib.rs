pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod publish;
pub mod record;
pub mod report;
pub mod runner;
pub mod stats;
