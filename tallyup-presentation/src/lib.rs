#![warn(clippy::uninlined_format_args)]

pub mod error_presenter;
pub mod settlement_presenter;
pub mod text_table;

pub use error_presenter::{format_ledger_parse_error, format_processing_error};
pub use settlement_presenter::{SettlementPresenter, SettlementView};
