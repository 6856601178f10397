//! CLI presentation: text formatters per command family.

mod reports;
mod shared;

pub use reports::{
    format_change_report, format_import_report, format_status_report, format_verify_report,
};
pub use shared::Palette;
