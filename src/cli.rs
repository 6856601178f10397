//! CLI domain: parse, route, output, and presentation only.
//! No database logic; the route table dispatches to `HashDatabase`.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_change_report, format_import_report, format_status_report, format_verify_report,
    Palette,
};
pub use route::RunContext;
