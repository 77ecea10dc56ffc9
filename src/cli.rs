//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, TopicArgs};
pub use presentation::{
    format_plan_json, format_plan_text, format_progress_line, format_summary_json,
    format_summary_text, format_topics_json, format_topics_text,
};
pub use route::RunContext;
