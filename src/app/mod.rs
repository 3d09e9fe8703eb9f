pub mod bootstrap;
pub mod cli;
pub mod prompt;
pub mod units;

pub use bootstrap::run;
pub use cli::{help_text, parse_cli_args, CliArgs, UnitSystem};
