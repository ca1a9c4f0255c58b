pub mod commands;
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{
    CliOptions, build_config, expand_path, init_tracing, prompt_credentials, resolve_credentials,
    run,
};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
