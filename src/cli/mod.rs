//! Command-line interface

pub mod commands;

pub use commands::{
    cmd_accounts, cmd_compile, cmd_deploy, cmd_serve, cmd_tally, cmd_vote, CliResult,
};
