//! Subcommands of the `bookshop` binary.

pub mod check;
pub mod run;
