//! genesis-init: run `oasis-node` genesis over a directory of unpacked entity packages
//!
//! Layers, innermost first: `domain` (entities, chain parameters, the command
//! line), `application` (the genesis service), `infrastructure` (filesystem and
//! process seams, wiring), `cli` (clap surface and dispatch).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
