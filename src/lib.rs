//! schemagen library - entity definitions to schema text
//!
//! Compiles a dialect-neutral entity model into relational DDL, SeaORM
//! builder chains, Prisma models and Convex-style document tables, and
//! assembles versioned migrations with rollbacks.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod schema;

#[macro_use]
pub mod test_macros;

#[cfg(test)]
pub mod test_utils;
