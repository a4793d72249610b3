// src/commands/mod.rs
//! Command handlers for the planex CLI

pub mod clone;
pub mod configure;
