// src/pipeline/mod.rs

pub mod progress;
pub mod prompts;
pub mod readers;
pub mod retry;
pub mod strategy;
pub mod writers;
