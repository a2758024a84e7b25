pub mod aggregate;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod producer;
pub mod source;
