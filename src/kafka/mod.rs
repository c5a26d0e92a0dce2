pub mod config;
pub mod consumer;
pub mod key;
pub mod message;
