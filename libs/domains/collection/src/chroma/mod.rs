mod client;
mod config;

pub use client::ChromaRepository;
pub use config::{ChromaConfig, DEFAULT_URL};
