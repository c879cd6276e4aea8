pub mod agent_directory;
pub mod config;
pub mod config_env;
pub mod interrupt;
pub mod models;
pub mod thread;
