pub mod config;
pub mod context;
pub mod logging;
pub mod save_dir;
pub mod tool_paths;
