//! 命令定义和实现

pub mod config;
pub mod list;
pub mod run;
pub mod validate;

pub use config::ConfigCommand;
pub use run::RunCommand;
pub use validate::ValidateCommand;
