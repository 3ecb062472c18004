//! One module per subcommand.

pub mod add;
pub mod get;
pub mod init;
pub mod list;
pub mod password;
pub mod remove;
