pub mod extract;
pub mod fetch_ticket;
pub mod init;
pub mod prompt;
pub mod save;
