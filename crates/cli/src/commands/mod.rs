pub mod bot;
pub mod init;
pub mod send;
pub mod serve;
