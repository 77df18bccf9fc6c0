pub mod config;
pub mod init;
pub mod page;
pub mod status;
pub mod web;
