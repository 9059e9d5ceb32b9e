pub mod base;
pub mod init;
pub mod render;
