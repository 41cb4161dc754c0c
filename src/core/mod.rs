pub mod auth;
pub mod items;
pub mod log;
pub mod password;
