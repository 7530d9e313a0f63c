pub mod config;
pub mod pkce;
pub mod verify;
