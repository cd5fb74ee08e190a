pub mod amount;
pub mod auth;
pub mod directory;
pub mod error;
pub mod notice;
pub mod profile;
pub mod route;
