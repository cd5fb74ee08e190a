pub mod jwt;
pub mod notices;
pub mod test_utils;

pub use jwt::is_token_expired;
pub use notices::Notices;
