pub mod callback;
pub mod gateway;
pub mod redirect;
