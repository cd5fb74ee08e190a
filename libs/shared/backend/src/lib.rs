pub mod client;
pub mod upload;

pub use client::BackendClient;
pub use upload::ImageUpload;
