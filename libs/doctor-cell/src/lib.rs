pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use services::chatbot::{ChatSession, ChatbotService};
pub use services::directory::DirectoryService;
