pub mod chatbot;
pub mod directory;
