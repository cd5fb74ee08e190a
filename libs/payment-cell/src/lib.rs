pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use services::callback::PaymentCallbackHandler;
pub use services::gateway::PaymentService;
pub use services::redirect::{AutoSubmitForm, GatewayRedirect};
