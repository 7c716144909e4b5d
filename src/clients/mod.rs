pub mod email_function;
pub mod whatsapp_webhook;

pub use email_function::EmailFunctionClient;
pub use whatsapp_webhook::WebhookRelay;
