pub mod store;
pub mod email;
pub mod whatsapp;

pub use store::{ NewSendRecord, OutreachStore, RunCompletion };
pub use email::{ CatalogEmail, EmailSender };
pub use whatsapp::{ WhatsAppPayload, WhatsAppRelay };
