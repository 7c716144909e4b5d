pub mod audience_service;
pub mod content_service;
pub mod email_service;
pub mod whatsapp_service;

pub use audience_service::AudienceService;
pub use content_service::{ ContentService, ResolvedContent };
pub use email_service::{ ChannelReport, EmailService };
pub use whatsapp_service::WhatsAppService;
