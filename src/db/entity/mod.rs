pub mod schedule;
pub mod lead;
pub mod schedule_lead;
pub mod static_page;
pub mod property;
pub mod whatsapp_send;

pub use schedule::Entity as Schedule;
pub use lead::Entity as Lead;
pub use schedule_lead::Entity as ScheduleLead;
pub use static_page::Entity as StaticPage;
pub use property::Entity as Property;
pub use whatsapp_send::Entity as WhatsappSend;
