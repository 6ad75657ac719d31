//! External service clients.

pub mod automation;
pub mod makecommerce;

pub use automation::AutomationClient;
pub use makecommerce::MakeCommerceClient;
