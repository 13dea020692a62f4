pub mod auth;
pub mod catalog_service;
pub mod customer_service;
pub mod dashboard_service;
pub mod import_service;
pub mod order_service;
pub mod payment_service;
pub mod reminder_service;
pub mod return_service;
pub mod scheduler;
pub mod settings_service;
