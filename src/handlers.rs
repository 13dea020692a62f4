pub mod auth;
pub mod catalog;
pub mod customers;
pub mod imports;
pub mod orders;
pub mod payments;
pub mod reminders;
pub mod reports;
pub mod returns;
pub mod settings;
