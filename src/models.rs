pub mod auth;
pub mod catalog;
pub mod customer;
pub mod dashboard;
pub mod import;
pub mod order;
pub mod payment;
pub mod reminder;
pub mod returns;
pub mod settings;
pub mod stock;
