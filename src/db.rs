pub mod pool;

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod stock_repo;
pub use stock_repo::StockRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod return_repo;
pub use return_repo::ReturnRepository;
pub mod reminder_repo;
pub use reminder_repo::ReminderRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
