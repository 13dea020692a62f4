// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- Users ---
        handlers::auth::list_users,
        handlers::auth::create_user,

        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::create_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,

        // --- Catalog ---
        handlers::catalog::list_categories,
        handlers::catalog::create_category,
        handlers::catalog::update_category,
        handlers::catalog::delete_category,
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,
        handlers::catalog::adjust_stock,
        handlers::catalog::list_movements,

        // --- Orders & payments ---
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::create_order,
        handlers::payments::list_payments,
        handlers::payments::create_payment,

        // --- Returns ---
        handlers::returns::list_returns,
        handlers::returns::create_return,
        handlers::returns::approve_return,
        handlers::returns::reject_return,

        // --- Import ---
        handlers::imports::import_customers,
        handlers::imports::import_products,

        // --- Reports ---
        handlers::reports::get_dashboard,
        handlers::reports::get_sales_report,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Reminders ---
        handlers::reminders::list_reminders,
        handlers::reminders::update_reminder,
        handlers::reminders::generate_reminders,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::CreateUserPayload,
            models::auth::MessageResponse,

            // --- Customers ---
            models::customer::Customer,
            models::customer::CustomerPayload,

            // --- Catalog ---
            models::catalog::Category,
            models::catalog::CategoryPayload,
            models::catalog::Product,
            models::catalog::CreateProductPayload,
            models::catalog::UpdateProductPayload,
            models::stock::MovementType,
            models::stock::ReferenceType,
            models::stock::StockMovement,
            models::stock::AdjustStockPayload,
            models::stock::ProductMovements,

            // --- Orders & payments ---
            models::order::OrderStatus,
            models::order::Order,
            models::order::OrderItem,
            models::order::OrderDetail,
            models::order::OrderItemPayload,
            models::order::CreateOrderPayload,
            models::order::CreatedOrder,
            models::payment::Payment,
            models::payment::CreatePaymentPayload,
            models::payment::RecordedPayment,

            // --- Returns ---
            models::returns::ReturnStatus,
            models::returns::ProductReturn,
            models::returns::CreateReturnPayload,
            models::returns::ApproveReturnPayload,
            models::returns::RejectReturnPayload,
            models::returns::CreatedReturn,

            // --- Import ---
            models::import::RowError,
            models::import::ImportReport,
            handlers::imports::CsvUpload,

            // --- Reports ---
            models::dashboard::DashboardStats,
            models::dashboard::SalesReportRow,
            models::dashboard::ReportPeriod,

            // --- Reminders ---
            models::reminder::ReminderType,
            models::reminder::ReminderStatus,
            models::reminder::Priority,
            models::reminder::Reminder,
            models::reminder::UpdateReminderPayload,
            models::reminder::GenerationReport,
        )
    ),
    tags(
        (name = "Auth", description = "Login, logout and the current user"),
        (name = "Users", description = "Back-office accounts"),
        (name = "Customers", description = "Customer records and balances"),
        (name = "Catalog", description = "Categories, products and the stock ledger"),
        (name = "Orders", description = "Sales orders"),
        (name = "Payments", description = "Payments against orders"),
        (name = "Returns", description = "Return requests and decisions"),
        (name = "Import", description = "CSV bulk import"),
        (name = "Reports", description = "Dashboard and sales reports"),
        (name = "Settings", description = "Store settings"),
        (name = "Reminders", description = "Operator reminders")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/orders"));
        assert!(doc.paths.paths.contains_key("/api/returns/{id}/approve"));
        assert!(doc.paths.paths.contains_key("/api/import/products"));
        assert!(doc.components.is_some_and(|c| c.security_schemes.contains_key("api_jwt")));
    }
}
