// src/services/customer_service.rs

use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customer::{Customer, CustomerFilter, CustomerPayload},
};

#[derive(Clone)]
pub struct CustomerService {
    pool: SqlitePool,
    customer_repo: CustomerRepository,
}

impl CustomerService {
    pub fn new(pool: SqlitePool, customer_repo: CustomerRepository) -> Self {
        Self { pool, customer_repo }
    }

    pub async fn list(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, AppError> {
        self.customer_repo.list(&self.pool, filter).await
    }

    pub async fn get(&self, id: i64) -> Result<Customer, AppError> {
        self.customer_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Customer"))
    }

    pub async fn create(&self, payload: &CustomerPayload) -> Result<Customer, AppError> {
        let customer = self.customer_repo.create(&self.pool, payload).await?;
        tracing::info!(customer_id = customer.id, "customer created");
        Ok(customer)
    }

    pub async fn update(&self, id: i64, payload: &CustomerPayload) -> Result<Customer, AppError> {
        self.customer_repo
            .update(&self.pool, id, payload)
            .await?
            .ok_or(AppError::NotFound("Customer"))
    }

    /// Soft delete; order history keeps pointing at the row.
    pub async fn deactivate(&self, id: i64) -> Result<(), AppError> {
        if !self.customer_repo.deactivate(&self.pool, id).await? {
            return Err(AppError::NotFound("Customer"));
        }
        tracing::info!(customer_id = id, "customer deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_customer, test_state};

    #[tokio::test]
    async fn search_matches_name_phone_and_email() {
        let state = test_state().await;
        let service = &state.customer_service;
        seed_customer(&state, "Alice Martin").await;
        service
            .create(&CustomerPayload {
                name: "Bob".into(),
                phone: "777-1234".into(),
                email: Some("bob@example.com".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let by_name = service
            .list(&CustomerFilter { search: Some("alice".into()), active: None })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);

        let by_email = service
            .list(&CustomerFilter { search: Some("bob@".into()), active: None })
            .await
            .unwrap();
        assert_eq!(by_email[0].name, "Bob");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let state = test_state().await;
        let payload = CustomerPayload {
            name: "Carol".into(),
            phone: "1".into(),
            email: Some("carol@example.com".into()),
            ..Default::default()
        };
        state.customer_service.create(&payload).await.unwrap();
        assert!(matches!(
            state.customer_service.create(&payload).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn deactivate_is_soft() {
        let state = test_state().await;
        let customer = seed_customer(&state, "Dave").await;

        state.customer_service.deactivate(customer.id).await.unwrap();
        let reloaded = state.customer_service.get(customer.id).await.unwrap();
        assert!(!reloaded.active);

        assert!(matches!(
            state.customer_service.deactivate(9999).await,
            Err(AppError::NotFound(_))
        ));
    }
}
