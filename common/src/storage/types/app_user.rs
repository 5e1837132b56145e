use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};
use uuid::Uuid;

/// Credits granted to a freshly registered account.
pub const SIGNUP_CREDITS: i64 = 2;

stored_object!(AppUser, "app_user", {
    email: String,
    stripe_customer_id: Option<String>,
    credits: i64
});

impl AppUser {
    pub fn new(email: String, stripe_customer_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            email,
            stripe_customer_id,
            credits: SIGNUP_CREDITS,
        }
    }

    pub async fn find_by_email(
        db: &SurrealDbClient,
        email: &str,
    ) -> Result<Option<AppUser>, AppError> {
        let user: Option<AppUser> = db
            .client
            .query("SELECT * FROM type::table($table) WHERE email = $email LIMIT 1")
            .bind(("table", Self::table_name()))
            .bind(("email", email.to_string()))
            .await?
            .take(0)?;
        Ok(user)
    }

    pub async fn find_by_stripe_customer(
        db: &SurrealDbClient,
        customer_id: &str,
    ) -> Result<Option<AppUser>, AppError> {
        let user: Option<AppUser> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE stripe_customer_id = $customer_id LIMIT 1",
            )
            .bind(("table", Self::table_name()))
            .bind(("customer_id", customer_id.to_string()))
            .await?
            .take(0)?;
        Ok(user)
    }

    pub async fn add_credits(
        db: &SurrealDbClient,
        user_id: &str,
        amount: i64,
    ) -> Result<AppUser, AppError> {
        let user: Option<AppUser> = db
            .client
            .query(
                "UPDATE type::thing($table, $id) \
                 SET credits += $amount, updated_at = time::now() \
                 RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("id", user_id.to_string()))
            .bind(("amount", amount))
            .await?
            .take(0)?;
        user.ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Atomically spend one credit. Returns `None` when the balance is
    /// already zero, so concurrent spenders cannot drive it negative.
    pub async fn try_spend_credit(
        db: &SurrealDbClient,
        user_id: &str,
    ) -> Result<Option<AppUser>, AppError> {
        let user: Option<AppUser> = db
            .client
            .query(
                "UPDATE type::thing($table, $id) \
                 SET credits -= 1, updated_at = time::now() \
                 WHERE credits > 0 \
                 RETURN AFTER",
            )
            .bind(("table", Self::table_name()))
            .bind(("id", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(user)
    }
}
