//! Profile repository.
//!
//! Team members have no profile of their own; every lookup resolves the
//! parent account first.

use async_trait::async_trait;
use sqlx::PgPool;
use tigerleads_core::{Role, UserId, UserProfile};

use crate::{DbError, DbResult};

/// Joined view of a user and whichever profile row it has.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProfileRow {
    user_id: i64,
    role: Option<String>,
    has_contractor: bool,
    has_supplier: bool,
    contractor_states: Option<Vec<String>>,
    contractor_counties: Option<Vec<String>>,
    contractor_trades: Option<Vec<String>>,
    supplier_states: Option<Vec<String>>,
    supplier_counties: Option<Vec<String>>,
    supplier_trades: Option<Vec<String>>,
}

impl ProfileRow {
    /// A stored contractor/supplier role wins; any other role (admins,
    /// blank) is inferred from the profile row present.
    fn role(&self) -> Option<Role> {
        if let Some(role) = self.role.as_deref().and_then(|r| r.parse::<Role>().ok()) {
            return Some(role);
        }
        match (self.has_contractor, self.has_supplier) {
            (true, _) => Some(Role::Contractor),
            (false, true) => Some(Role::Supplier),
            (false, false) => None,
        }
    }

    fn into_profile(self) -> Option<UserProfile> {
        let role = self.role()?;
        let (present, states, counties, trades) = match role {
            Role::Contractor => (
                self.has_contractor,
                self.contractor_states,
                self.contractor_counties,
                self.contractor_trades,
            ),
            Role::Supplier => (
                self.has_supplier,
                self.supplier_states,
                self.supplier_counties,
                self.supplier_trades,
            ),
        };
        if !present {
            return None;
        }
        Some(UserProfile {
            user_id: UserId::new(self.user_id),
            role,
            states: states.unwrap_or_default(),
            counties: counties.unwrap_or_default(),
            trade_types: trades.unwrap_or_default(),
        })
    }
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    /// The account whose profile and exclusions apply to `user_id`.
    async fn effective_user(&self, user_id: UserId) -> DbResult<UserId>;

    /// Profile of the effective account, or `None` if it has no contractor
    /// or supplier row for its role.
    async fn get_profile(&self, user_id: UserId) -> DbResult<Option<UserProfile>>;
}

/// PostgreSQL implementation of ProfileRepo.
pub struct PgProfileRepo {
    pool: PgPool,
}

impl PgProfileRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepo for PgProfileRepo {
    async fn effective_user(&self, user_id: UserId) -> DbResult<UserId> {
        let id: i64 =
            sqlx::query_scalar("SELECT COALESCE(parent_user_id, id) FROM users WHERE id = $1")
                .bind(user_id.get())
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::NotFound(format!("user {}", user_id)))?;
        Ok(UserId::new(id))
    }

    async fn get_profile(&self, user_id: UserId) -> DbResult<Option<UserProfile>> {
        let effective = self.effective_user(user_id).await?;
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT u.id AS user_id,
                   u.role,
                   c.id IS NOT NULL AS has_contractor,
                   s.id IS NOT NULL AS has_supplier,
                   array_remove(c.state, NULL) AS contractor_states,
                   array_remove(c.country_city, NULL) AS contractor_counties,
                   array_remove(c.user_type, NULL) AS contractor_trades,
                   array_remove(s.service_states, NULL) AS supplier_states,
                   array_remove(s.country_city, NULL) AS supplier_counties,
                   array_remove(s.user_type, NULL) AS supplier_trades
            FROM users u
            LEFT JOIN contractors c ON c.user_id = u.id
            LEFT JOIN suppliers s ON s.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(effective.get())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("user {}", effective)))?;

        Ok(row.into_profile())
    }
}
