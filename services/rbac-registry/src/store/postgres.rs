//! Postgres-backed implementation of the registry store.
//!
//! # What this module is
//! This module implements [`RegistryStore`] using Postgres (via `sqlx`) as the
//! durable, shared registry of routes, roles, and permission edges.
//!
//! # Key invariants
//! - `routes` is unique on `(method, path, service)`; `roles` is unique on `name`.
//! - `rbac` has a composite primary key and cascading foreign keys into `routes`
//!   and `roles`, so deleting either endpoint removes its edges in the same
//!   statement.
//! - Upserts are a single `INSERT ... ON CONFLICT` statement. Two concurrent
//!   upserts of one natural key are resolved by the unique constraint, never by
//!   a separate existence check.
//!
//! # Concurrency model
//! - The store is shared across async handlers; `sqlx::PgPool` manages concurrency.
//! - Each method is one statement on a pooled connection. There is no
//!   multi-statement transaction and no retry; a failed statement is surfaced
//!   immediately.
//!
//! # Operational notes
//! - Migrations run at startup via `sqlx::migrate!("./migrations")`. The schema
//!   uses `CREATE TABLE IF NOT EXISTS`, so re-running is harmless.
//! - Connection pooling/timeouts are explicitly configured so a dead database
//!   fails requests instead of hanging them.
//!
//! # Security notes
//! - Database URLs may contain credentials; never log them.
//! - All SQL is static with bound parameters.
use super::{RegistryStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{Rbac, Role, Route};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Durable registry store backed by Postgres.
///
/// # Errors
/// - Connection and query failures are surfaced as [`StoreError::Unexpected`].
/// - Unique violations are surfaced as [`StoreError::Conflict`].
/// - Foreign key violations are surfaced as [`StoreError::NotFound`].
///
/// # Example
/// ```rust,no_run
/// use rbac_registry::config::PostgresConfig;
/// use rbac_registry::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the `routes` table.
///
/// DB-facing structs stay separate from the domain types so schema details do
/// not leak into the API model.
#[derive(Debug, Clone, FromRow)]
struct DbRoute {
    id: Uuid,
    method: String,
    path: String,
    service: String,
    active: bool,
}

impl From<DbRoute> for Route {
    fn from(row: DbRoute) -> Self {
        Route {
            id: row.id,
            method: row.method,
            path: row.path,
            service: row.service,
            active: row.active,
        }
    }
}

/// Row shape for the `roles` table.
#[derive(Debug, Clone, FromRow)]
struct DbRole {
    id: Uuid,
    name: String,
}

impl From<DbRole> for Role {
    fn from(row: DbRole) -> Self {
        Role {
            id: row.id,
            name: row.name,
        }
    }
}

/// Row shape for the `rbac` table.
#[derive(Debug, Clone, FromRow)]
struct DbRbac {
    route_id: Uuid,
    role_id: Uuid,
}

impl PostgresStore {
    /// Connect to Postgres and apply the embedded migrations.
    ///
    /// # Errors
    /// - Connection, migration, or pool setup failures.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        // Avoid logging `pg.url`: it may carry credentials.
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;

        // Handlers assume the schema exists, so a migration failure fails startup.
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RegistryStore for PostgresStore {
    async fn route_exists(&self, id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM routes WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn role_exists(&self, id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn add_route(&self, route: Route) -> StoreResult<Route> {
        // On a natural-key conflict only `active` is overwritten; `id` is left
        // alone so the stored ID wins and existing edges keep pointing at it.
        let row = sqlx::query_as::<_, DbRoute>(
            "INSERT INTO routes (id, method, path, service, active) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (method, path, service) DO UPDATE SET active = EXCLUDED.active \
             RETURNING id, method, path, service, active",
        )
        .bind(route.id)
        .bind(&route.method)
        .bind(&route.path)
        .bind(&route.service)
        .bind(route.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "route"))?;
        Ok(row.into())
    }

    async fn update_route(&self, route: Route) -> StoreResult<Route> {
        let row = sqlx::query_as::<_, DbRoute>(
            "UPDATE routes SET method = $2, path = $3, service = $4, active = $5 \
             WHERE id = $1 \
             RETURNING id, method, path, service, active",
        )
        .bind(route.id)
        .bind(&route.method)
        .bind(&route.path)
        .bind(&route.service)
        .bind(route.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "route"))?;
        row.map(Route::from)
            .ok_or_else(|| StoreError::NotFound("route".into()))
    }

    async fn find_routes(&self) -> StoreResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, DbRoute>(
            "SELECT id, method, path, service, active FROM routes \
             ORDER BY path, method, service",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn find_routes_by_role(&self, role_id: Uuid) -> StoreResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, DbRoute>(
            "SELECT routes.id, routes.method, routes.path, routes.service, routes.active \
             FROM routes \
             INNER JOIN rbac ON routes.id = rbac.route_id \
             WHERE rbac.role_id = $1 \
             ORDER BY routes.path, routes.method, routes.service",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn find_routes_by_service(&self, service: &str) -> StoreResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, DbRoute>(
            "SELECT id, method, path, service, active FROM routes \
             WHERE service = $1 \
             ORDER BY path, method",
        )
        .bind(service)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn set_routes_inactive(&self, service: &str) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE routes SET active = false WHERE service = $1")
            .bind(service)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_route(&self, id: Uuid) -> StoreResult<()> {
        // `rbac` rows go with it via ON DELETE CASCADE.
        sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_role(&self, role: Role) -> StoreResult<Role> {
        // The no-op update makes RETURNING yield the stored row on a name clash.
        let row = sqlx::query_as::<_, DbRole>(
            "INSERT INTO roles (id, name) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id, name",
        )
        .bind(role.id)
        .bind(&role.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "role"))?;
        Ok(row.into())
    }

    async fn update_role(&self, role: Role) -> StoreResult<Role> {
        let row = sqlx::query_as::<_, DbRole>(
            "UPDATE roles SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(role.id)
        .bind(&role.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "role"))?;
        row.map(Role::from)
            .ok_or_else(|| StoreError::NotFound("role".into()))
    }

    async fn find_roles(&self) -> StoreResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, DbRole>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn find_roles_by_route(&self, route_id: Uuid) -> StoreResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, DbRole>(
            "SELECT roles.id, roles.name \
             FROM roles \
             INNER JOIN rbac ON roles.id = rbac.role_id \
             WHERE rbac.route_id = $1 \
             ORDER BY roles.name",
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn delete_role(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_rbac(&self, edge: Rbac) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO rbac (route_id, role_id) VALUES ($1, $2) \
             ON CONFLICT (route_id, role_id) DO NOTHING",
        )
        .bind(edge.route_id)
        .bind(edge.role_id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "rbac endpoint"))?;
        Ok(())
    }

    async fn delete_rbac(&self, edge: Rbac) -> StoreResult<()> {
        sqlx::query("DELETE FROM rbac WHERE route_id = $1 AND role_id = $2")
            .bind(edge.route_id)
            .bind(edge.role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_all_rbac(&self) -> StoreResult<Vec<Rbac>> {
        let rows = sqlx::query_as::<_, DbRbac>(
            "SELECT route_id, role_id FROM rbac ORDER BY route_id, role_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| Rbac {
                route_id: row.route_id,
                role_id: row.role_id,
            })
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn db_error_code(err: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code.into_owned());
    }
    None
}

fn map_write_error(err: sqlx::Error, entity: &str) -> StoreError {
    match db_error_code(&err).as_deref() {
        Some(UNIQUE_VIOLATION) => StoreError::Conflict(format!("{entity} exists")),
        Some(FOREIGN_KEY_VIOLATION) => StoreError::NotFound(entity.to_string()),
        _ => StoreError::Unexpected(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_unexpected() {
        // Only SQLSTATE codes may turn into Conflict/NotFound.
        let err = map_write_error(sqlx::Error::RowNotFound, "route");
        assert!(matches!(err, StoreError::Unexpected(_)));
        assert!(db_error_code(&sqlx::Error::PoolTimedOut).is_none());
    }

    #[test]
    fn route_rows_map_every_column() {
        let id = Uuid::new_v4();
        let route: Route = DbRoute {
            id,
            method: "GET".to_string(),
            path: "/users".to_string(),
            service: "svc".to_string(),
            active: false,
        }
        .into();
        assert_eq!(route.id, id);
        assert_eq!(route.method, "GET");
        assert_eq!(route.path, "/users");
        assert_eq!(route.service, "svc");
        assert!(!route.active);
    }

    #[test]
    fn role_rows_map_every_column() {
        let id = Uuid::new_v4();
        let role: Role = DbRole {
            id,
            name: "admin".to_string(),
        }
        .into();
        assert_eq!(role.id, id);
        assert_eq!(role.name, "admin");
    }
}
