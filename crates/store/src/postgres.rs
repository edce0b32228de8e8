//! Postgres-backed store implementation.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `AlreadyExists` | Duplicate email/principal/token, second grant of a kind |
//! | Database (foreign key violation) | `23503` | `NotFound` | Insert referencing a missing user or workspace |
//! | Database (other) | Any other | `Backend` | Check violations, serialization failures |
//! | RowNotFound | N/A | `NotFound` | Single-row read found nothing |
//! | PoolClosed / other | N/A | `Backend` | Connection failures, closed pool |
//!
//! Guarded updates (`WHERE status = 'pending'`, `WHERE principal_id IS
//! NULL`) that match zero rows become `Conflict` when the row exists and
//! `NotFound` when it does not; those guards are the concurrency arbiters
//! for accept, revoke, and principal linking.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crewgate_access::Role;
use crewgate_core::{AccessError, EmailAddress, InternalUserId, InviteId, PrincipalId, WorkspaceId};

use crate::error::StoreError;
use crate::records::{
    AcceptGrant, AdminGrantRecord, CreateInviteParams, CreateUserParams, CreateWorkspaceParams,
    InviteRecord, InviteStatus, MemberRecord, StaffGrantRecord, UserGrants, UserRecord,
    WorkspaceRecord,
};
use crate::store::AccessStore;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const DIRECT_OPERATOR_ROLE: &str = "platform_operator";

/// Postgres implementation of [`AccessStore`].
///
/// All uniqueness rules live in the schema; this code only translates
/// constraint violations into [`StoreError`] values.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run pending migrations.
    #[instrument(skip(url))]
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;

        Ok(Self::new(pool))
    }

    /// Distinguish "row exists but the guard refused" from "no such row"
    /// after a guarded update matched nothing.
    async fn guard_outcome(&self, table: &str, id: Uuid) -> StoreError {
        let query = format!("SELECT 1 AS present FROM {table} WHERE id = $1");
        match sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(_)) => StoreError::Conflict,
            Ok(None) => StoreError::NotFound,
            Err(e) => map_sqlx_error("guard_outcome", e),
        }
    }
}

#[async_trait::async_trait]
impl AccessStore for PostgresStore {
    // ───────────────────────────── Users ─────────────────────────────

    #[instrument(skip(self, params), err)]
    async fn create_user(&self, params: &CreateUserParams) -> Result<UserRecord, StoreError> {
        let record = UserRecord {
            id: InternalUserId::new(),
            principal_id: params.principal_id.clone(),
            email: params.email.clone(),
            direct_operator: params.direct_operator,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, principal_id, email, direct_role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.principal_id.as_ref().map(|p| p.as_str()))
        .bind(record.email.as_str())
        .bind(record.direct_operator.then_some(DIRECT_OPERATOR_ROLE))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        Ok(record)
    }

    async fn user_by_principal(&self, principal: &PrincipalId) -> Result<UserRecord, StoreError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, principal_id, email, direct_role, created_at
            FROM users
            WHERE principal_id = $1
            "#,
        )
        .bind(principal.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_principal", e))?
        .ok_or(StoreError::NotFound)
    }

    async fn user_by_email(&self, email: &EmailAddress) -> Result<UserRecord, StoreError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, principal_id, email, direct_role, created_at
            FROM users
            WHERE lower(email) = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_email", e))?
        .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self, principal), fields(user_id = %user_id), err)]
    async fn link_principal(
        &self,
        user_id: InternalUserId,
        principal: &PrincipalId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET principal_id = $2
            WHERE id = $1 AND principal_id IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(principal.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("link_principal", e))?;

        if result.rows_affected() == 0 {
            return Err(self.guard_outcome("users", *user_id.as_uuid()).await);
        }
        Ok(())
    }

    // ───────────────────────────── Workspaces ─────────────────────────────

    #[instrument(skip(self, params), fields(owner_id = %params.owner_id), err)]
    async fn create_workspace(
        &self,
        params: &CreateWorkspaceParams,
    ) -> Result<WorkspaceRecord, StoreError> {
        let record = WorkspaceRecord {
            id: WorkspaceId::new(),
            name: params.name.clone(),
            owner_id: params.owner_id,
            created_at: Utc::now(),
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_workspace", e))?;

        sqlx::query(
            r#"
            INSERT INTO workspaces (id, name, owner_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.name)
        .bind(record.owner_id.as_uuid())
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_workspace", e))?;

        sqlx::query(
            r#"
            INSERT INTO admin_grants (id, user_id, workspace_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(record.owner_id.as_uuid())
        .bind(record.id.as_uuid())
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_workspace", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_workspace", e))?;
        Ok(record)
    }

    async fn workspace_by_id(
        &self,
        workspace_id: WorkspaceId,
    ) -> Result<WorkspaceRecord, StoreError> {
        sqlx::query_as::<_, WorkspaceRecord>(
            r#"
            SELECT id, name, owner_id, created_at
            FROM workspaces
            WHERE id = $1
            "#,
        )
        .bind(workspace_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("workspace_by_id", e))?
        .ok_or(StoreError::NotFound)
    }

    // ───────────────────────────── Grants ─────────────────────────────

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn grants_for_user(&self, user_id: InternalUserId) -> Result<UserGrants, StoreError> {
        let admin = sqlx::query_as::<_, AdminGrantRecord>(
            r#"
            SELECT user_id, workspace_id, created_at
            FROM admin_grants
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("grants_for_user", e))?;

        let staff = sqlx::query_as::<_, StaffGrantRecord>(
            r#"
            SELECT user_id, workspace_id, created_at
            FROM staff_grants
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("grants_for_user", e))?;

        Ok(UserGrants { admin, staff })
    }

    async fn workspace_members(
        &self,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<MemberRecord>, StoreError> {
        sqlx::query_as::<_, MemberRecord>(
            r#"
            SELECT u.id AS user_id, u.email, 'workspace_admin' AS role, g.created_at AS member_since
            FROM admin_grants g
            JOIN users u ON u.id = g.user_id
            WHERE g.workspace_id = $1
            UNION ALL
            SELECT u.id AS user_id, u.email, 'staff' AS role, s.created_at AS member_since
            FROM staff_grants s
            JOIN users u ON u.id = s.user_id
            WHERE s.workspace_id = $1
            ORDER BY member_since ASC, email ASC
            "#,
        )
        .bind(workspace_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("workspace_members", e))
    }

    // ───────────────────────────── Invites ─────────────────────────────

    #[instrument(skip(self, params), fields(workspace_id = ?params.workspace_id), err)]
    async fn insert_invite(&self, params: &CreateInviteParams) -> Result<InviteRecord, StoreError> {
        let record = InviteRecord {
            id: InviteId::new(),
            token: params.token.clone(),
            email: params.email.clone(),
            role: params.role,
            workspace_id: params.workspace_id,
            status: InviteStatus::Pending,
            invited_by: params.invited_by,
            created_at: Utc::now(),
            expires_at: params.expires_at,
            accepted_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO invites
                (id, token, email, role, workspace_id, status, invited_by, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.token)
        .bind(record.email.as_str())
        .bind(record.role.as_str())
        .bind(record.workspace_id.map(|ws| *ws.as_uuid()))
        .bind(record.status.as_str())
        .bind(record.invited_by.as_uuid())
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_invite", e))?;

        Ok(record)
    }

    async fn invite_by_token(&self, token: &str) -> Result<InviteRecord, StoreError> {
        sqlx::query_as::<_, InviteRecord>(
            r#"
            SELECT id, token, email, role, workspace_id, status, invited_by,
                   created_at, expires_at, accepted_at
            FROM invites
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("invite_by_token", e))?
        .ok_or(StoreError::NotFound)
    }

    async fn list_invites(
        &self,
        workspace_id: Option<WorkspaceId>,
    ) -> Result<Vec<InviteRecord>, StoreError> {
        sqlx::query_as::<_, InviteRecord>(
            r#"
            SELECT id, token, email, role, workspace_id, status, invited_by,
                   created_at, expires_at, accepted_at
            FROM invites
            WHERE workspace_id IS NOT DISTINCT FROM $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(workspace_id.map(|ws| *ws.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_invites", e))
    }

    #[instrument(skip(self), fields(invite_id = %invite_id), err)]
    async fn mark_revoked(&self, invite_id: InviteId) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE invites SET status = 'revoked'
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(invite_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("mark_revoked", e))?;

        if result.rows_affected() == 0 {
            return Err(self.guard_outcome("invites", *invite_id.as_uuid()).await);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(invite_id = %invite_id, user_id = %user_id), err)]
    async fn accept_invite(
        &self,
        invite_id: InviteId,
        user_id: InternalUserId,
        grant: AcceptGrant,
        accepted_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("accept_invite", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE invites SET status = 'accepted', accepted_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(invite_id.as_uuid())
        .bind(accepted_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("accept_invite", e))?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(self.guard_outcome("invites", *invite_id.as_uuid()).await);
        }

        let grant_query = match grant {
            AcceptGrant::PlatformOperator => sqlx::query(
                r#"
                INSERT INTO admin_grants (id, user_id, workspace_id, created_at)
                VALUES ($1, $2, NULL, $3)
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(user_id.as_uuid())
            .bind(accepted_at),
            AcceptGrant::Staff(workspace_id) => sqlx::query(
                r#"
                INSERT INTO staff_grants (id, user_id, workspace_id, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(user_id.as_uuid())
            .bind(*workspace_id.as_uuid())
            .bind(accepted_at),
        };

        grant_query
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("accept_invite", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("accept_invite", e))?;
        Ok(())
    }
}

// SQLx row conversions

fn decode<T>(index: &str, result: Result<T, AccessError>) -> Result<T, sqlx::Error> {
    result.map_err(|e| sqlx::Error::ColumnDecode {
        index: index.into(),
        source: Box::new(e),
    })
}

impl<'r> sqlx::FromRow<'r, PgRow> for UserRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let principal: Option<String> = row.try_get("principal_id")?;
        let email: String = row.try_get("email")?;
        let direct_role: Option<String> = row.try_get("direct_role")?;

        Ok(UserRecord {
            id: InternalUserId::from_uuid(row.try_get("id")?),
            principal_id: principal
                .map(|p| decode("principal_id", PrincipalId::new(p)))
                .transpose()?,
            email: decode("email", EmailAddress::parse(&email))?,
            direct_operator: direct_role.as_deref() == Some(DIRECT_OPERATOR_ROLE),
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, PgRow> for WorkspaceRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(WorkspaceRecord {
            id: WorkspaceId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            owner_id: InternalUserId::from_uuid(row.try_get("owner_id")?),
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, PgRow> for AdminGrantRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let workspace_id: Option<Uuid> = row.try_get("workspace_id")?;
        Ok(AdminGrantRecord {
            user_id: InternalUserId::from_uuid(row.try_get("user_id")?),
            workspace_id: workspace_id.map(WorkspaceId::from_uuid),
            granted_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, PgRow> for StaffGrantRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(StaffGrantRecord {
            user_id: InternalUserId::from_uuid(row.try_get("user_id")?),
            workspace_id: WorkspaceId::from_uuid(row.try_get("workspace_id")?),
            granted_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, PgRow> for MemberRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let email: String = row.try_get("email")?;
        let role: String = row.try_get("role")?;

        Ok(MemberRecord {
            user_id: InternalUserId::from_uuid(row.try_get("user_id")?),
            email: decode("email", EmailAddress::parse(&email))?,
            role: decode("role", role.parse::<Role>())?,
            member_since: row.try_get("member_since")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, PgRow> for InviteRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let email: String = row.try_get("email")?;
        let role: String = row.try_get("role")?;
        let status: String = row.try_get("status")?;
        let workspace_id: Option<Uuid> = row.try_get("workspace_id")?;

        Ok(InviteRecord {
            id: InviteId::from_uuid(row.try_get("id")?),
            token: row.try_get("token")?,
            email: decode("email", EmailAddress::parse(&email))?,
            role: decode("role", role.parse::<Role>())?,
            workspace_id: workspace_id.map(WorkspaceId::from_uuid),
            status: decode(
                "status",
                InviteStatus::parse(&status).ok_or_else(|| {
                    AccessError::validation(format!("unknown invite status: {status}"))
                }),
            )?,
            invited_by: InternalUserId::from_uuid(row.try_get("invited_by")?),
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
            accepted_at: row.try_get("accepted_at")?,
        })
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::AlreadyExists,
                Some("23503") => StoreError::NotFound,
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => {
            StoreError::backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::backend(format!("sqlx error in {operation}: {err}")),
    }
}
