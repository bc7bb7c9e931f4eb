use crate::application_port::AuthError;
use crate::domain_model::{MemberId, Role};
use crate::domain_port::{MemberRecord, MemberRepo};
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

pub struct MySqlMemberRepo {
    pool: MySqlPool,
}

impl MySqlMemberRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlMemberRepo { pool }
    }

    #[inline]
    fn id_as_bytes(id: &MemberId) -> &[u8] {
        id.0.as_bytes()
    }

    #[inline]
    fn id_from_bytes(id: &[u8]) -> Result<MemberId, AuthError> {
        Ok(MemberId(
            Uuid::from_slice(id).map_err(|e| AuthError::StoreUnavailable(e.to_string()))?,
        ))
    }

    fn row_to_record(row: MySqlRow) -> Result<MemberRecord, AuthError> {
        let member_id_bytes: Vec<u8> = row
            .try_get("member_id")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let member_id = Self::id_from_bytes(&member_id_bytes)?;

        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        let role: String = row
            .try_get("role")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let role = role
            .parse::<Role>()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let is_active: bool = row
            .try_get("is_active")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(MemberRecord {
            member_id,
            email,
            username,
            password_hash,
            role,
            is_active,
            created_at,
        })
    }

    async fn fetch_one_by(
        &self,
        query: &'static str,
        binds: &[&str],
    ) -> Result<Option<MemberRecord>, AuthError> {
        let mut q = sqlx::query(query);
        for bind in binds {
            q = q.bind(*bind);
        }
        let row_opt: Option<MySqlRow> = q
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }
}

#[async_trait::async_trait]
impl MemberRepo for MySqlMemberRepo {
    async fn create(
        &self,
        member_id: MemberId,
        email: &str,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO member (member_id, email, username, password_hash, role)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(Self::id_as_bytes(&member_id))
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, member_id: MemberId) -> Result<Option<MemberRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT member_id, email, username, password_hash, role, is_active, created_at
FROM member
WHERE member_id = ?
"#,
        )
        .bind(Self::id_as_bytes(&member_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<MemberRecord>, AuthError> {
        self.fetch_one_by(
            r#"
SELECT member_id, email, username, password_hash, role, is_active, created_at
FROM member
WHERE email = ?
"#,
            &[email],
        )
        .await
    }

    async fn find_by_username_and_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<MemberRecord>, AuthError> {
        self.fetch_one_by(
            r#"
SELECT member_id, email, username, password_hash, role, is_active, created_at
FROM member
WHERE username = ? AND email = ?
"#,
            &[username, email],
        )
        .await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let row_opt = sqlx::query(
            r#"
SELECT 1 AS present
FROM member
WHERE email = ?
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(row_opt.is_some())
    }

    async fn update_password_hash(
        &self,
        member_id: MemberId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
UPDATE member
SET password_hash = ?
WHERE member_id = ?
"#,
        )
        .bind(password_hash)
        .bind(Self::id_as_bytes(&member_id))
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::PrincipalNotFound);
        }
        Ok(())
    }
}
