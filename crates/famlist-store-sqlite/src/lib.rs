//! SQLite backend for famlist.
//!
//! Every state transition runs in a single transaction with a
//! compare-and-swap guard on the mutable column, so concurrent responders
//! get at-most-one-winner semantics without application-level locks.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use uuid::Uuid;

use famlist_storage::{
    CreateFamilyParams, CreateInvitationParams, Family, FamilyId, FamilyInvitation, FamilyMember,
    InvitationId, InvitationStatus, NewNotification, Notification, NotificationId,
    NotificationKind, Role, Store, StoreError, UserId, invitation_expiry,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// `~/.famlist/store.db` (creates dir with 0700 perms on unix)
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".famlist");
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Backend(e.to_string()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let path = dir.join("store.db");
        let url = format!("sqlite://{}", path.to_string_lossy());
        Self::open(&url).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|d| matches!(d.kind(), sqlx::error::ErrorKind::UniqueViolation))
        .unwrap_or(false)
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|d| matches!(d.kind(), sqlx::error::ErrorKind::ForeignKeyViolation))
        .unwrap_or(false)
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(|e| StoreError::Backend(e.to_string()))
}

fn parse_ts(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StoreError::Backend(format!("invalid timestamp: {}", secs)))
}

type FamilyRow = (String, String, String, i64, i64);

fn family_from_row((id, name, created_by, created_at, updated_at): FamilyRow) -> Result<Family, StoreError> {
    Ok(Family {
        id: FamilyId(parse_uuid(&id)?),
        name,
        created_by: UserId(parse_uuid(&created_by)?),
        created_at: parse_ts(created_at)?,
        updated_at: parse_ts(updated_at)?,
    })
}

type MemberRow = (String, String, String, Option<String>, Option<String>, i64);

fn member_from_row(
    (family_id, user_id, role, email, invited_by, joined_at): MemberRow,
) -> Result<FamilyMember, StoreError> {
    Ok(FamilyMember {
        family_id: FamilyId(parse_uuid(&family_id)?),
        user_id: UserId(parse_uuid(&user_id)?),
        role: Role::from_str(&role).map_err(|e| StoreError::Backend(e.to_string()))?,
        email,
        invited_by: invited_by
            .as_deref()
            .map(parse_uuid)
            .transpose()?
            .map(UserId),
        joined_at: parse_ts(joined_at)?,
    })
}

type InvitationRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    i64,
    i64,
    Option<i64>,
);

fn invitation_from_row(
    (id, family_id, email, role, status, invited_by, created_at, expires_at, responded_at): InvitationRow,
) -> Result<FamilyInvitation, StoreError> {
    Ok(FamilyInvitation {
        id: InvitationId(parse_uuid(&id)?),
        family_id: FamilyId(parse_uuid(&family_id)?),
        email,
        role: Role::from_str(&role).map_err(|e| StoreError::Backend(e.to_string()))?,
        status: InvitationStatus::from_str(&status)
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        invited_by: UserId(parse_uuid(&invited_by)?),
        created_at: parse_ts(created_at)?,
        expires_at: parse_ts(expires_at)?,
        responded_at: responded_at.map(parse_ts).transpose()?,
    })
}

type NotificationRow = (
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    i64,
    Option<i64>,
    i64,
);

fn notification_from_row(
    (id, user_id, family_id, sender_id, kind, message, read, read_at, created_at): NotificationRow,
) -> Result<Notification, StoreError> {
    Ok(Notification {
        id: NotificationId(parse_uuid(&id)?),
        user_id: UserId(parse_uuid(&user_id)?),
        family_id: FamilyId(parse_uuid(&family_id)?),
        sender_id: sender_id.as_deref().map(parse_uuid).transpose()?.map(UserId),
        kind: NotificationKind::from_str(&kind).map_err(|e| StoreError::Backend(e.to_string()))?,
        message,
        read: read != 0,
        read_at: read_at.map(parse_ts).transpose()?,
        created_at: parse_ts(created_at)?,
    })
}

const SELECT_INVITATION: &str = "SELECT id,family_id,email,role,status,invited_by,created_at,expires_at,responded_at \
     FROM family_invitations WHERE id=?";

async fn fetch_invitation(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    invitation_id: &InvitationId,
) -> Result<FamilyInvitation, StoreError> {
    let row = sqlx::query_as::<_, InvitationRow>(SELECT_INVITATION)
        .bind(invitation_id.0.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(backend)?;
    match row {
        None => Err(StoreError::NotFound),
        Some(row) => invitation_from_row(row),
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────────────── Families ───────────────────────────────────────

    async fn create_family(&self, params: &CreateFamilyParams) -> Result<Family, StoreError> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        // Family and creator's admin membership in one transaction; a failed
        // membership insert rolls back the family insert.
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "INSERT INTO families(id,name,created_by,created_at,updated_at) VALUES(?,?,?,?,?)",
        )
        .bind(id.to_string())
        .bind(&params.name)
        .bind(params.created_by.0.to_string())
        .bind(now.timestamp())
        .bind(now.timestamp())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        sqlx::query(
            "INSERT INTO family_members(family_id,user_id,role,email,invited_by,joined_at) \
             VALUES(?,?,?,?,NULL,?)",
        )
        .bind(id.to_string())
        .bind(params.created_by.0.to_string())
        .bind(Role::Admin.as_str())
        .bind(params.creator_email.to_lowercase())
        .bind(now.timestamp())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        Ok(Family {
            id: FamilyId(id),
            name: params.name.clone(),
            created_by: params.created_by,
            created_at: parse_ts(now.timestamp())?,
            updated_at: parse_ts(now.timestamp())?,
        })
    }

    async fn get_family(&self, family_id: &FamilyId) -> Result<Family, StoreError> {
        let row = sqlx::query_as::<_, FamilyRow>(
            "SELECT id,name,created_by,created_at,updated_at FROM families WHERE id=?",
        )
        .bind(family_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some(row) => family_from_row(row),
        }
    }

    async fn list_families_for_user(&self, user_id: &UserId) -> Result<Vec<Family>, StoreError> {
        let rows = sqlx::query_as::<_, FamilyRow>(
            "SELECT f.id,f.name,f.created_by,f.created_at,f.updated_at \
             FROM families f JOIN family_members m ON m.family_id = f.id \
             WHERE m.user_id=? ORDER BY f.created_at",
        )
        .bind(user_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(family_from_row).collect()
    }

    async fn update_family_name(
        &self,
        family_id: &FamilyId,
        name: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE families SET name=?, updated_at=? WHERE id=?")
            .bind(name)
            .bind(Utc::now().timestamp())
            .bind(family_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_family(&self, family_id: &FamilyId) -> Result<(), StoreError> {
        // Memberships and invitations go with it (FK cascade). Notifications
        // are kept as historical records.
        let result = sqlx::query("DELETE FROM families WHERE id=?")
            .bind(family_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────────────── Members ────────────────────────────────────────

    async fn list_family_members(
        &self,
        family_id: &FamilyId,
    ) -> Result<Vec<FamilyMember>, StoreError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT family_id,user_id,role,email,invited_by,joined_at \
             FROM family_members WHERE family_id=? ORDER BY joined_at",
        )
        .bind(family_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(member_from_row).collect()
    }

    async fn get_family_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
    ) -> Result<FamilyMember, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT family_id,user_id,role,email,invited_by,joined_at \
             FROM family_members WHERE family_id=? AND user_id=?",
        )
        .bind(family_id.0.to_string())
        .bind(user_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some(row) => member_from_row(row),
        }
    }

    async fn get_family_member_by_email(
        &self,
        family_id: &FamilyId,
        email: &str,
    ) -> Result<FamilyMember, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT family_id,user_id,role,email,invited_by,joined_at \
             FROM family_members WHERE family_id=? AND lower(email)=lower(?)",
        )
        .bind(family_id.0.to_string())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some(row) => member_from_row(row),
        }
    }

    async fn update_member_role(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        role: Role,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // The admin-count subquery is evaluated in the same statement as the
        // update, so the last admin can never be demoted under a race.
        let result = sqlx::query(
            "UPDATE family_members SET role=? \
             WHERE family_id=? AND user_id=? \
               AND (? = 'admin' \
                    OR role != 'admin' \
                    OR (SELECT COUNT(*) FROM family_members \
                        WHERE family_id=? AND role='admin') > 1)",
        )
        .bind(role.as_str())
        .bind(family_id.0.to_string())
        .bind(user_id.0.to_string())
        .bind(role.as_str())
        .bind(family_id.0.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_as::<_, (i64,)>(
                "SELECT COUNT(*) FROM family_members WHERE family_id=? AND user_id=?",
            )
            .bind(family_id.0.to_string())
            .bind(user_id.0.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;

            return if exists.0 == 0 {
                Err(StoreError::NotFound)
            } else {
                Err(StoreError::LastAdmin)
            };
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn remove_family_member(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let result = sqlx::query(
            "DELETE FROM family_members \
             WHERE family_id=? AND user_id=? \
               AND (role != 'admin' \
                    OR (SELECT COUNT(*) FROM family_members \
                        WHERE family_id=? AND role='admin') > 1)",
        )
        .bind(family_id.0.to_string())
        .bind(user_id.0.to_string())
        .bind(family_id.0.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_as::<_, (i64,)>(
                "SELECT COUNT(*) FROM family_members WHERE family_id=? AND user_id=?",
            )
            .bind(family_id.0.to_string())
            .bind(user_id.0.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(backend)?;

            return if exists.0 == 0 {
                Err(StoreError::NotFound)
            } else {
                Err(StoreError::LastAdmin)
            };
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn set_member_email(
        &self,
        family_id: &FamilyId,
        user_id: &UserId,
        email: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE family_members SET email=? WHERE family_id=? AND user_id=?",
        )
        .bind(email.to_lowercase())
        .bind(family_id.0.to_string())
        .bind(user_id.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────────────── Invitations ────────────────────────────────────

    async fn create_invitation(
        &self,
        params: &CreateInvitationParams,
        now: DateTime<Utc>,
    ) -> Result<FamilyInvitation, StoreError> {
        let email = params.email.to_lowercase();
        let id = Uuid::now_v7();
        let expires_at = invitation_expiry(now);

        let mut tx = self.pool.begin().await.map_err(backend)?;

        // An email that already maps to a member cannot be invited again.
        let member = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM family_members WHERE family_id=? AND lower(email)=?",
        )
        .bind(params.family_id.0.to_string())
        .bind(&email)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;
        if member.0 > 0 {
            return Err(StoreError::AlreadyMember);
        }

        // Reap an expired-but-still-pending row so the partial unique index
        // only ever blocks genuinely open invitations.
        sqlx::query(
            "DELETE FROM family_invitations \
             WHERE family_id=? AND email=? AND status='pending' AND expires_at < ?",
        )
        .bind(params.family_id.0.to_string())
        .bind(&email)
        .bind(now.timestamp())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        let result = sqlx::query(
            "INSERT INTO family_invitations\
             (id,family_id,email,role,status,invited_by,created_at,expires_at,responded_at) \
             VALUES(?,?,?,?,'pending',?,?,?,NULL)",
        )
        .bind(id.to_string())
        .bind(params.family_id.0.to_string())
        .bind(&email)
        .bind(params.role.as_str())
        .bind(params.invited_by.0.to_string())
        .bind(now.timestamp())
        .bind(expires_at.timestamp())
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(StoreError::DuplicateInvitation),
            Err(e) if is_foreign_key_violation(&e) => return Err(StoreError::NotFound),
            Err(e) => return Err(backend(e)),
        }

        tx.commit().await.map_err(backend)?;

        Ok(FamilyInvitation {
            id: InvitationId(id),
            family_id: params.family_id,
            email,
            role: params.role,
            status: InvitationStatus::Pending,
            invited_by: params.invited_by,
            created_at: parse_ts(now.timestamp())?,
            expires_at: parse_ts(expires_at.timestamp())?,
            responded_at: None,
        })
    }

    async fn get_invitation(
        &self,
        invitation_id: &InvitationId,
    ) -> Result<FamilyInvitation, StoreError> {
        let row = sqlx::query_as::<_, InvitationRow>(SELECT_INVITATION)
            .bind(invitation_id.0.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some(row) => invitation_from_row(row),
        }
    }

    async fn list_pending_invitations(
        &self,
        family_id: &FamilyId,
        now: DateTime<Utc>,
    ) -> Result<Vec<FamilyInvitation>, StoreError> {
        let rows = sqlx::query_as::<_, InvitationRow>(
            "SELECT id,family_id,email,role,status,invited_by,created_at,expires_at,responded_at \
             FROM family_invitations \
             WHERE family_id=? AND status='pending' AND expires_at >= ? \
             ORDER BY created_at",
        )
        .bind(family_id.0.to_string())
        .bind(now.timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(invitation_from_row).collect()
    }

    async fn accept_invitation(
        &self,
        invitation_id: &InvitationId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<FamilyMember, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let invitation = fetch_invitation(&mut tx, invitation_id).await?;

        if invitation.status != InvitationStatus::Pending {
            return Err(StoreError::AlreadyResponded);
        }
        if invitation.is_expired_at(now) {
            return Err(StoreError::Expired);
        }

        // Compare-and-swap: exactly one concurrent responder flips the status.
        let result = sqlx::query(
            "UPDATE family_invitations SET status='accepted', responded_at=? \
             WHERE id=? AND status='pending'",
        )
        .bind(now.timestamp())
        .bind(invitation_id.0.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyResponded);
        }

        // Membership at the invitation's role, in the same transaction: a
        // crash here rolls back the status flip too.
        let insert = sqlx::query(
            "INSERT INTO family_members(family_id,user_id,role,email,invited_by,joined_at) \
             VALUES(?,?,?,?,?,?)",
        )
        .bind(invitation.family_id.0.to_string())
        .bind(user_id.0.to_string())
        .bind(invitation.role.as_str())
        .bind(&invitation.email)
        .bind(invitation.invited_by.0.to_string())
        .bind(now.timestamp())
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {}
            // Membership gained between invite and accept: leave the
            // invitation pending (transaction rolls back on drop).
            Err(e) if is_unique_violation(&e) => return Err(StoreError::AlreadyMember),
            Err(e) => return Err(backend(e)),
        }

        tx.commit().await.map_err(backend)?;

        Ok(FamilyMember {
            family_id: invitation.family_id,
            user_id: *user_id,
            role: invitation.role,
            email: Some(invitation.email),
            invited_by: Some(invitation.invited_by),
            joined_at: parse_ts(now.timestamp())?,
        })
    }

    async fn reject_invitation(
        &self,
        invitation_id: &InvitationId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let invitation = fetch_invitation(&mut tx, invitation_id).await?;

        if invitation.status != InvitationStatus::Pending {
            return Err(StoreError::AlreadyResponded);
        }
        if invitation.is_expired_at(now) {
            return Err(StoreError::Expired);
        }

        let result = sqlx::query(
            "UPDATE family_invitations SET status='rejected', responded_at=? \
             WHERE id=? AND status='pending'",
        )
        .bind(now.timestamp())
        .bind(invitation_id.0.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyResponded);
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn delete_invitation(&self, invitation_id: &InvitationId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let result = sqlx::query("DELETE FROM family_invitations WHERE id=? AND status='pending'")
            .bind(invitation_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            // Distinguish a responded invitation from a missing one.
            return match fetch_invitation(&mut tx, invitation_id).await {
                Ok(_) => Err(StoreError::AlreadyResponded),
                Err(e) => Err(e),
            };
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    // ───────────────────────────────────── Notifications ──────────────────────────────────

    async fn insert_notifications(
        &self,
        rows: &[NewNotification],
    ) -> Result<Vec<Notification>, StoreError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut out = Vec::with_capacity(rows.len());

        for row in rows {
            let id = Uuid::now_v7();
            sqlx::query(
                "INSERT INTO notifications\
                 (id,user_id,family_id,sender_id,kind,message,read,read_at,created_at) \
                 VALUES(?,?,?,?,?,?,0,NULL,?)",
            )
            .bind(id.to_string())
            .bind(row.user_id.0.to_string())
            .bind(row.family_id.0.to_string())
            .bind(row.sender_id.map(|s| s.0.to_string()))
            .bind(row.kind.as_str())
            .bind(&row.message)
            .bind(now.timestamp())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

            out.push(Notification {
                id: NotificationId(id),
                user_id: row.user_id,
                family_id: row.family_id,
                sender_id: row.sender_id,
                kind: row.kind,
                message: row.message.clone(),
                read: false,
                read_at: None,
                created_at: parse_ts(now.timestamp())?,
            });
        }

        tx.commit().await.map_err(backend)?;
        Ok(out)
    }

    async fn list_notifications(&self, user_id: &UserId) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT id,user_id,family_id,sender_id,kind,message,read,read_at,created_at \
             FROM notifications WHERE user_id=? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(notification_from_row).collect()
    }

    async fn mark_notifications_read(
        &self,
        user_id: &UserId,
        ids: &[NotificationId],
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut updated = 0u64;

        // Scoped by user_id: rows owned by someone else simply don't match.
        for id in ids {
            let result = sqlx::query(
                "UPDATE notifications SET read=1, read_at=? \
                 WHERE id=? AND user_id=? AND read=0",
            )
            .bind(now.timestamp())
            .bind(id.0.to_string())
            .bind(user_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
            updated += result.rows_affected();
        }

        tx.commit().await.map_err(backend)?;
        Ok(updated)
    }

    async fn delete_notification(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id=? AND user_id=?")
            .bind(notification_id.0.to_string())
            .bind(user_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected())
    }
}
