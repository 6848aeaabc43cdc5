/// Registration persistence, listing and payment verification
use crate::{
    admin::{coupons, CouponManager},
    db,
    error::{PortalError, PortalResult},
    mailer::{Mailer, RegistrationEmail},
    registration::{
        generate_slip_id, NewRegistration, PaymentMethod, Registration, RegistrationFilter,
        RegistrationReceipt, RegistrationStats, RegistrationStatus,
    },
};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

const DUPLICATE_TEAM: &str = "Team name already exists. Please choose a unique team name.";

const INSERT_WITH_COUPON: &str = r#"
    INSERT INTO registrations (
        id, email, name, roll_number, contact_number, alternative_contact_number,
        gender, team_name, selected_games, team_members, total_amount, discount,
        payment_method, slip_id, transaction_id, screenshot_url, status, coupon_code
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
    RETURNING registration_number
"#;

/// Same insert for databases that predate the coupon_code column
const INSERT_WITHOUT_COUPON: &str = r#"
    INSERT INTO registrations (
        id, email, name, roll_number, contact_number, alternative_contact_number,
        gender, team_name, selected_games, team_members, total_amount, discount,
        payment_method, slip_id, transaction_id, screenshot_url, status
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
    RETURNING registration_number
"#;

const REGISTRATION_COLUMNS: &str = "id, registration_number, email, name, roll_number, \
    contact_number, alternative_contact_number, gender, team_name, selected_games, team_members, \
    total_amount::float8 AS total_amount, discount::float8 AS discount, coupon_code, \
    payment_method, slip_id, transaction_id, screenshot_url, status, created_at, updated_at";

/// Fields computed for a registration before it is written
struct PreparedRow<'a> {
    id: String,
    reg: &'a NewRegistration,
    selected_games: String,
    team_members: Option<String>,
    discount: f64,
    coupon_code: Option<String>,
    slip_id: String,
    status: RegistrationStatus,
}

/// Registration manager
#[derive(Clone)]
pub struct RegistrationManager {
    db: PgPool,
    coupons: CouponManager,
    mailer: Mailer,
}

impl RegistrationManager {
    pub fn new(db: PgPool, coupons: CouponManager, mailer: Mailer) -> Self {
        Self {
            db,
            coupons,
            mailer,
        }
    }

    /// Persist a validated registration and send the confirmation mail
    pub async fn create(&self, reg: &NewRegistration) -> PortalResult<RegistrationReceipt> {
        if self.team_name_taken(&reg.team_name).await? {
            return Err(PortalError::conflict(DUPLICATE_TEAM, Some("teamName")));
        }

        let (discount, coupon_code) = self.resolve_discount(reg).await?;

        let row = PreparedRow {
            id: Uuid::new_v4().to_string(),
            reg,
            selected_games: serde_json::to_string(&reg.selected_games)
                .map_err(|e| PortalError::Internal(format!("Failed to encode games: {}", e)))?,
            team_members: reg
                .team_members
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| PortalError::Internal(format!("Failed to encode members: {}", e)))?,
            discount,
            coupon_code,
            slip_id: generate_slip_id(reg.payment_method),
            status: reg.payment_method.initial_status(),
        };

        let registration_number = match self.insert(&row, true).await {
            Err(e) if db::is_undefined_column(&e, "coupon_code") => {
                tracing::warn!("registrations.coupon_code missing; storing without coupon code");
                self.insert(&row, false).await
            }
            other => other,
        }
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                PortalError::conflict(DUPLICATE_TEAM, Some("teamName"))
            } else {
                db::map_missing_table(e, "registrations")
            }
        })?;

        tracing::info!(
            "Registered team {} (#{:?}, {}, {} games, total {:.2}, discount {:.2})",
            reg.team_name,
            registration_number,
            row.slip_id,
            reg.selected_games.len(),
            reg.total_amount,
            row.discount
        );

        let mail = RegistrationEmail {
            to: &reg.email,
            name: &reg.name,
            registration_number,
            slip_id: &row.slip_id,
            payment_method: reg.payment_method,
            team_name: &reg.team_name,
            games: &reg.selected_games,
        };
        if let Err(e) = self.mailer.send_registration_submitted(&mail).await {
            tracing::warn!("Registration submitted email to {} failed: {}", reg.email, e);
        }

        Ok(RegistrationReceipt {
            success: true,
            registration_id: row.id,
            registration_number,
            slip_id: row.slip_id,
            status: row.status,
            total_amount: reg.total_amount,
            discount: row.discount,
            coupon_code: row.coupon_code,
        })
    }

    /// Case-insensitive team name lookup
    pub async fn team_name_taken(&self, team_name: &str) -> PortalResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM registrations WHERE LOWER(team_name) = LOWER($1))",
        )
        .bind(team_name.trim())
        .fetch_one(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "registrations"))?;

        Ok(exists)
    }

    /// Server-side coupon discount, or the client figure when no coupon resolves
    async fn resolve_discount(&self, reg: &NewRegistration) -> PortalResult<(f64, Option<String>)> {
        let coupon = match reg.coupon_code.as_deref() {
            Some(code) => self.coupons.find_active(code).await?,
            None => None,
        };

        Ok(match coupon {
            Some(coupon) => (
                coupons::apply_percent(reg.total_amount, coupon.discount_percent),
                Some(coupons::normalize_code(&coupon.code)),
            ),
            None => (
                coupons::clamp_discount(reg.client_discount, reg.total_amount),
                None,
            ),
        })
    }

    async fn insert(&self, row: &PreparedRow<'_>, with_coupon: bool) -> Result<Option<i32>, sqlx::Error> {
        let sql = if with_coupon {
            INSERT_WITH_COUPON
        } else {
            INSERT_WITHOUT_COUPON
        };

        let reg = row.reg;
        let mut query = sqlx::query(sql)
            .bind(&row.id)
            .bind(&reg.email)
            .bind(&reg.name)
            .bind(&reg.roll_number)
            .bind(&reg.contact_number)
            .bind(reg.alternative_contact_number.as_deref())
            .bind(reg.gender.as_str())
            .bind(&reg.team_name)
            .bind(&row.selected_games)
            .bind(row.team_members.as_deref())
            .bind(reg.total_amount)
            .bind(row.discount)
            .bind(reg.payment_method.as_str())
            .bind(&row.slip_id)
            .bind(reg.transaction_id.as_deref())
            .bind(reg.screenshot_url.as_deref())
            .bind(row.status.as_str());

        if with_coupon {
            query = query.bind(row.coupon_code.as_deref());
        }

        let record = query.fetch_one(&self.db).await?;
        record.try_get("registration_number")
    }

    /// Registrations matching `filter`, newest first
    pub async fn list(&self, filter: &RegistrationFilter) -> PortalResult<Vec<Registration>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM registrations WHERE 1=1",
            REGISTRATION_COLUMNS
        ));

        for (column, value) in [
            ("status", &filter.status),
            ("payment_method", &filter.payment_method),
            ("gender", &filter.gender),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                query
                    .push(format!(" AND {} = ", column))
                    .push_bind(value.to_string());
            }
        }
        if let Some(start) = filter.start_date {
            query.push(" AND created_at::date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND created_at::date <= ").push_bind(end);
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build()
            .fetch_all(&self.db)
            .await
            .map_err(|e| db::map_missing_table(e, "registrations"))?;

        let mut registrations: Vec<Registration> = rows.iter().map(registration_from_row).collect();

        // selected_games is JSON text, so the game filter runs after decoding
        if let Some(game) = filter.game.as_deref().filter(|g| !g.is_empty()) {
            registrations.retain(|r| r.selected_games.iter().any(|g| g == game));
        }

        Ok(registrations)
    }

    /// Counts by status
    pub async fn stats(&self) -> PortalResult<RegistrationStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'paid') AS paid,
                COUNT(*) FILTER (WHERE status = 'pending_online') AS pending_online,
                COUNT(*) FILTER (WHERE status = 'pending_cash') AS pending_cash,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
            FROM registrations
            "#,
        )
        .fetch_one(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "registrations"))?;

        Ok(RegistrationStats {
            total: row.get("total"),
            paid: row.get("paid"),
            pending_online: row.get("pending_online"),
            pending_cash: row.get("pending_cash"),
            rejected: row.get("rejected"),
        })
    }

    /// Admin status change; paid and rejected notify the participant
    pub async fn update_status(
        &self,
        id: &str,
        status: RegistrationStatus,
    ) -> PortalResult<Registration> {
        let row = sqlx::query(&format!(
            "UPDATE registrations SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| db::map_missing_table(e, "registrations"))?
        .ok_or_else(|| PortalError::NotFound("Registration not found".to_string()))?;

        let registration = registration_from_row(&row);
        tracing::info!(
            "Registration {} ({}) set to {}",
            registration.id,
            registration.team_name,
            status.as_str()
        );

        let slip_id = registration.slip_id.as_deref().unwrap_or_default();
        let sent = match status {
            RegistrationStatus::Paid => Some(
                self.mailer
                    .send_payment_received(
                        &registration.email,
                        &registration.name,
                        registration.registration_number,
                        slip_id,
                    )
                    .await,
            ),
            RegistrationStatus::Rejected => Some(
                self.mailer
                    .send_payment_rejected(
                        &registration.email,
                        &registration.name,
                        registration.registration_number,
                        slip_id,
                        PaymentMethod::parse(&registration.payment_method)
                            .unwrap_or(PaymentMethod::Cash),
                    )
                    .await,
            ),
            _ => None,
        };
        if let Some(Err(e)) = sent {
            tracing::warn!("Status email to {} failed: {}", registration.email, e);
        }

        Ok(registration)
    }
}

fn registration_from_row(row: &sqlx::postgres::PgRow) -> Registration {
    let selected_games: String = row.get("selected_games");
    let team_members: Option<String> = row.get("team_members");

    Registration {
        id: row.get("id"),
        registration_number: row.get("registration_number"),
        email: row.get("email"),
        name: row.get("name"),
        roll_number: row.get("roll_number"),
        contact_number: row.get("contact_number"),
        alternative_contact_number: row.get("alternative_contact_number"),
        gender: row.get("gender"),
        team_name: row.get("team_name"),
        selected_games: serde_json::from_str(&selected_games).unwrap_or_default(),
        team_members: team_members.and_then(|m| serde_json::from_str(&m).ok()),
        total_amount: row.get("total_amount"),
        discount: row.get("discount"),
        coupon_code: row.get("coupon_code"),
        payment_method: row.get("payment_method"),
        slip_id: row.get("slip_id"),
        transaction_id: row.get("transaction_id"),
        screenshot_url: row.get("screenshot_url"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
