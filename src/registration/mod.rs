/// Participant registrations
///
/// Request validation and the record types shared by the public form, the
/// admin listing and payment verification.

mod manager;

pub use manager::RegistrationManager;

use crate::{
    db,
    error::{PortalError, PortalResult},
};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

/// How the participant pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Online => "online",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "cash" => Some(PaymentMethod::Cash),
            "online" => Some(PaymentMethod::Online),
            _ => None,
        }
    }

    /// Status a new registration starts in
    pub fn initial_status(&self) -> RegistrationStatus {
        match self {
            PaymentMethod::Cash => RegistrationStatus::PendingCash,
            PaymentMethod::Online => RegistrationStatus::PendingOnline,
        }
    }

    fn slip_prefix(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "MO26-CASH",
            PaymentMethod::Online => "MO26-ONLINE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Boys,
    Girls,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Boys => "boys",
            Gender::Girls => "girls",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "boys" => Some(Gender::Boys),
            "girls" => Some(Gender::Girls),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    PendingCash,
    PendingOnline,
    Paid,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::PendingCash => "pending_cash",
            RegistrationStatus::PendingOnline => "pending_online",
            RegistrationStatus::Paid => "paid",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "pending_cash" => Some(RegistrationStatus::PendingCash),
            "pending_online" => Some(RegistrationStatus::PendingOnline),
            "paid" => Some(RegistrationStatus::Paid),
            "rejected" => Some(RegistrationStatus::Rejected),
            _ => None,
        }
    }
}

/// Human-readable payment reference, e.g. `MO26-CASH-4821`
///
/// The suffix is random and not checked against earlier registrations.
pub fn generate_slip_id(method: PaymentMethod) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("{}-{}", method.slip_prefix(), suffix)
}

/// Registration form as posted by the public site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub alternative_contact_number: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub selected_games: Option<Vec<String>>,
    #[serde(default)]
    pub team_members: Option<serde_json::Value>,
    /// Number or numeric string
    #[serde(default)]
    pub total_amount: Option<serde_json::Value>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    /// Client-computed discount, used only when no coupon resolves
    #[serde(default)]
    pub discount: Option<serde_json::Value>,
}

/// Validated registration ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct NewRegistration {
    pub email: String,
    pub name: String,
    pub roll_number: String,
    pub contact_number: String,
    pub alternative_contact_number: Option<String>,
    pub gender: Gender,
    pub team_name: String,
    pub selected_games: Vec<String>,
    pub team_members: Option<serde_json::Value>,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub screenshot_url: Option<String>,
    pub coupon_code: Option<String>,
    pub client_discount: f64,
}

impl RegistrationRequest {
    /// Check required fields and value formats
    pub fn validate(&self) -> PortalResult<NewRegistration> {
        let email = required(&self.email);
        let name = required(&self.name);
        let roll_number = required(&self.roll_number);
        let contact_number = required(&self.contact_number);
        let gender = required(&self.gender);
        let team_name = required(&self.team_name);
        let payment_method = required(&self.payment_method);
        let selected_games: Vec<String> = self
            .selected_games
            .iter()
            .flatten()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        let total_amount = self.total_amount.as_ref().and_then(parse_amount);

        let mut missing = Vec::new();
        for (field, present) in [
            ("email", email.is_some()),
            ("name", name.is_some()),
            ("rollNumber", roll_number.is_some()),
            ("contactNumber", contact_number.is_some()),
            ("gender", gender.is_some()),
            ("teamName", team_name.is_some()),
            ("selectedGames", !selected_games.is_empty()),
            ("paymentMethod", payment_method.is_some()),
            ("totalAmount", self.total_amount.as_ref().is_some_and(|v| !v.is_null())),
        ] {
            if !present {
                missing.push(field);
            }
        }

        match missing.as_slice() {
            [] => {}
            [field] => {
                return Err(PortalError::invalid_field(
                    *field,
                    format!("Missing required field: {}", field),
                ))
            }
            fields => {
                return Err(PortalError::Validation(format!(
                    "Missing required fields: {}",
                    fields.join(", ")
                )))
            }
        }

        // Every field below was checked for presence above
        let email = email.unwrap_or_default();
        if !email.validate_email() {
            return Err(PortalError::invalid_field("email", "Invalid email address"));
        }

        let gender = gender
            .and_then(Gender::parse)
            .ok_or_else(|| PortalError::invalid_field("gender", "Gender must be boys or girls"))?;

        let payment_method = payment_method.and_then(PaymentMethod::parse).ok_or_else(|| {
            PortalError::invalid_field("paymentMethod", "Payment method must be cash or online")
        })?;

        let total_amount = total_amount.ok_or_else(|| {
            PortalError::invalid_field("totalAmount", "Total amount must be a number of zero or more")
        })?;
        if !db::fits_numeric(total_amount, 10, 2) {
            return Err(PortalError::invalid_field("totalAmount", "Total amount is too large"));
        }

        let alternative_contact_number = required(&self.alternative_contact_number);
        let transaction_id = required(&self.transaction_id);
        for (field, value, max) in [
            ("email", Some(email), 255),
            ("name", name, 255),
            ("rollNumber", roll_number, 50),
            ("contactNumber", contact_number, 20),
            ("alternativeContactNumber", alternative_contact_number, 20),
            ("teamName", team_name, 100),
            ("transactionId", transaction_id, 255),
        ] {
            if let Some(value) = value {
                db::check_length(field, value, max)?;
            }
        }

        let client_discount = self
            .discount
            .as_ref()
            .and_then(parse_amount)
            .unwrap_or(0.0);

        Ok(NewRegistration {
            email: email.to_string(),
            name: name.unwrap_or_default().to_string(),
            roll_number: roll_number.unwrap_or_default().to_string(),
            contact_number: contact_number.unwrap_or_default().to_string(),
            alternative_contact_number: alternative_contact_number.map(str::to_string),
            gender,
            team_name: team_name.unwrap_or_default().to_string(),
            selected_games,
            team_members: self.team_members.clone().filter(|v| !v.is_null()),
            total_amount,
            payment_method,
            transaction_id: transaction_id.map(str::to_string),
            screenshot_url: required(&self.screenshot_url).map(str::to_string),
            coupon_code: required(&self.coupon_code).map(str::to_string),
            client_discount,
        })
    }
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Accept a JSON number or numeric string; must be finite and not negative
fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

/// Result of a successful submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub success: bool,
    pub registration_id: String,
    pub registration_number: Option<i32>,
    pub slip_id: String,
    pub status: RegistrationStatus,
    pub total_amount: f64,
    pub discount: f64,
    pub coupon_code: Option<String>,
}

/// Stored registration as shown in the admin panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub registration_number: Option<i32>,
    pub email: String,
    pub name: String,
    pub roll_number: String,
    pub contact_number: String,
    pub alternative_contact_number: Option<String>,
    pub gender: String,
    pub team_name: String,
    pub selected_games: Vec<String>,
    pub team_members: Option<serde_json::Value>,
    pub total_amount: f64,
    pub discount: f64,
    pub coupon_code: Option<String>,
    pub payment_method: String,
    pub slip_id: Option<String>,
    pub transaction_id: Option<String>,
    pub screenshot_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin listing filters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFilter {
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub gender: Option<String>,
    /// Keep registrations whose selected games include this one
    pub game: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Registration counts by status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStats {
    pub total: i64,
    pub paid: i64,
    pub pending_online: i64,
    pub pending_cash: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}
