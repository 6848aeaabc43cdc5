/// Email sending functionality
///
/// SMTP credentials and message templates live in `system_settings` so
/// admins can edit them from the panel; the transport is built per send.
pub mod templates;

use crate::{
    admin::SettingsManager,
    error::{PortalError, PortalResult},
    registration::PaymentMethod,
};
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use std::collections::{BTreeMap, HashMap};
use templates::{escape_html, games_list_html, interpolate, wrap_card};

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_NAME: &str = "FCIT Sports Society";

/// SMTP settings as stored by the admin panel
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub email: String,
    pub password: String,
    pub from_name: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("from_name", &self.from_name)
            .finish()
    }
}

impl SmtpSettings {
    /// Build from `smtp_*` settings; email and password are required
    pub fn from_settings(map: &BTreeMap<String, String>) -> PortalResult<Self> {
        let get = |key: &str| {
            map.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let (email, password) = match (get("smtp_email"), get("smtp_password")) {
            (Some(email), Some(password)) => (email, password),
            _ => {
                return Err(PortalError::Validation(
                    "SMTP not configured. Configure in Admin → Settings.".to_string(),
                ))
            }
        };

        let port = match get("smtp_port") {
            Some(port) => port
                .parse()
                .map_err(|_| PortalError::Validation(format!("Invalid SMTP port: {}", port)))?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            host: get("smtp_host").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            port,
            email,
            password,
            from_name: get("smtp_from_name").unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
        })
    }

    /// Port 465 speaks TLS from the first byte; everything else upgrades with STARTTLS
    pub fn implicit_tls(&self) -> bool {
        self.port == 465
    }

    fn transport(&self) -> PortalResult<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if self.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
        }
        .map_err(|e| PortalError::Email(format!("SMTP setup failed: {}", e)))?;

        Ok(builder
            .port(self.port)
            .credentials(Credentials::new(self.email.clone(), self.password.clone()))
            .build())
    }
}

/// Details of a fresh registration for the confirmation mail
#[derive(Debug, Clone)]
pub struct RegistrationEmail<'a> {
    pub to: &'a str,
    pub name: &'a str,
    pub registration_number: Option<i32>,
    pub slip_id: &'a str,
    pub payment_method: PaymentMethod,
    pub team_name: &'a str,
    pub games: &'a [String],
}

/// Email mailer service
#[derive(Clone)]
pub struct Mailer {
    settings: SettingsManager,
}

impl Mailer {
    /// Create a new mailer
    pub fn new(settings: SettingsManager) -> Self {
        Self { settings }
    }

    /// Current SMTP settings
    pub async fn smtp_settings(&self) -> PortalResult<SmtpSettings> {
        let map = self.settings.get_prefixed("smtp_").await?;
        SmtpSettings::from_settings(&map)
    }

    /// First non-blank template among `keys`, else `default`
    async fn template(&self, keys: &[String], default: &str) -> String {
        for key in keys {
            match self.settings.get(key).await {
                Ok(Some(value)) if !value.trim().is_empty() => return value,
                Ok(_) => {}
                Err(e) => tracing::warn!("Could not read template {}: {}", key, e),
            }
        }
        default.to_string()
    }

    /// Send the "registration submitted" confirmation
    pub async fn send_registration_submitted(&self, mail: &RegistrationEmail<'_>) -> PortalResult<()> {
        let method = mail.payment_method.as_str();
        let subject = self
            .template(
                &[
                    format!("email_registration_submitted_{}_subject", method),
                    "email_registration_submitted_subject".to_string(),
                ],
                templates::DEFAULT_SUBJECT,
            )
            .await;
        let body = self
            .template(
                &[
                    format!("email_registration_submitted_{}_body", method),
                    "email_registration_submitted_body".to_string(),
                ],
                templates::DEFAULT_REGISTRATION_SUBMITTED_BODY,
            )
            .await;

        let payment_next = match mail.payment_method {
            PaymentMethod::Cash => templates::PAYMENT_NEXT_CASH,
            PaymentMethod::Online => templates::PAYMENT_NEXT_ONLINE,
        };

        let mut vars = participant_vars(mail.name, mail.registration_number, mail.slip_id);
        vars.insert("teamName", escape_html(mail.team_name));
        vars.insert("gamesList", games_list_html(mail.games));
        vars.insert("paymentNext", payment_next.to_string());

        self.send_html(mail.to, &subject, &wrap_card(&interpolate(&body, &vars)))
            .await
    }

    /// Send the "payment received" notice
    pub async fn send_payment_received(
        &self,
        to: &str,
        name: &str,
        registration_number: Option<i32>,
        slip_id: &str,
    ) -> PortalResult<()> {
        let subject = self
            .template(
                &["email_payment_received_subject".to_string()],
                templates::DEFAULT_SUBJECT,
            )
            .await;
        let body = self
            .template(
                &["email_payment_received_body".to_string()],
                templates::DEFAULT_PAYMENT_RECEIVED_BODY,
            )
            .await;

        let vars = participant_vars(name, registration_number, slip_id);
        self.send_html(to, &subject, &wrap_card(&interpolate(&body, &vars)))
            .await
    }

    /// Send the "payment not received" notice
    pub async fn send_payment_rejected(
        &self,
        to: &str,
        name: &str,
        registration_number: Option<i32>,
        slip_id: &str,
        payment_method: PaymentMethod,
    ) -> PortalResult<()> {
        let subject = self
            .template(
                &["email_payment_rejected_subject".to_string()],
                templates::DEFAULT_SUBJECT,
            )
            .await;
        let body = self
            .template(
                &["email_payment_rejected_body".to_string()],
                templates::DEFAULT_PAYMENT_REJECTED_BODY,
            )
            .await;

        let payment_action = match payment_method {
            PaymentMethod::Cash => templates::PAYMENT_ACTION_CASH,
            PaymentMethod::Online => templates::PAYMENT_ACTION_ONLINE,
        };

        let mut vars = participant_vars(name, registration_number, slip_id);
        vars.insert("paymentAction", payment_action.to_string());

        self.send_html(to, &subject, &wrap_card(&interpolate(&body, &vars)))
            .await
    }

    /// Send a test message with the stored SMTP settings
    pub async fn send_test(&self, to: &str) -> PortalResult<()> {
        self.send_html(
            to,
            "Mini Olympics 2026 SMTP test",
            &wrap_card(templates::DEFAULT_TEST_BODY),
        )
        .await
    }

    /// Send an HTML email
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> PortalResult<()> {
        let smtp = self.smtp_settings().await?;

        let from = Mailbox::new(
            Some(smtp.from_name.clone()),
            smtp.email
                .parse()
                .map_err(|e| PortalError::Email(format!("Invalid from address: {}", e)))?,
        );

        let email = Message::builder()
            .from(from)
            .to(to
                .parse()
                .map_err(|e| PortalError::Validation(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| PortalError::Email(format!("Failed to build email: {}", e)))?;

        smtp.transport()?
            .send(email)
            .await
            .map_err(|e| PortalError::Email(format!("Failed to send email: {}", e)))?;

        tracing::info!("Sent email to {}: {}", to, subject);
        Ok(())
    }
}

fn participant_vars(
    name: &str,
    registration_number: Option<i32>,
    slip_id: &str,
) -> HashMap<&'static str, String> {
    HashMap::from([
        ("name", escape_html(name)),
        (
            "regNum",
            registration_number.map(|n| n.to_string()).unwrap_or_default(),
        ),
        ("slipId", escape_html(slip_id)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_smtp_defaults() {
        let smtp = SmtpSettings::from_settings(&settings(&[
            ("smtp_email", "sports@example.com"),
            ("smtp_password", "app-password"),
        ]))
        .unwrap();

        assert_eq!(smtp.host, "smtp.gmail.com");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from_name, "FCIT Sports Society");
        assert!(!smtp.implicit_tls());
    }

    #[test]
    fn test_smtp_port_465_uses_implicit_tls() {
        let smtp = SmtpSettings::from_settings(&settings(&[
            ("smtp_host", "mail.example.com"),
            ("smtp_port", "465"),
            ("smtp_email", "sports@example.com"),
            ("smtp_password", "secret"),
            ("smtp_from_name", "MO26 Desk"),
        ]))
        .unwrap();

        assert_eq!(smtp.host, "mail.example.com");
        assert!(smtp.implicit_tls());
        assert_eq!(smtp.from_name, "MO26 Desk");
    }

    #[test]
    fn test_smtp_requires_credentials() {
        let err = SmtpSettings::from_settings(&settings(&[("smtp_email", "a@b.c")])).unwrap_err();
        assert!(err.to_string().contains("SMTP not configured"));

        let err = SmtpSettings::from_settings(&settings(&[
            ("smtp_email", " "),
            ("smtp_password", "x"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SMTP not configured"));
    }

    #[test]
    fn test_smtp_rejects_bad_port() {
        let result = SmtpSettings::from_settings(&settings(&[
            ("smtp_email", "a@b.c"),
            ("smtp_password", "x"),
            ("smtp_port", "smtp"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_participant_vars_escape_input() {
        let vars = participant_vars("<script>", Some(7), "MO26-CASH-1234");
        assert_eq!(vars["name"], "&lt;script&gt;");
        assert_eq!(vars["regNum"], "7");
        assert_eq!(vars["slipId"], "MO26-CASH-1234");

        let vars = participant_vars("Ali", None, "MO26-ONLINE-9999");
        assert_eq!(vars["regNum"], "");
    }

    #[test]
    fn test_debug_redacts_password() {
        let smtp = SmtpSettings::from_settings(&settings(&[
            ("smtp_email", "a@b.c"),
            ("smtp_password", "hunter2"),
        ]))
        .unwrap();
        assert!(!format!("{:?}", smtp).contains("hunter2"));
    }
}
