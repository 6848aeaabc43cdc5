/// Email templates and the event card layout
use std::collections::HashMap;

/// One subject for every registration mail so replies stay in a single thread
pub const DEFAULT_SUBJECT: &str = "Mini Olympics 2026 Registration";

pub const DEFAULT_REGISTRATION_SUBMITTED_BODY: &str = r#"
<h2>Welcome to Mini Olympics 2026! 🏆</h2>
<p>Dear {{name}},</p>
<p>Thank you for registering for the FCIT Sports Mini Olympics 2026. We're excited to have you on board!</p>
<p>Your registration has been received and is currently being processed.</p>
<p><strong>Ticket #:</strong> {{regNum}}</p>
<p><strong>Reference / Slip ID:</strong> {{slipId}}</p>
<p><strong>Team name:</strong> {{teamName}}</p>
<p><strong>Registered game(s):</strong></p>
<ul>
{{gamesList}}
</ul>
<p><strong>What's Next?</strong></p>
<ul>
  <li>{{paymentNext}}</li>
  <li>Join the WhatsApp groups for your registered games</li>
  <li>Stay tuned for match schedules</li>
</ul>
<p>Good luck and may the best athlete win!</p>
"#;

pub const DEFAULT_PAYMENT_RECEIVED_BODY: &str = r#"
<h2>Payment Confirmed ✅</h2>
<p>Dear {{name}},</p>
<p>Your payment for <strong>Mini Olympics 2026</strong> has been received and verified.</p>
<p><strong>Ticket #:</strong> {{regNum}}</p>
<p><strong>Reference ID:</strong> {{slipId}}</p>
<p>You are all set. We look forward to seeing you at the event.</p>
"#;

pub const DEFAULT_PAYMENT_REJECTED_BODY: &str = r#"
<h2>Payment Verification Required</h2>
<p>Dear {{name}},</p>
<p>We were unable to verify your payment for <strong>Mini Olympics 2026</strong> (Ticket #{{regNum}}).</p>
<p><strong>Reference ID:</strong> {{slipId}}</p>
<p>{{paymentAction}}</p>
"#;

pub const DEFAULT_TEST_BODY: &str = r#"
<h2>SMTP settings work ✅</h2>
<p>This is a test message from the Mini Olympics 2026 admin panel.</p>
"#;

pub const PAYMENT_NEXT_CASH: &str =
    "Please bring the cash to the desk to complete your registration.";
pub const PAYMENT_NEXT_ONLINE: &str =
    "Please share your payment receipt in reply to this email to complete verification.";
pub const PAYMENT_ACTION_CASH: &str =
    "Please bring the cash to the desk to complete your registration.";
pub const PAYMENT_ACTION_ONLINE: &str = "If you have already paid, please share your payment \
    receipt in reply to this email. Otherwise, please complete your payment and share the receipt in reply.";

/// Replace `{{key}}` placeholders; unknown keys become empty
///
/// Values are inserted verbatim. Escape user input with [`escape_html`]
/// before putting it in `vars`.
pub fn interpolate(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find("}}") {
            Some(end) if is_placeholder_key(&after[..end]) => {
                if let Some(value) = vars.get(&after[..end]) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            _ => {
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_placeholder_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Escape text for inclusion in HTML
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// `<li>` items for a list of games, escaped
pub fn games_list_html(games: &[String]) -> String {
    games
        .iter()
        .map(|g| format!("<li>{}</li>", escape_html(g)))
        .collect()
}

/// Wrap inner HTML in the event card: header, content, signature, footer links
pub fn wrap_card(content_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 0; font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background-color: #f8fafc;">
  <div style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <div style="background: linear-gradient(135deg, #f59e0b 0%, #ef4444 100%); border-radius: 16px 16px 0 0; padding: 32px; text-align: center; color: white;">
      <div style="font-size: 48px; margin-bottom: 16px;">🏆</div>
      <h1 style="margin: 0 0 8px 0; font-size: 24px; font-weight: 700;">Mini Olympics 2026</h1>
      <p style="margin: 0; opacity: 0.9; font-size: 14px;">FCIT Sports Society</p>
    </div>
    <div style="background: white; border-radius: 0 0 16px 16px; padding: 32px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.05);">
      <div style="color: #334155; line-height: 1.7; font-size: 15px;">
        {content}
      </div>
      <div style="margin-top: 32px; padding-top: 24px; border-top: 1px solid #e2e8f0;">
        <p style="margin: 0; color: #64748b; font-size: 14px;">
          Best regards,<br>
          <strong style="color: #334155;">FCIT Sports Society</strong>
        </p>
      </div>
    </div>
    <div style="text-align: center; margin-top: 24px; color: #94a3b8; font-size: 12px;">
      <p style="margin: 0 0 12px 0;">© 2026 <a href="https://pucit.edu.pk" style="color: #3b82f6; text-decoration: none; font-weight: 600;">FCIT Sports Society</a>. All rights reserved.</p>
      <p style="margin: 0;">
        <a href="mailto:sports.oc@pucit.edu.pk" style="color: #64748b; text-decoration: none; font-size: 18px; margin: 0 8px;" title="Email">✉︎</a>
        <a href="https://facebook.com/PucitSSOldCampus/" style="color: #64748b; text-decoration: none; font-size: 18px; margin: 0 8px;" title="Facebook">ⓕ</a>
        <a href="https://instagram.com/fcit_oc_sports" style="color: #64748b; text-decoration: none; font-size: 18px; margin: 0 8px;" title="Instagram">📷</a>
      </p>
    </div>
  </div>
</body>
</html>"#,
        content = content_html
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_interpolate_known_and_unknown_keys() {
        let out = interpolate(
            "Dear {{name}}, ticket {{regNum}}{{missing}}.",
            &vars(&[("name", "Ayesha"), ("regNum", "42")]),
        );
        assert_eq!(out, "Dear Ayesha, ticket 42.");
    }

    #[test]
    fn test_interpolate_leaves_non_placeholders() {
        let v = vars(&[("name", "x")]);
        assert_eq!(interpolate("{{ name }} {{name", &v), "{{ name }} {{name");
        assert_eq!(interpolate("{{{{name}}", &v), "{{x");
        assert_eq!(interpolate("no braces", &v), "no braces");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_games_list_html() {
        let games = vec!["Chess".to_string(), "Ludo <Doubles>".to_string()];
        assert_eq!(
            games_list_html(&games),
            "<li>Chess</li><li>Ludo &lt;Doubles&gt;</li>"
        );
    }

    #[test]
    fn test_wrap_card_embeds_content() {
        let html = wrap_card("<p>Hello</p>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<p>Hello</p>"));
        assert!(html.contains("Mini Olympics 2026"));
    }
}
