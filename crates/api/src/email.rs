//! One-time code delivery
//!
//! Sends verification-code emails via the Resend API. Delivery is
//! fire-and-forget: handlers spawn the send so a slow mail provider never
//! blocks the response.

use crate::auth::CodePurpose;

/// Email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Resend API key
    pub resend_api_key: String,
    /// From address for emails
    pub email_from: String,
    /// App name for branding
    pub app_name: String,
}

impl EmailConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            resend_api_key: std::env::var("RESEND_API_KEY").unwrap_or_default(),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "JoinHub <noreply@localhost>".to_string()),
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "JoinHub".to_string()),
        }
    }

    /// Check if email sending is enabled
    pub fn is_enabled(&self) -> bool {
        !self.resend_api_key.is_empty()
    }
}

/// Verification email delivery service
#[derive(Clone)]
pub struct Mailer {
    config: EmailConfig,
    client: reqwest::Client,
}

impl Mailer {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(EmailConfig::from_env())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Send an email via Resend API
    async fn send_email(&self, to: &str, subject: &str, html: &str) {
        if !self.config.is_enabled() {
            tracing::warn!("Email not configured, skipping: {}", subject);
            return;
        }

        let body = serde_json::json!({
            "from": self.config.email_from,
            "to": [to],
            "subject": subject,
            "html": html
        });

        let response = self
            .client
            .post("https://api.resend.com/emails")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.resend_api_key),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(to = %to, subject = %subject, "Verification email sent");
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                tracing::error!(
                    status = %status,
                    body = %body,
                    "Failed to send verification email"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send verification email");
            }
        }
    }

    /// Send a one-time verification code
    pub async fn send_verification_code(&self, to: &str, code: &str, purpose: CodePurpose) {
        let action = match purpose {
            CodePurpose::Register => "finish creating your account",
            CodePurpose::Reset => "reset your password",
            CodePurpose::Profile => "confirm this change to your account",
        };

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #059669;">Your {app_name} verification code</h2>
    <p>Use this code to {action}:</p>
    <div style="background-color: #f3f4f6; border-radius: 6px; padding: 16px; margin: 20px 0; text-align: center;">
        <span style="font-family: monospace; font-size: 28px; letter-spacing: 6px; font-weight: bold;">{code}</span>
    </div>
    <p style="color: #666; font-size: 14px;">The code expires in 5 minutes. If you didn't request it, you can ignore this email.</p>
    <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
    <p style="color: #999; font-size: 12px;">{app_name}</p>
</body>
</html>"#,
            app_name = self.config.app_name,
            action = action,
            code = code,
        );

        self.send_email(
            to,
            &format!("Your verification code - {}", self.config.app_name),
            &html,
        )
        .await;
    }
}
