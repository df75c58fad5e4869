use async_trait::async_trait;
use tracing::info;
use url::Url;

use crate::config::EmailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Outbound mail seam. Delivery itself is left to whatever sits behind it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        info!(to = %email.to, subject = %email.subject, body = %email.text, "email queued");
        Ok(())
    }
}

pub fn verification_link(cfg: &EmailConfig, email: &str, token: &str) -> anyhow::Result<Url> {
    let base = Url::parse(&cfg.public_url)?;
    let mut link = base.join("/api/v0/auth/verify")?;
    link.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("email", email);
    Ok(link)
}

pub fn verification_email(cfg: &EmailConfig, to: &str, token: &str) -> anyhow::Result<OutgoingEmail> {
    let link = verification_link(cfg, to, token)?;
    Ok(OutgoingEmail {
        from: cfg.from.clone(),
        to: to.to_string(),
        subject: "Verify your email".into(),
        text: format!(
            "Please verify your email using the following link (expires in {} minutes): {}",
            cfg.token_ttl_minutes, link
        ),
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EmailConfig {
        EmailConfig {
            public_url: "https://finder.example".into(),
            from: "no-reply@finder.example".into(),
            token_ttl_minutes: 360,
        }
    }

    #[test]
    fn link_encodes_query() {
        let link = verification_link(&cfg(), "a+b@example.com", "abc123").unwrap();
        assert_eq!(link.path(), "/api/v0/auth/verify");
        let pairs: Vec<(String, String)> = link.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("token".to_string(), "abc123".to_string()),
                ("email".to_string(), "a+b@example.com".to_string()),
            ]
        );
    }

    #[test]
    fn email_mentions_expiry_and_link() {
        let mail = verification_email(&cfg(), "user@example.com", "tok").unwrap();
        assert_eq!(mail.to, "user@example.com");
        assert_eq!(mail.from, "no-reply@finder.example");
        assert!(mail.text.contains("360 minutes"));
        assert!(mail.text.contains("token=tok"));
    }
}
