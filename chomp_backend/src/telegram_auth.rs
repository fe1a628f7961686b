use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use chomp_models::user::TelegramProfile;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
pub struct TelegramAuthClaims {
    pub auth_date: String,
    pub first_name: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub hash: String,
}

/// Signs Telegram profile data the way the Chomp web app verifies it: a
/// data-check hash (HMAC-SHA256 keyed by the SHA-256 of the bot token over
/// the sorted non-empty profile fields) wrapped into an HS256 JWT signed
/// with the bot token itself.
pub struct TelegramAuthSigner {
    bot_token: String,
}

impl TelegramAuthSigner {
    pub fn new(bot_token: String) -> Self {
        Self { bot_token }
    }

    pub fn sign(
        &self,
        profile: &TelegramProfile,
        auth_date: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let auth_date = auth_date.timestamp_millis().to_string();
        let hash = self.data_check_hash(profile, &auth_date);

        let claims = TelegramAuthClaims {
            auth_date,
            first_name: profile.first_name.clone(),
            id: profile.id.to_string(),
            last_name: non_empty(profile.last_name.as_deref()),
            photo_url: None,
            username: non_empty(profile.username.as_deref()),
            hash,
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.bot_token.as_bytes()),
        )
    }

    fn data_check_hash(&self, profile: &TelegramProfile, auth_date: &str) -> String {
        let secret = Sha256::digest(self.bot_token.as_bytes());
        let mut mac =
            HmacSha256::new_from_slice(&secret).expect("HMAC accepts keys of any length");
        mac.update(data_check_string(profile, auth_date).as_bytes());

        mac.finalize()
            .into_bytes()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// `key=value` lines of the non-empty profile fields, sorted, joined with
/// newlines. The verifier rebuilds the exact same string.
fn data_check_string(profile: &TelegramProfile, auth_date: &str) -> String {
    let mut entries = vec![
        format!("auth_date={auth_date}"),
        format!("first_name={}", profile.first_name),
        format!("id={}", profile.id),
    ];
    if let Some(last_name) = profile.last_name.as_deref().filter(|v| !v.is_empty()) {
        entries.push(format!("last_name={last_name}"));
    }
    if let Some(username) = profile.username.as_deref().filter(|v| !v.is_empty()) {
        entries.push(format!("username={username}"));
    }

    entries.sort();
    entries.join("\n")
}
