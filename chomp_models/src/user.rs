use serde::{Deserialize, Serialize};

pub type TelegramId = i64;

/// Profile fields forwarded to the backend when identifying a player. These
/// are exactly the fields that go into the signed auth token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramProfile {
    pub id: TelegramId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub address: String,
}

/// A Chomp account as the backend reports it. The backend owns this record;
/// the bot only caches it for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChompUser {
    pub id: String,
    #[serde(default)]
    pub telegram_id: Option<TelegramId>,
    #[serde(default)]
    pub telegram_username: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_bot_subscriber: bool,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
}

impl ChompUser {
    pub fn has_wallet(&self) -> bool {
        !self.wallets.is_empty()
    }

    /// Best display name available for this account.
    pub fn display_name(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or(self.telegram_username.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedUser {
    pub telegram_id: TelegramId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> ChompUser {
        ChompUser {
            id: "user-1".to_string(),
            telegram_id: Some(1),
            telegram_username: Some("ada_tg".to_string()),
            username: Some("ada".to_string()),
            is_bot_subscriber: false,
            wallets: Vec::new(),
        }
    }

    #[test]
    fn display_name_prefers_the_chomp_username() {
        let mut user = user();
        assert_eq!(user.display_name(), Some("ada"));

        user.username = None;
        assert_eq!(user.display_name(), Some("ada_tg"));

        user.telegram_username = None;
        assert_eq!(user.display_name(), None);
    }

    #[test]
    fn a_user_without_wallets_has_no_wallet() {
        let mut user = user();
        assert!(!user.has_wallet());

        user.wallets.push(Wallet {
            address: "So1aNaAddr".to_string(),
        });
        assert!(user.has_wallet());
    }
}
