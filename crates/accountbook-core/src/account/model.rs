//! Account model types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One fragment of a composite display label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelItem {
    /// Free-form label text.
    pub text: String,
}

impl LabelItem {
    /// Creates a label fragment.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Authentication mechanism an account represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountType {
    /// Directory-backed account.
    #[serde(rename = "LDAP")]
    Ldap,
    /// Locally authenticated account.
    #[default]
    #[serde(rename = "LOCAL")]
    Local,
}

impl AccountType {
    /// Get display name for the account type.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Ldap => "LDAP",
            Self::Local => "LOCAL",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when parsing an unknown account type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown account type `{0}` (expected `ldap` or `local`)")]
pub struct ParseAccountTypeError(String);

impl FromStr for AccountType {
    type Err = ParseAccountTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ldap") {
            Ok(Self::Ldap)
        } else if s.eq_ignore_ascii_case("local") {
            Ok(Self::Local)
        } else {
            Err(ParseAccountTypeError(s.to_string()))
        }
    }
}

/// A stored credential record.
///
/// The serialized field names match the persisted format exactly, including
/// the `type` tag and a `null` password for accounts that defer password entry.
/// Only `id` is required when reading; other missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, immutable after creation.
    pub id: AccountId,
    /// Ordered display-label fragments.
    #[serde(default)]
    pub label: Vec<LabelItem>,
    /// Authentication mechanism.
    #[serde(rename = "type", default)]
    pub kind: AccountType,
    /// Principal name.
    #[serde(default)]
    pub login: String,
    /// Password, if one is stored.
    #[serde(default)]
    pub password: Option<String>,
}

impl Account {
    /// Create a blank local account with the given ID.
    #[must_use]
    pub fn empty(id: AccountId) -> Self {
        Self {
            id,
            label: Vec::new(),
            kind: AccountType::Local,
            login: String::new(),
            password: Some(String::new()),
        }
    }

    /// Composite display name built from the label fragments.
    #[must_use]
    pub fn display_label(&self) -> String {
        self.label
            .iter()
            .map(|item| item.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    mod account_id_tests {
        use super::*;

        #[test]
        fn display() {
            let id = AccountId::new("abc-123");
            assert_eq!(format!("{id}"), "abc-123");
        }

        #[test]
        fn equality() {
            assert_eq!(AccountId::from("a"), AccountId::new("a".to_string()));
            assert_ne!(AccountId::from("a"), AccountId::from("b"));
        }

        #[test]
        fn serializes_as_plain_string() {
            let json = serde_json::to_string(&AccountId::from("x1")).unwrap();
            assert_eq!(json, "\"x1\"");
        }
    }

    mod account_type_tests {
        use super::*;

        #[test]
        fn default_is_local() {
            assert_eq!(AccountType::default(), AccountType::Local);
        }

        #[test]
        fn serialized_tags() {
            assert_eq!(serde_json::to_string(&AccountType::Ldap).unwrap(), "\"LDAP\"");
            assert_eq!(serde_json::to_string(&AccountType::Local).unwrap(), "\"LOCAL\"");
        }

        #[test]
        fn rejects_lowercase_tag_in_json() {
            assert!(serde_json::from_str::<AccountType>("\"ldap\"").is_err());
        }

        #[test]
        fn parse_is_case_insensitive() {
            assert_eq!("ldap".parse::<AccountType>().unwrap(), AccountType::Ldap);
            assert_eq!("LOCAL".parse::<AccountType>().unwrap(), AccountType::Local);
            assert!("kerberos".parse::<AccountType>().is_err());
        }
    }

    mod account_tests {
        use super::*;

        #[test]
        fn empty_is_blank_local() {
            let account = Account::empty(AccountId::from("id"));
            assert!(account.label.is_empty());
            assert_eq!(account.kind, AccountType::Local);
            assert!(account.login.is_empty());
            assert_eq!(account.password.as_deref(), Some(""));
        }

        #[test]
        fn wire_format() {
            let account = Account {
                id: AccountId::from("X"),
                label: vec![LabelItem::new("Svc")],
                kind: AccountType::Ldap,
                login: "svc".to_string(),
                password: None,
            };
            let value = serde_json::to_value(&account).unwrap();
            assert_eq!(
                value,
                serde_json::json!({
                    "id": "X",
                    "label": [{"text": "Svc"}],
                    "type": "LDAP",
                    "login": "svc",
                    "password": null
                })
            );
        }

        #[test]
        fn missing_fields_take_defaults() {
            let account: Account = serde_json::from_str(r#"{"id":"legacy","login":"x"}"#).unwrap();
            assert_eq!(account.id, AccountId::from("legacy"));
            assert!(account.label.is_empty());
            assert_eq!(account.kind, AccountType::Local);
            assert_eq!(account.login, "x");
            assert_eq!(account.password, None);
        }

        #[test]
        fn id_is_required() {
            assert!(serde_json::from_str::<Account>(r#"{"login":"x"}"#).is_err());
        }

        #[test]
        fn display_label_joins_fragments() {
            let mut account = Account::empty(AccountId::from("id"));
            assert_eq!(account.display_label(), "");
            account.label = vec![LabelItem::new("Build"), LabelItem::new("Server")];
            assert_eq!(account.display_label(), "Build Server");
        }
    }
}
