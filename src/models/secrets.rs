//! Encrypted secrets and the public keys used to seal them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, skip_serializing_none, DisplayFromStr};

use super::Repository;

/// Identifier of a repository or organization public key.
///
/// Most endpoints send `key_id` as a string; some send a bare number. Both
/// decode to the same decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<KeyId> for String {
    fn from(id: KeyId) -> Self {
        id.0
    }
}

impl<'de> Deserialize<'de> for KeyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyIdVisitor;

        impl Visitor<'_> for KeyIdVisitor {
            type Value = KeyId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a key id as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<KeyId, E> {
                Ok(KeyId(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<KeyId, E> {
                Ok(KeyId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<KeyId, E> {
                Ok(KeyId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<KeyId, E> {
                Ok(KeyId(v.to_string()))
            }

            // f64's Display is the shortest exact decimal, never exponent
            // notation and never a trailing `.0`.
            fn visit_f64<E: de::Error>(self, v: f64) -> Result<KeyId, E> {
                Ok(KeyId(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyIdVisitor)
    }
}

/// Public key for sealing secrets before upload.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    #[serde(default)]
    pub key_id: Option<KeyId>,
    /// Base64-encoded libsodium public key.
    #[serde(default)]
    pub key: Option<String>,
}

/// Metadata of a stored secret. The value itself is never returned.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub selected_repositories_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

/// A secret value sealed with the target's [`PublicKey`].
///
/// `name` addresses the secret in the URL and is not part of the body.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    #[serde(skip)]
    pub name: String,
    pub key_id: String,
    pub encrypted_value: String,
    /// Organization secrets only: `all`, `private` or `selected`.
    #[serde(default)]
    pub visibility: Option<String>,
    /// Organization secrets with `selected` visibility.
    #[serde(default)]
    pub selected_repository_ids: Option<Vec<u64>>,
}

/// Body of the Dependabot organization secret endpoint, which expects the
/// selected repository ids as strings.
#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DependabotSecretBody<'a> {
    pub key_id: &'a str,
    pub encrypted_value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<&'a str>,
    #[serde_as(as = "Option<Vec<DisplayFromStr>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_repository_ids: Option<Vec<u64>>,
}

impl<'a> From<&'a EncryptedSecret> for DependabotSecretBody<'a> {
    fn from(secret: &'a EncryptedSecret) -> Self {
        Self {
            key_id: &secret.key_id,
            encrypted_value: &secret.encrypted_value,
            visibility: secret.visibility.as_deref(),
            selected_repository_ids: secret.selected_repository_ids.clone(),
        }
    }
}

/// Repositories that may read an organization secret.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectedReposList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

/// Replacement list of repository ids for an organization secret.
///
/// Always serialized, so an empty list clears the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedRepoIds {
    pub selected_repository_ids: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_string_or_number() {
        let key: PublicKey = serde_json::from_str(r#"{"key_id":"012345678","key":"k"}"#).unwrap();
        assert_eq!(key.key_id.unwrap().as_str(), "012345678");

        let key: PublicKey = serde_json::from_str(r#"{"key_id":1234,"key":"k"}"#).unwrap();
        assert_eq!(key.key_id.unwrap().as_str(), "1234");

        let key: PublicKey = serde_json::from_str(r#"{"key_id":12.5}"#).unwrap();
        assert_eq!(key.key_id.unwrap().as_str(), "12.5");

        let key: PublicKey = serde_json::from_str(r#"{"key_id":null,"key":"k"}"#).unwrap();
        assert!(key.key_id.is_none());
    }

    #[test]
    fn test_key_id_rejects_other_types() {
        let mut de = serde_json::Deserializer::from_str(r#"{"key_id":true}"#);
        let err = serde_path_to_error::deserialize::<_, PublicKey>(&mut de).unwrap_err();
        assert_eq!(err.path().to_string(), "key_id");
        assert!(err.to_string().contains("boolean"));

        assert!(serde_json::from_str::<PublicKey>(r#"{"key_id":["a"]}"#).is_err());
    }

    #[test]
    fn test_encrypted_secret_body_omits_name() {
        let secret = EncryptedSecret {
            name: "FOO".into(),
            key_id: "k".into(),
            encrypted_value: "v".into(),
            ..EncryptedSecret::default()
        };
        assert_eq!(
            serde_json::to_string(&secret).unwrap(),
            r#"{"key_id":"k","encrypted_value":"v"}"#
        );
    }

    #[test]
    fn test_dependabot_body_stringifies_ids() {
        let secret = EncryptedSecret {
            name: "FOO".into(),
            key_id: "k".into(),
            encrypted_value: "v".into(),
            visibility: Some("selected".into()),
            selected_repository_ids: Some(vec![1296269, 1269280]),
        };
        let body = serde_json::to_value(DependabotSecretBody::from(&secret)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "key_id": "k",
                "encrypted_value": "v",
                "visibility": "selected",
                "selected_repository_ids": ["1296269", "1269280"],
            })
        );
    }

    #[test]
    fn test_selected_repo_ids_always_serialized() {
        assert_eq!(
            serde_json::to_string(&SelectedRepoIds::default()).unwrap(),
            r#"{"selected_repository_ids":[]}"#
        );
    }
}
