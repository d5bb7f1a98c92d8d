//! GitHub Packages versions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::skip_serializing_none;

use super::Repository;
use crate::pagination::ListOptions;

/// A version of a package.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageVersion {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub package_html_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub body: Option<PackageVersionBody>,
}

impl PackageVersion {
    /// The body, when the server sent it as plain text.
    pub fn body_text(&self) -> Option<&str> {
        match self.body.as_ref()? {
            PackageVersionBody::Text(text) => Some(text),
            PackageVersionBody::Structured(_) => None,
        }
    }

    /// The body, when the server sent it as a structured record.
    pub fn body_structured(&self) -> Option<&PackageVersionDetails> {
        match self.body.as_ref()? {
            PackageVersionBody::Text(_) => None,
            PackageVersionBody::Structured(details) => Some(details),
        }
    }
}

/// The `body` of a package version: either free text or a record
/// describing the repository and the stored artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PackageVersionBody {
    Text(String),
    Structured(Box<PackageVersionDetails>),
}

impl<'de> Deserialize<'de> for PackageVersionBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BodyVisitor;

        impl<'de> Visitor<'de> for BodyVisitor {
            type Value = PackageVersionBody;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or a package version record")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PackageVersionBody, E> {
                Ok(PackageVersionBody::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<PackageVersionBody, E> {
                Ok(PackageVersionBody::Text(v))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<PackageVersionBody, A::Error> {
                let details =
                    PackageVersionDetails::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(PackageVersionBody::Structured(Box::new(details)))
            }
        }

        deserializer.deserialize_any(BodyVisitor)
    }
}

/// Structured form of a package version body.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageVersionDetails {
    #[serde(rename = "repository", default)]
    pub repo: Option<Repository>,
    #[serde(default)]
    pub info: Option<PackageVersionInfo>,
}

/// Storage details of a package artifact.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersionInfo {
    #[serde(rename = "type", default)]
    pub info_type: Option<String>,
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub mode: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub collection: Option<bool>,
}

/// Options for listing package versions.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageListOptions {
    /// `active` or `deleted`.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(flatten)]
    pub list: ListOptions,
}
