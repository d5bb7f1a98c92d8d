//! Repository custom properties.

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Value of a custom property: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Single(String),
    Multiple(Vec<String>),
}

impl PropertyValue {
    /// The single value, if this is not a list.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(_) => None,
        }
    }

    /// The list of values, if this is a list.
    pub fn as_multiple(&self) -> Option<&[String]> {
        match self {
            Self::Single(_) => None,
            Self::Multiple(values) => Some(values),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertyValueVisitor;

        impl<'de> Visitor<'de> for PropertyValueVisitor {
            type Value = PropertyValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or an array of strings")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PropertyValue, E> {
                Ok(PropertyValue::Single(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<PropertyValue, E> {
                Ok(PropertyValue::Single(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PropertyValue, A::Error> {
                let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(value) = seq.next_element::<String>()? {
                    values.push(value);
                }
                Ok(PropertyValue::Multiple(values))
            }
        }

        deserializer.deserialize_any(PropertyValueVisitor)
    }
}

/// A named custom property and its value.
///
/// A `None` value is sent as `null`, which unsets the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPropertyValue {
    pub property_name: String,
    #[serde(default)]
    pub value: Option<PropertyValue>,
}

/// The custom property values of one repository, as listed for an
/// organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCustomPropertyValue {
    pub repository_id: u64,
    pub repository_name: String,
    pub repository_full_name: String,
    #[serde(default)]
    pub properties: Vec<CustomPropertyValue>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CustomPropertyValues<'a> {
    pub properties: &'a [CustomPropertyValue],
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_shapes() {
        let values: Vec<CustomPropertyValue> = serde_json::from_value(json!([
            {"property_name": "environment", "value": "production"},
            {"property_name": "service", "value": ["web", "worker"]},
            {"property_name": "team", "value": null},
            {"property_name": "owner"}
        ]))
        .unwrap();

        assert_eq!(values[0].value.as_ref().unwrap().as_single(), Some("production"));
        assert_eq!(
            values[1].value.as_ref().unwrap().as_multiple().unwrap(),
            ["web".to_string(), "worker".to_string()]
        );
        assert!(values[2].value.is_none());
        assert!(values[3].value.is_none());
    }

    #[test]
    fn test_non_string_elements_are_rejected() {
        let value = json!({"property_name": "service", "value": ["web", 7]});
        let err = serde_path_to_error::deserialize::<_, CustomPropertyValue>(value).unwrap_err();
        assert_eq!(err.path().to_string(), "value[1]");

        let value = json!({"property_name": "service", "value": {"a": 1}});
        assert!(serde_json::from_value::<CustomPropertyValue>(value).is_err());
    }

    #[test]
    fn test_unset_serializes_null() {
        let unset = CustomPropertyValue {
            property_name: "team".into(),
            value: None,
        };
        assert_eq!(
            serde_json::to_value(&unset).unwrap(),
            json!({"property_name": "team", "value": null})
        );
    }
}
