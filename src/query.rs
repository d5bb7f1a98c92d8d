//! Query-string encoding for typed option records.
//!
//! Option records are plain `Serialize` structs. Each field becomes one
//! `key=value` pair under its serde name:
//!
//! - `None` fields are omitted, as is anything a `skip_serializing_if`
//!   attribute drops;
//! - booleans and numbers render in their canonical text form;
//! - sequences render comma-joined (`labels=bug,ui`), unless the field is
//!   renamed with a trailing `[]`, in which case every element becomes its
//!   own pair (`owner[]=a&owner[]=b`);
//! - nested records are rejected.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

const REPEATED_KEY_SUFFIX: &str = "[]";

/// `skip_serializing_if` helper for zero-valued numeric fields.
pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Encode an option record as a query string, without the leading `?`.
///
/// # Errors
///
/// Returns [`Error::QueryEncode`] if the record does not serialize to a flat
/// set of scalar or sequence fields.
pub fn encode<T: Serialize + ?Sized>(options: &T) -> Result<String> {
    let value = serde_path_to_error::serialize(options, serde_json::value::Serializer).map_err(
        |err| Error::QueryEncode {
            field: err.path().to_string(),
            message: err.into_inner().to_string(),
        },
    )?;

    let fields = match value {
        Value::Null => return Ok(String::new()),
        Value::Object(fields) => fields,
        other => {
            return Err(Error::QueryEncode {
                field: ".".to_string(),
                message: format!("expected a record of options, found {}", kind(&other)),
            })
        }
    };

    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        if let Some(name) = key.strip_suffix(REPEATED_KEY_SUFFIX) {
            let name = urlencoding::encode(name);
            for item in sequence(&key, value)? {
                pairs.push(format!("{name}[]={}", urlencoding::encode(&item)));
            }
            continue;
        }

        let rendered = match value {
            Value::Array(_) => {
                let items = sequence(&key, value)?;
                if items.is_empty() {
                    continue;
                }
                items.join(",")
            }
            other => match scalar(&key, &other)? {
                Some(text) => text,
                None => continue,
            },
        };
        pairs.push(format!(
            "{}={}",
            urlencoding::encode(&key),
            urlencoding::encode(&rendered)
        ));
    }

    Ok(pairs.join("&"))
}

/// Append the encoded options to `path`.
///
/// `None`, or a record whose fields are all omitted, leaves the path
/// untouched. Otherwise the query is joined with `?`, or with `&` when the
/// path already carries one.
///
/// # Errors
///
/// Propagates [`encode`] failures.
pub fn add_options<T: Serialize + ?Sized>(path: &str, options: Option<&T>) -> Result<String> {
    let Some(options) = options else {
        return Ok(path.to_string());
    };

    let query = encode(options)?;
    if query.is_empty() {
        return Ok(path.to_string());
    }

    let separator = if path.contains('?') { '&' } else { '?' };
    Ok(format!("{path}{separator}{query}"))
}

fn scalar(field: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(Error::QueryEncode {
            field: field.to_string(),
            message: format!("cannot encode {} as a query value", kind(other)),
        }),
    }
}

fn sequence(field: &str, value: Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => {
            let mut rendered = Vec::with_capacity(items.len());
            for item in &items {
                if let Some(text) = scalar(field, item)? {
                    rendered.push(text);
                }
            }
            Ok(rendered)
        }
        other => Ok(scalar(field, &other)?.into_iter().collect()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a nested record",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize, Default)]
    struct IssueFilter {
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        labels: Vec<String>,
        #[serde(skip_serializing_if = "is_default")]
        page: u32,
        since: Option<String>,
        archived: Option<bool>,
    }

    #[derive(Serialize, Default)]
    struct OwnerFilter {
        #[serde(rename = "owner[]", skip_serializing_if = "Vec::is_empty")]
        owner: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<String>,
    }

    #[derive(Serialize)]
    struct Nested {
        inner: HashMap<String, String>,
    }

    fn pairs(query: &str) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn test_encode_flat_fields() {
        let filter = IssueFilter {
            state: Some("open".into()),
            labels: vec!["bug".into(), "ui".into()],
            page: 2,
            since: None,
            archived: Some(false),
        };
        let query = encode(&filter).unwrap();

        assert_eq!(
            pairs(&query),
            vec![
                ("archived".to_string(), "false".to_string()),
                ("labels".to_string(), "bug,ui".to_string()),
                ("page".to_string(), "2".to_string()),
                ("state".to_string(), "open".to_string()),
            ]
        );
    }

    #[test]
    fn test_encode_omits_empty_fields() {
        assert_eq!(encode(&IssueFilter::default()).unwrap(), "");
    }

    #[test]
    fn test_repeated_keys_and_escaping() {
        let filter = OwnerFilter {
            owner: vec!["octocat".into(), "bob@x".into()],
            sort: Some("created_at".into()),
        };
        let query = encode(&filter).unwrap();

        assert!(query.contains("owner[]=octocat"));
        assert!(query.contains("owner[]=bob%40x"));
        assert!(query.contains("sort=created_at"));
    }

    #[test]
    fn test_nested_record_is_rejected() {
        let nested = Nested {
            inner: HashMap::from([("a".to_string(), "b".to_string())]),
        };
        let err = encode(&nested).unwrap_err();
        assert!(matches!(err, Error::QueryEncode { ref field, .. } if field == "inner"));
    }

    #[test]
    fn test_non_record_is_rejected() {
        assert!(matches!(encode(&42).unwrap_err(), Error::QueryEncode { .. }));
    }

    #[test]
    fn test_add_options() {
        let filter = OwnerFilter {
            owner: vec![],
            sort: Some("id".into()),
        };

        assert_eq!(
            add_options("orgs/o/pats", Some(&filter)).unwrap(),
            "orgs/o/pats?sort=id"
        );
        assert_eq!(
            add_options("orgs/o/pats?state=open", Some(&filter)).unwrap(),
            "orgs/o/pats?state=open&sort=id"
        );
        assert_eq!(
            add_options::<OwnerFilter>("orgs/o/pats", None).unwrap(),
            "orgs/o/pats"
        );
        assert_eq!(
            add_options("orgs/o/pats", Some(&OwnerFilter::default())).unwrap(),
            "orgs/o/pats"
        );
    }
}
