//! Typed, lenient view of a résumé document.
//!
//! The agents exchange résumés as free-form JSON objects; this view is what the
//! renderer reads. Every field is optional and scalar fields accept numbers as
//! well as strings, so a sparse or loosely typed document still renders.
//! Section entries that are not objects are dropped.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Resume {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_record")]
    pub contact: Contact,
    #[serde(deserialize_with = "lenient_string")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient_records")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "skill_groups")]
    pub skills: Vec<SkillGroup>,
    #[serde(deserialize_with = "lenient_records")]
    pub experience: Vec<Experience>,
    #[serde(deserialize_with = "lenient_records")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "lenient_strings")]
    pub certifications: Vec<String>,
}

impl Resume {
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Contact {
    #[serde(deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub linkedin: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Education {
    #[serde(deserialize_with = "lenient_string")]
    pub degree: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub institution: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub duration: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillGroup {
    pub key: String,
    pub items: Vec<String>,
}

impl SkillGroup {
    /// Display label for the group key: `bi_tools` → `BI Tools`.
    pub fn label(&self) -> String {
        match self.key.as_str() {
            "programming" => "Programming".to_string(),
            "bi_tools" => "BI Tools".to_string(),
            "relevant_courses" => "Relevant Courses".to_string(),
            other => other
                .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
                .filter(|word| !word.is_empty())
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Experience {
    #[serde(deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub duration: Option<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn record<T: DeserializeOwned>(value: Value) -> Option<T> {
    match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

/// An object decodes as usual; any other shape reads as empty.
fn lenient_record<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    Ok(record(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Keeps the entries that are objects. A lone object counts as one entry.
fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(record).collect(),
        value @ Value::Object(_) => record(value).into_iter().collect(),
        _ => Vec::new(),
    };
    Ok(entries)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value))
}

pub(super) fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_items(&value))
}

fn text_items(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

fn skill_groups<'de, D>(deserializer: D) -> Result<Vec<SkillGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let groups = match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, items)| SkillGroup {
                key: key.clone(),
                items: text_items(items),
            })
            .filter(|group| !group.items.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let items = text_items(&other);
            if items.is_empty() {
                Vec::new()
            } else {
                vec![SkillGroup {
                    key: "skills".to_string(),
                    items,
                }]
            }
        }
    };
    Ok(groups)
}
