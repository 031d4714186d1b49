// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Result payload rendering
//!
//! Agents return results as strings that are usually JSON-encoded, tagged
//! with an optional result type. [`render`] turns a payload into a
//! [`DisplayForm`] and never fails: payloads that are not JSON, or whose
//! shape does not match the declared type, fall back to plain text.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Result type tags understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    List,
    KeyValue,
    Json,
    Error,
    Table,
    Text,
}

impl ResultType {
    /// Parse a tag; unrecognized tags yield `None` and use the default form
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "list" => Some(ResultType::List),
            "key_value" | "structured" => Some(ResultType::KeyValue),
            "json" => Some(ResultType::Json),
            "error" => Some(ResultType::Error),
            "table" => Some(ResultType::Table),
            "text" => Some(ResultType::Text),
            _ => None,
        }
    }
}

/// Structured display form of a result payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DisplayForm {
    PlainText(String),
    List(Vec<String>),
    KeyValue(Vec<(String, String)>),
    Json(String),
    Error(String),
}

/// Render a raw payload according to its declared type
pub fn render(raw: &str, result_type: Option<&str>) -> DisplayForm {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => return DisplayForm::PlainText(raw.to_string()),
    };

    match result_type.and_then(ResultType::parse) {
        Some(ResultType::List) => match value {
            Value::Array(items) => DisplayForm::List(items.iter().map(compact).collect()),
            other => default_form(&other),
        },
        Some(ResultType::KeyValue) => match value {
            Value::Object(map) => DisplayForm::KeyValue(
                map.iter().map(|(key, value)| (key.clone(), field_text(value))).collect(),
            ),
            other => default_form(&other),
        },
        Some(ResultType::Json) => DisplayForm::Json(pretty(&value)),
        Some(ResultType::Error) => DisplayForm::Error(text_or_pretty(&value)),
        Some(ResultType::Table | ResultType::Text) | None => default_form(&value),
    }
}

fn default_form(value: &Value) -> DisplayForm {
    DisplayForm::PlainText(text_or_pretty(value))
}

fn text_or_pretty(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => pretty(other),
    }
}

/// List item: strings verbatim, everything else as compact JSON
fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Record field: nested values as pretty JSON, scalars as text
fn field_text(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => pretty(value),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl fmt::Display for DisplayForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayForm::PlainText(text) | DisplayForm::Json(text) => f.write_str(text),
            DisplayForm::Error(text) => write!(f, "error: {}", text),
            DisplayForm::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "  - {}", item)?;
                }
                Ok(())
            }
            DisplayForm::KeyValue(pairs) => {
                let width = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    // Continuation lines of nested values line up under the value column
                    let indent = " ".repeat(width + 4);
                    let value = value.replace('\n', &format!("\n{}", indent));
                    write!(f, "  {:width$}: {}", key, value, width = width)?;
                }
                Ok(())
            }
        }
    }
}
