//! Output formatting for responses (pretty JSON, compact JSON, NDJSON).

use crate::batch::Delivery;
use crate::config::OutputFormat;
use crate::ebay::Response;
use crate::error::Result;
use serde_json::{json, Value};

/// Formats responses for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single response.
    pub fn format_response(&self, response: &Response) -> String {
        self.render(&[Value::Object(response.fields().clone())], false)
    }

    /// Formats a delivery: an object for one id, an array for many.
    pub fn format_delivery(&self, delivery: &Delivery<Response>) -> String {
        let values: Vec<Value> =
            delivery.iter().map(|response| Value::Object(response.fields().clone())).collect();
        self.render(&values, !delivery.is_one())
    }

    /// Formats a settled delivery, rendering failed slots as `{"error": ...}`.
    pub fn format_settled(&self, delivery: &Delivery<Result<Response>>) -> String {
        let values: Vec<Value> = delivery.iter().map(slot_value).collect();
        self.render(&values, !delivery.is_one())
    }

    fn render(&self, values: &[Value], as_array: bool) -> String {
        match self.format {
            OutputFormat::Ndjson => values
                .iter()
                .map(|value| serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string()))
                .collect::<Vec<_>>()
                .join("\n"),
            OutputFormat::Json | OutputFormat::Pretty => {
                let value = match (as_array, values) {
                    (false, [single]) => single.clone(),
                    _ => Value::Array(values.to_vec()),
                };
                let rendered = if self.format == OutputFormat::Pretty {
                    serde_json::to_string_pretty(&value)
                } else {
                    serde_json::to_string(&value)
                };
                rendered.unwrap_or_else(|_| "null".to_string())
            }
        }
    }
}

fn slot_value(slot: &Result<Response>) -> Value {
    match slot {
        Ok(response) => Value::Object(response.fields().clone()),
        Err(err) => json!({ "error": err.to_string() }),
    }
}
