// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turn an untrusted model response into a validated [`NewFoodAnalysis`].
//!
//! Missing or `null` fields get fixed defaults. A field of the wrong type is
//! a schema violation; nothing else is coerced.

use crate::error::AppError;
use crate::models::NewFoodAnalysis;
use serde::Deserialize;
use validator::Validate;

pub const UNKNOWN_FOOD: &str = "Unknown food";
pub const DEFAULT_PORTION: &str = "1 serving";

/// Model output as received. Every field is optional; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEstimate {
    detected_food: Option<String>,
    confidence: Option<f64>,
    total_calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fats: Option<f64>,
    fiber: Option<f64>,
    sugar: Option<f64>,
    sodium: Option<f64>,
    cholesterol: Option<f64>,
    ingredients: Option<Vec<String>>,
    portion_size: Option<String>,
}

/// Result of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub analysis: NewFoodAnalysis,
    /// Required fields the model left out, in declaration order.
    pub defaulted: Vec<&'static str>,
}

/// Apply defaults to a raw model response and check it against the record
/// schema.
pub fn normalize(
    raw: serde_json::Value,
    image_path: String,
    user_id: Option<String>,
) -> Result<Normalized, AppError> {
    if !raw.is_object() {
        return Err(AppError::SchemaViolation(format!(
            "expected a JSON object, got {}",
            json_kind(&raw)
        )));
    }

    let est: RawEstimate =
        serde_json::from_value(raw).map_err(|e| AppError::SchemaViolation(e.to_string()))?;

    let mut defaulted = Vec::new();

    let detected_food = text_or(est.detected_food, UNKNOWN_FOOD, "detectedFood", &mut defaulted);
    let confidence = number_or_zero(est.confidence, "confidence", &mut defaulted);
    let total_calories = number_or_zero(est.total_calories, "totalCalories", &mut defaulted);
    let protein = number_or_zero(est.protein, "protein", &mut defaulted);
    let carbs = number_or_zero(est.carbs, "carbs", &mut defaulted);
    let fats = number_or_zero(est.fats, "fats", &mut defaulted);
    let ingredients = est.ingredients.unwrap_or_else(|| {
        defaulted.push("ingredients");
        Vec::new()
    });
    let portion_size = text_or(est.portion_size, DEFAULT_PORTION, "portionSize", &mut defaulted);

    let analysis = NewFoodAnalysis {
        user_id,
        image_path,
        detected_food,
        confidence,
        total_calories,
        protein,
        carbs,
        fats,
        fiber: est.fiber,
        sugar: est.sugar,
        sodium: est.sodium,
        cholesterol: est.cholesterol,
        ingredients,
        portion_size,
    };

    analysis
        .validate()
        .map_err(|e| AppError::SchemaViolation(e.to_string()))?;

    Ok(Normalized {
        analysis,
        defaulted,
    })
}

fn number_or_zero(value: Option<f64>, field: &'static str, defaulted: &mut Vec<&'static str>) -> f64 {
    value.unwrap_or_else(|| {
        defaulted.push(field);
        0.0
    })
}

/// Blank strings count as missing.
fn text_or(
    value: Option<String>,
    default: &str,
    field: &'static str,
    defaulted: &mut Vec<&'static str>,
) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => {
            defaulted.push(field);
            default.to_string()
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
