// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Food analysis records produced by the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// A persisted nutrition estimate for one uploaded meal photo.
///
/// Records are immutable once stored: the store assigns `id` and
/// `created_at` and nothing updates them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodAnalysis {
    pub id: String,
    /// Owning user, if any (uploads are anonymous today)
    pub user_id: Option<String>,
    /// Where the source image was staged
    pub image_path: String,
    pub detected_food: String,
    /// Model confidence in [0, 1]
    pub confidence: f64,
    pub total_calories: f64,
    /// Grams
    pub protein: f64,
    /// Grams
    pub carbs: f64,
    /// Grams
    pub fats: f64,
    /// Grams
    pub fiber: Option<f64>,
    /// Grams
    pub sugar: Option<f64>,
    /// Milligrams
    pub sodium: Option<f64>,
    /// Milligrams
    pub cholesterol: Option<f64>,
    pub ingredients: Vec<String>,
    pub portion_size: String,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// Insert shape for [`FoodAnalysis`]: everything but `id` and `created_at`.
///
/// The `validate` derive is the record schema checked before persistence.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewFoodAnalysis {
    pub user_id: Option<String>,
    #[validate(length(min = 1, message = "imagePath must not be empty"))]
    pub image_path: String,
    #[validate(length(min = 1, max = 200, message = "detectedFood must be 1-200 characters"))]
    pub detected_food: String,
    #[validate(range(min = 0.0, max = 1.0, message = "confidence must be within [0, 1]"))]
    pub confidence: f64,
    #[validate(range(min = 0.0, message = "totalCalories must be non-negative"))]
    pub total_calories: f64,
    #[validate(range(min = 0.0, message = "protein must be non-negative"))]
    pub protein: f64,
    #[validate(range(min = 0.0, message = "carbs must be non-negative"))]
    pub carbs: f64,
    #[validate(range(min = 0.0, message = "fats must be non-negative"))]
    pub fats: f64,
    #[validate(range(min = 0.0, message = "fiber must be non-negative"))]
    pub fiber: Option<f64>,
    #[validate(range(min = 0.0, message = "sugar must be non-negative"))]
    pub sugar: Option<f64>,
    #[validate(range(min = 0.0, message = "sodium must be non-negative"))]
    pub sodium: Option<f64>,
    #[validate(range(min = 0.0, message = "cholesterol must be non-negative"))]
    pub cholesterol: Option<f64>,
    pub ingredients: Vec<String>,
    #[validate(length(min = 1, message = "portionSize must not be empty"))]
    pub portion_size: String,
}

impl NewFoodAnalysis {
    /// Attach the store-assigned identity.
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> FoodAnalysis {
        FoodAnalysis {
            id,
            user_id: self.user_id,
            image_path: self.image_path,
            detected_food: self.detected_food,
            confidence: self.confidence,
            total_calories: self.total_calories,
            protein: self.protein,
            carbs: self.carbs,
            fats: self.fats,
            fiber: self.fiber,
            sugar: self.sugar,
            sodium: self.sodium,
            cholesterol: self.cholesterol,
            ingredients: self.ingredients,
            portion_size: self.portion_size,
            created_at,
        }
    }
}
