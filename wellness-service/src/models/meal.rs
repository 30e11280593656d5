use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    /// Capitalised label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => Err(format!(
                "Invalid meal type '{}': expected breakfast, lunch, dinner or snack",
                s
            )),
        }
    }
}

impl TryFrom<String> for MealType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Macronutrient estimate for a meal or a whole day. Grams, except calories (kcal).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fibers: f64,
}

impl NutritionEstimate {
    pub fn is_non_negative(&self) -> bool {
        [
            self.calories,
            self.proteins,
            self.carbs,
            self.fats,
            self.fibers,
        ]
        .iter()
        .all(|v| *v >= 0.0)
    }
}

impl<'a> Sum<&'a NutritionEstimate> for NutritionEstimate {
    fn sum<I: Iterator<Item = &'a NutritionEstimate>>(iter: I) -> Self {
        iter.fold(NutritionEstimate::default(), |acc, n| NutritionEstimate {
            calories: acc.calories + n.calories,
            proteins: acc.proteins + n.proteins,
            carbs: acc.carbs + n.carbs,
            fats: acc.fats + n.fats,
            fibers: acc.fibers + n.fibers,
        })
    }
}

/// A previously analysed meal, as sent back by clients for the daily summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    pub user_id: String,
    pub meal_type: MealType,
    pub timestamp: String,
    pub dish_name: String,
    pub ingredients: Vec<String>,
    pub nutrition: NutritionEstimate,
    pub health_advice: String,
    pub recommendation: String,
    #[serde(default)]
    pub allergies_detected: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_parses_case_insensitively() {
        assert_eq!("Lunch".parse::<MealType>().unwrap(), MealType::Lunch);
        assert_eq!(
            serde_json::from_str::<MealType>("\"SNACK\"").unwrap(),
            MealType::Snack
        );
        assert!("brunch".parse::<MealType>().is_err());
        assert_eq!(serde_json::to_string(&MealType::Dinner).unwrap(), "\"dinner\"");
    }

    #[test]
    fn test_nutrition_sum_is_exact() {
        let meals = [
            NutritionEstimate {
                calories: 420.5,
                proteins: 20.0,
                carbs: 50.25,
                fats: 12.0,
                fibers: 6.0,
            },
            NutritionEstimate {
                calories: 610.0,
                proteins: 35.5,
                carbs: 70.0,
                fats: 22.75,
                fibers: 9.5,
            },
        ];

        let total: NutritionEstimate = meals.iter().sum();

        assert_eq!(total.calories, 420.5 + 610.0);
        assert_eq!(total.proteins, 20.0 + 35.5);
        assert_eq!(total.carbs, 50.25 + 70.0);
        assert_eq!(total.fats, 12.0 + 22.75);
        assert_eq!(total.fibers, 6.0 + 9.5);
        assert!(total.is_non_negative());
    }
}
