//! Domain models for the wellness service.

pub mod health;
pub mod meal;
pub mod message;
pub mod profile;
pub mod value;

pub use health::{HealthSample, SleepRecord};
pub use meal::{MealRecord, MealType, NutritionEstimate};
pub use message::{ContentPart, ImageUrl, MessageContent, ModelMessage, Role};
pub use profile::UserProfile;
pub use value::FreeValue;
