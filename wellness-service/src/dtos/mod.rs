pub mod coach;
pub mod daily;
pub mod event;
pub mod health;
pub mod meal;

pub use coach::CoachRequest;
pub use daily::{DailyAnalysisRequest, DailySummaryResponse};
pub use event::{EventRecommendationResponse, EventRequest};
pub use health::{DailyStats, HealthAnalysisRequest, HealthAnalysisResponse};
pub use meal::{MealAnalysisResponse, MealUpload};
