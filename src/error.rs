use thiserror::Error;

#[derive(Debug, Error)]
pub enum FoodyError {
    #[error("Food name must not be empty")]
    EmptyFoodName,

    #[error("'{0}' is already on the food list")]
    DuplicateFood(String),

    #[error("'{0}' is not on the food list")]
    FoodNotFound(String),

    #[error("{date} is in the past, its history is read-only")]
    DateInPast { date: String },

    #[error("All {limit} spins for {date} have been used")]
    DailyLimitReached { date: String, limit: usize },

    #[error("Chat message must not be empty")]
    EmptyChatMessage,

    #[error("The food list is empty, add a food before spinning")]
    EmptyFoodList,

    #[error("{year}-{month:02}-{day:02} is not a valid calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("Failed to access data file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Data file {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Chat service request failed: {0}")]
    ChatService(String),

    #[error("Template rendering failed: {0}")]
    Template(#[from] minijinja::Error),
}

impl FoodyError {
    /// Validation failures are shown inline and leave state untouched.
    /// Everything else aborts the current action.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            FoodyError::EmptyFoodName
                | FoodyError::DuplicateFood(_)
                | FoodyError::FoodNotFound(_)
                | FoodyError::DateInPast { .. }
                | FoodyError::DailyLimitReached { .. }
                | FoodyError::EmptyChatMessage
        )
    }
}

pub type Result<T> = std::result::Result<T, FoodyError>;
