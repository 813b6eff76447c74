// Runtime settings, loaded from the environment (or .env) with defaults.

use std::env;

/// Spins allowed per calendar date.
pub const DAILY_SPIN_LIMIT: usize = 5;

/// Chat turns rendered in the transcript. The full log is still sent upstream.
pub const CHAT_DISPLAY_LIMIT: usize = 10;

/// Timeout for the time API request.
pub const TIME_API_TIMEOUT_SECS: u64 = 5;

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_DAY: u32 = 31;

/// Seeded into a fresh data file.
pub const DEFAULT_FOODS: [&str; 5] = ["Cơm tấm", "Bún bò", "Phở", "Hủ tiếu", "Gà rán"];

// Use lazy_static to initialize static variables safely.
lazy_static::lazy_static! {
    pub static ref DATA_FILE: String = env::var("FOODY_DATA_FILE").unwrap_or_else(|_| "food_data.json".to_string());
    pub static ref TIME_API_URL: String = env::var("FOODY_TIME_API_URL").unwrap_or_else(|_| {
        "https://www.timeapi.io/api/Time/current/zone?timeZone=Asia/Ho_Chi_Minh".to_string()
    });
    pub static ref CHAT_API_URL: String = env::var("FOODY_CHAT_API_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    pub static ref CHAT_MODEL: String = env::var("FOODY_CHAT_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());
    pub static ref OPENAI_API_KEY: String = env::var("OPENAI_API_KEY").unwrap_or_default();
    pub static ref TEMPLATES_DIR: String = env::var("FOODY_TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string());
    pub static ref STATIC_DIR: String = env::var("FOODY_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
}
