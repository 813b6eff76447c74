//! Daily food picker: a persisted list of candidate foods, a capped random
//! pick per calendar date, and a small chat panel, served as one web page.

pub mod app_state;
pub mod chat;
pub mod constants;
pub mod date_resolver;
pub mod error;
pub mod llm_interaction;
pub mod picker;
pub mod store;
pub mod web_server;

pub use app_state::{AppState, PageView};
pub use chat::{ChatService, ChatSession, ChatTurn, Role};
pub use date_resolver::{FixedDate, TimeApiDateResolver, TodaySource};
pub use error::{FoodyError, Result};
pub use store::{FoodDocument, FoodRepository, JsonFileStore};
