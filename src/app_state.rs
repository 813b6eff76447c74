use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::chat::{ChatService, ChatSession, ChatTurn};
use crate::constants::{MAX_DAY, MAX_YEAR, MIN_YEAR};
use crate::date_resolver::iso_date;
use crate::error::Result;
use crate::picker::{self, NumberedPick, PickerView, SpinOutcome};
use crate::store::{FoodDocument, FoodRepository};

/// Everything one running instance owns: the food document, the repository
/// it is flushed to, and the chat session. Every mutating action saves
/// before returning.
pub struct AppState {
    doc: FoodDocument,
    repo: Arc<dyn FoodRepository>,
    chat: ChatSession,
}

impl AppState {
    pub fn load(repo: Arc<dyn FoodRepository>) -> Result<Self> {
        let doc = repo.load()?;
        info!(foods = doc.food_list.len(), days = doc.history.len(), "Food data loaded");
        Ok(Self {
            doc,
            repo,
            chat: ChatSession::new(),
        })
    }

    pub fn document(&self) -> &FoodDocument {
        &self.doc
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn add_food(&mut self, name: &str) -> Result<()> {
        picker::add_food(&mut self.doc, name)?;
        self.repo.save(&self.doc)
    }

    pub fn remove_food(&mut self, name: &str) -> Result<()> {
        picker::remove_food(&mut self.doc, name)?;
        self.repo.save(&self.doc)
    }

    pub fn spin<R: Rng + ?Sized>(
        &mut self,
        selected: NaiveDate,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<SpinOutcome> {
        let outcome = picker::spin(&mut self.doc, selected, today, rng)?;
        self.repo.save(&self.doc)?;
        Ok(outcome)
    }

    pub async fn send_chat(&mut self, service: &dyn ChatService, text: &str) -> Result<ChatTurn> {
        self.chat.send(service, text).await.cloned()
    }

    /// Snapshot of everything the page shows for `selected`.
    pub fn page(&self, selected: NaiveDate, today: NaiveDate) -> PageView {
        let date_key = iso_date(selected);
        let picks = self.doc.picks_for(&date_key);
        let [left, right] = picker::history_columns(picks);
        let view = picker::view_for(&self.doc, selected, today);

        PageView {
            today: iso_date(today),
            selected_date: date_key.clone(),
            year: selected.year(),
            month: selected.month(),
            day: selected.day(),
            min_year: MIN_YEAR,
            max_year: MAX_YEAR,
            max_day: MAX_DAY,
            foods: self.doc.food_list.clone(),
            picker: view,
            can_spin: view.can_spin(),
            picks: picker::numbered(picks),
            history_columns: vec![left, right],
            chat: self.chat.visible_turns().to_vec(),
        }
    }
}

/// Render model for the page template.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub today: String,
    pub selected_date: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub min_year: i32,
    pub max_year: i32,
    pub max_day: u32,
    pub foods: Vec<String>,
    pub picker: PickerView,
    pub can_spin: bool,
    pub picks: Vec<NumberedPick>,
    pub history_columns: Vec<Vec<NumberedPick>>,
    pub chat: Vec<ChatTurn>,
}
