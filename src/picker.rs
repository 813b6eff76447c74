//! Daily spin rules and food-list edits over a [`FoodDocument`].
//!
//! Nothing here touches the disk; callers persist the document after each
//! successful mutation.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::constants::{DAILY_SPIN_LIMIT, MAX_DAY, MAX_YEAR, MIN_YEAR};
use crate::date_resolver::iso_date;
use crate::error::{FoodyError, Result};
use crate::store::FoodDocument;

/// What the page offers for the selected date. Derived on every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PickerView {
    /// Before today: history is read-only.
    Past,
    /// Today or later with spins left.
    Open { remaining: usize },
    /// Today or later, all spins used.
    Exhausted,
}

impl PickerView {
    pub fn can_spin(&self) -> bool {
        matches!(self, PickerView::Open { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpinOutcome {
    pub food: String,
    pub remaining: usize,
}

/// One history entry with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberedPick {
    pub number: usize,
    pub food: String,
}

/// Builds the selected date from picker inputs. Day is accepted up to 31 for
/// every month, so impossible dates such as Feb 31 are rejected here.
pub fn select_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    let in_range = (MIN_YEAR..=MAX_YEAR).contains(&year)
        && (1..=12).contains(&month)
        && (1..=MAX_DAY).contains(&day);
    in_range
        .then(|| NaiveDate::from_ymd_opt(year, month, day))
        .flatten()
        .ok_or(FoodyError::InvalidDate { year, month, day })
}

pub fn view_for(doc: &FoodDocument, selected: NaiveDate, today: NaiveDate) -> PickerView {
    if selected < today {
        return PickerView::Past;
    }
    let used = doc.picks_for(&iso_date(selected)).len();
    if used < DAILY_SPIN_LIMIT {
        PickerView::Open {
            remaining: DAILY_SPIN_LIMIT - used,
        }
    } else {
        PickerView::Exhausted
    }
}

/// Picks a food uniformly at random and records it under `selected`.
pub fn spin<R: Rng + ?Sized>(
    doc: &mut FoodDocument,
    selected: NaiveDate,
    today: NaiveDate,
    rng: &mut R,
) -> Result<SpinOutcome> {
    let date = iso_date(selected);
    match view_for(doc, selected, today) {
        PickerView::Past => return Err(FoodyError::DateInPast { date }),
        PickerView::Exhausted => {
            return Err(FoodyError::DailyLimitReached {
                date,
                limit: DAILY_SPIN_LIMIT,
            })
        }
        PickerView::Open { .. } => {}
    }

    let food = doc
        .food_list
        .choose(rng)
        .cloned()
        .ok_or(FoodyError::EmptyFoodList)?;

    let picks = doc.history.entry(date.clone()).or_default();
    picks.push(food.clone());
    let remaining = DAILY_SPIN_LIMIT.saturating_sub(picks.len());
    info!(%date, %food, remaining, "Spun a food");

    Ok(SpinOutcome { food, remaining })
}

pub fn add_food(doc: &mut FoodDocument, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FoodyError::EmptyFoodName);
    }
    if doc.contains_food(name) {
        return Err(FoodyError::DuplicateFood(name.to_string()));
    }
    doc.food_list.push(name.to_string());
    info!(food = name, "Added food");
    Ok(())
}

/// Removes the first exact match. History keeps any past picks of it.
pub fn remove_food(doc: &mut FoodDocument, name: &str) -> Result<()> {
    let index = doc
        .food_list
        .iter()
        .position(|f| f == name)
        .ok_or_else(|| FoodyError::FoodNotFound(name.to_string()))?;
    doc.food_list.remove(index);
    info!(food = name, "Removed food");
    Ok(())
}

pub fn numbered(picks: &[String]) -> Vec<NumberedPick> {
    picks
        .iter()
        .enumerate()
        .map(|(i, food)| NumberedPick {
            number: i + 1,
            food: food.clone(),
        })
        .collect()
}

/// Splits picks into two columns: odd-numbered entries left, even right.
pub fn history_columns(picks: &[String]) -> [Vec<NumberedPick>; 2] {
    let mut columns = [Vec::new(), Vec::new()];
    for pick in numbered(picks) {
        columns[(pick.number - 1) % 2].push(pick);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn doc_with(foods: &[&str]) -> FoodDocument {
        FoodDocument::new(foods.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_select_date_rejects_feb_31() {
        assert!(matches!(
            select_date(2024, 2, 31),
            Err(FoodyError::InvalidDate { year: 2024, month: 2, day: 31 })
        ));
        assert_eq!(select_date(2024, 2, 29).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_select_date_rejects_out_of_picker_range() {
        assert!(select_date(1999, 1, 1).is_err());
        assert!(select_date(2101, 1, 1).is_err());
        assert!(select_date(2024, 13, 1).is_err());
        assert!(select_date(2024, 1, 0).is_err());
    }

    #[test]
    fn test_past_date_never_offers_spin() {
        let mut doc = doc_with(&["Pho"]);
        let today = date(2024, 5, 2);
        let yesterday = date(2024, 5, 1);

        assert_eq!(view_for(&doc, yesterday, today), PickerView::Past);
        doc.history.insert("2024-05-01".into(), vec!["Pho".into()]);
        assert_eq!(view_for(&doc, yesterday, today), PickerView::Past);

        let mut rng = StdRng::seed_from_u64(7);
        let err = spin(&mut doc, yesterday, today, &mut rng).unwrap_err();
        assert!(matches!(err, FoodyError::DateInPast { .. }));
        assert_eq!(doc.picks_for("2024-05-01").len(), 1);
    }

    #[test]
    fn test_future_date_is_open() {
        let doc = doc_with(&["Pho"]);
        assert_eq!(
            view_for(&doc, date(2024, 6, 1), date(2024, 5, 1)),
            PickerView::Open { remaining: 5 }
        );
    }

    #[test]
    fn test_fifth_spin_exhausts_the_day() {
        let mut doc = doc_with(&["Pho"]);
        let today = date(2024, 5, 1);
        doc.history.insert("2024-05-01".into(), vec!["Pho".into(); 4]);
        let mut rng = StdRng::seed_from_u64(1);

        let outcome = spin(&mut doc, today, today, &mut rng).unwrap();
        assert_eq!(outcome, SpinOutcome { food: "Pho".into(), remaining: 0 });
        assert_eq!(doc.picks_for("2024-05-01").len(), 5);
        assert_eq!(view_for(&doc, today, today), PickerView::Exhausted);
        assert!(!view_for(&doc, today, today).can_spin());
    }

    #[test]
    fn test_five_spins_then_refused() {
        let mut doc = doc_with(&["Pho", "Banh mi"]);
        let today = date(2024, 5, 1);
        let mut rng = StdRng::seed_from_u64(42);

        for expected_remaining in (0..5).rev() {
            let outcome = spin(&mut doc, today, today, &mut rng).unwrap();
            assert_eq!(outcome.remaining, expected_remaining);
        }

        let picks = doc.picks_for("2024-05-01");
        assert_eq!(picks.len(), 5);
        assert!(picks.iter().all(|p| p == "Pho" || p == "Banh mi"));

        let err = spin(&mut doc, today, today, &mut rng).unwrap_err();
        assert!(matches!(err, FoodyError::DailyLimitReached { limit: 5, .. }));
        assert_eq!(doc.picks_for("2024-05-01").len(), 5);
    }

    #[test]
    fn test_spin_with_empty_food_list_fails() {
        let mut doc = doc_with(&[]);
        let today = date(2024, 5, 1);
        let mut rng = StdRng::seed_from_u64(3);

        let err = spin(&mut doc, today, today, &mut rng).unwrap_err();
        assert!(matches!(err, FoodyError::EmptyFoodList));
        assert!(!err.is_user_facing());
        assert!(doc.history.is_empty());
    }

    #[test]
    fn test_add_food_rejects_empty_and_duplicate() {
        let mut doc = doc_with(&["Phở"]);

        assert!(matches!(add_food(&mut doc, ""), Err(FoodyError::EmptyFoodName)));
        assert!(matches!(add_food(&mut doc, "Phở"), Err(FoodyError::DuplicateFood(_))));
        assert_eq!(doc.food_list, vec!["Phở"]);

        add_food(&mut doc, "Bún chả").unwrap();
        assert_eq!(doc.food_list, vec!["Phở", "Bún chả"]);
    }

    #[test]
    fn test_remove_food_keeps_history() {
        let mut doc = doc_with(&["Pho", "Banh mi"]);
        doc.history.insert("2024-05-01".into(), vec!["Pho".into()]);

        remove_food(&mut doc, "Pho").unwrap();
        assert_eq!(doc.food_list, vec!["Banh mi"]);
        assert_eq!(doc.picks_for("2024-05-01"), ["Pho".to_string()]);
    }

    #[test]
    fn test_remove_missing_food_leaves_document_unchanged() {
        let mut doc = doc_with(&["Pho"]);
        let before = doc.clone();

        let err = remove_food(&mut doc, "Sushi").unwrap_err();
        assert!(matches!(err, FoodyError::FoodNotFound(ref name) if name == "Sushi"));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_history_columns_alternate() {
        let picks: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let [left, right] = history_columns(&picks);

        let left: Vec<_> = left.iter().map(|p| (p.number, p.food.as_str())).collect();
        let right: Vec<_> = right.iter().map(|p| (p.number, p.food.as_str())).collect();
        assert_eq!(left, vec![(1, "a"), (3, "c"), (5, "e")]);
        assert_eq!(right, vec![(2, "b"), (4, "d")]);
    }
}
