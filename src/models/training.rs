use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::models::validation::{validate_schedule, validate_search_window, validate_training_text};
use crate::models::{AgeBracket, Gender};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "training_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TrainingType {
    Individual,
    #[default]
    Group,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "discipline", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    #[default]
    #[sqlx(rename = "MMA")]
    #[serde(rename = "MMA")]
    Mma,
    Striking,
    BoxeFeminin,
    Wrestling,
    #[sqlx(rename = "BJJ")]
    #[serde(rename = "BJJ")]
    Bjj,
    PhysicalPreparation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Training {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub time_start: NaiveDateTime,
    pub time_end: NaiveDateTime,
    #[serde(rename = "type")]
    pub training_type: TrainingType,
    pub discipline: Discipline,
    pub coach_id: i64,
    pub individual_for_id: Option<i64>,
    pub target_auditory: Option<AgeBracket>,
    pub target_gender: Option<Gender>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who a training is meant for.
///
/// An individual training admits exactly one student. A group training admits
/// every user whose age bracket and gender match; `None` matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetingRule {
    Individual {
        student_id: i64,
    },
    Group {
        auditory: Option<AgeBracket>,
        gender: Option<Gender>,
    },
}

impl TargetingRule {
    /// Checks the mutual exclusion between `individual_for_id` and the group targets.
    pub fn from_parts(
        training_type: TrainingType,
        individual_for_id: Option<i64>,
        target_auditory: Option<AgeBracket>,
        target_gender: Option<Gender>,
    ) -> Result<Self> {
        match training_type {
            TrainingType::Individual => {
                let student_id = individual_for_id.ok_or_else(|| {
                    anyhow!("Individual training must have an id of a specific student")
                })?;
                if target_auditory.is_some() || target_gender.is_some() {
                    return Err(anyhow!(
                        "An individual training can not have a target auditory or target gender"
                    ));
                }
                Ok(TargetingRule::Individual { student_id })
            }
            TrainingType::Group => {
                if individual_for_id.is_some() {
                    return Err(anyhow!(
                        "Group training cannot have an id of a specific student"
                    ));
                }
                Ok(TargetingRule::Group {
                    auditory: target_auditory,
                    gender: target_gender,
                })
            }
        }
    }
}

/// Attributes of a training about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTraining {
    pub title: String,
    pub description: Option<String>,
    pub time_start: NaiveDateTime,
    pub time_end: NaiveDateTime,
    pub training_type: TrainingType,
    pub discipline: Discipline,
    pub coach_id: i64,
    pub individual_for_id: Option<i64>,
    pub target_auditory: Option<AgeBracket>,
    pub target_gender: Option<Gender>,
}

impl NewTraining {
    pub fn targeting(&self) -> Result<TargetingRule> {
        TargetingRule::from_parts(
            self.training_type,
            self.individual_for_id,
            self.target_auditory,
            self.target_gender,
        )
    }

    /// Text limits, time ordering and the targeting rule.
    pub fn validate(&self) -> Result<TargetingRule> {
        validate_training_text(&self.title, self.description.as_deref())?;
        validate_schedule(self.time_start, self.time_end)?;
        self.targeting()
    }
}

impl Training {
    pub fn targeting(&self) -> Result<TargetingRule> {
        TargetingRule::from_parts(
            self.training_type,
            self.individual_for_id,
            self.target_auditory,
            self.target_gender,
        )
    }

    /// True when the attributes that decide availability differ.
    pub fn targeting_changed(&self, other: &Training) -> bool {
        self.training_type != other.training_type
            || self.individual_for_id != other.individual_for_id
            || self.target_auditory != other.target_auditory
            || self.target_gender != other.target_gender
    }
}

fn default_title() -> String {
    "New training".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrainingRequest {
    #[serde(default = "default_title")]
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    #[serde(rename = "type", default)]
    pub training_type: TrainingType,
    #[serde(default)]
    pub discipline: Discipline,
    pub individual_for_id: Option<i64>,
    pub target_auditory: Option<AgeBracket>,
    pub target_gender: Option<Gender>,
}

impl CreateTrainingRequest {
    pub fn into_new_training(self, coach_id: i64) -> NewTraining {
        NewTraining {
            title: self.title,
            description: self.description,
            time_start: self.date.and_time(self.time_start),
            time_end: self.date.and_time(self.time_end),
            training_type: self.training_type,
            discipline: self.discipline,
            coach_id,
            individual_for_id: self.individual_for_id,
            target_auditory: self.target_auditory,
            target_gender: self.target_gender,
        }
    }
}

/// Keeps an explicit `null` apart from an absent field.
fn explicit_null<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update. For the nullable fields, `Some(None)` clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTrainingRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub training_type: Option<TrainingType>,
    pub discipline: Option<Discipline>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub individual_for_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub target_auditory: Option<Option<AgeBracket>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub target_gender: Option<Option<Gender>>,
}

impl UpdateTrainingRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.time_start.is_none()
            && self.time_end.is_none()
            && self.training_type.is_none()
            && self.discipline.is_none()
            && self.individual_for_id.is_none()
            && self.target_auditory.is_none()
            && self.target_gender.is_none()
    }

    /// Applies the patch to a copy of `current` and validates the result.
    ///
    /// A new `date` moves both bounds; a new time replaces only the
    /// time-of-day of its own bound.
    pub fn apply_to(&self, current: &Training) -> Result<Training> {
        if self.is_empty() {
            return Err(anyhow!("No fields to update"));
        }

        let mut updated = current.clone();

        let start_date = self.date.unwrap_or_else(|| current.time_start.date());
        let end_date = self.date.unwrap_or_else(|| current.time_end.date());
        let start_time = self.time_start.unwrap_or_else(|| current.time_start.time());
        let end_time = self.time_end.unwrap_or_else(|| current.time_end.time());
        updated.time_start = start_date.and_time(start_time);
        updated.time_end = end_date.and_time(end_time);

        if let Some(title) = &self.title {
            updated.title = title.clone();
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(training_type) = self.training_type {
            updated.training_type = training_type;
        }
        if let Some(discipline) = self.discipline {
            updated.discipline = discipline;
        }
        if let Some(individual_for_id) = self.individual_for_id {
            updated.individual_for_id = individual_for_id;
        }
        if let Some(target_auditory) = self.target_auditory {
            updated.target_auditory = target_auditory;
        }
        if let Some(target_gender) = self.target_gender {
            updated.target_gender = target_gender;
        }

        validate_training_text(&updated.title, updated.description.as_deref())?;
        validate_schedule(updated.time_start, updated.time_end)?;
        updated.targeting()?;

        Ok(updated)
    }
}

/// Equality filters on training attributes, combined with AND. `None` is a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingFilter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub training_type: Option<TrainingType>,
    pub discipline: Option<Discipline>,
    pub individual_for_id: Option<i64>,
    pub target_auditory: Option<AgeBracket>,
    pub target_gender: Option<Gender>,
    pub coach_id: Option<i64>,
}

/// Date range on the start date and time-of-day range on both bounds, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
}

impl TimeWindow {
    pub const DEFAULT_DAYS: i64 = 7;

    pub fn day_start() -> NaiveTime {
        NaiveTime::MIN
    }

    pub fn day_end() -> NaiveTime {
        NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
    }

    /// From `today` to a week later, whole days. The end is clamped to the last representable date.
    pub fn upcoming_week(today: NaiveDate) -> Self {
        Self {
            date_start: today,
            date_end: today
                .checked_add_signed(Duration::days(Self::DEFAULT_DAYS))
                .unwrap_or(NaiveDate::MAX),
            time_start: Self::day_start(),
            time_end: Self::day_end(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainingSearchQuery {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub training_type: Option<TrainingType>,
    pub discipline: Option<Discipline>,
    pub individual_for_id: Option<i64>,
    pub target_auditory: Option<AgeBracket>,
    pub target_gender: Option<Gender>,
    pub coach_id: Option<i64>,
    pub date_start_search: Option<NaiveDate>,
    pub date_end_search: Option<NaiveDate>,
    pub time_start_search: Option<NaiveTime>,
    pub time_end_search: Option<NaiveTime>,
}

impl TrainingSearchQuery {
    pub fn filter(&self) -> Result<TrainingFilter> {
        match self.training_type {
            Some(TrainingType::Individual)
                if self.target_auditory.is_some() || self.target_gender.is_some() =>
            {
                return Err(anyhow!(
                    "An individual training can not have a target auditory or target gender"
                ));
            }
            Some(TrainingType::Group) if self.individual_for_id.is_some() => {
                return Err(anyhow!(
                    "Group training cannot have an id of a specific student"
                ));
            }
            _ => {}
        }

        Ok(TrainingFilter {
            title: self.title.clone(),
            description: self.description.clone(),
            training_type: self.training_type,
            discipline: self.discipline,
            individual_for_id: self.individual_for_id,
            target_auditory: self.target_auditory,
            target_gender: self.target_gender,
            coach_id: self.coach_id,
        })
    }

    pub fn has_window(&self) -> bool {
        self.date_start_search.is_some()
            || self.date_end_search.is_some()
            || self.time_start_search.is_some()
            || self.time_end_search.is_some()
    }

    /// Missing bounds default to the week starting at `today` (or at the given start date).
    pub fn window(&self, today: NaiveDate) -> Result<TimeWindow> {
        let date_start = self.date_start_search.unwrap_or(today);
        let date_end = match self.date_end_search {
            Some(date_end) => date_end,
            None => date_start
                .checked_add_signed(Duration::days(TimeWindow::DEFAULT_DAYS))
                .ok_or_else(|| anyhow!("Search start date {date_start} is out of range"))?,
        };
        let time_start = self.time_start_search.unwrap_or_else(TimeWindow::day_start);
        let time_end = self.time_end_search.unwrap_or_else(TimeWindow::day_end);

        validate_search_window(date_start, date_end, time_start, time_end)?;

        Ok(TimeWindow {
            date_start,
            date_end,
            time_start,
            time_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn group_training() -> Training {
        Training {
            id: 10,
            title: "Morning sparring".to_string(),
            description: None,
            time_start: date(2025, 3, 1).and_time(time(9, 0)),
            time_end: date(2025, 3, 1).and_time(time(10, 0)),
            training_type: TrainingType::Group,
            discipline: Discipline::Mma,
            coach_id: 1,
            individual_for_id: None,
            target_auditory: Some(AgeBracket::Adults),
            target_gender: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_targeting_rule_for_individual() {
        assert_eq!(
            TargetingRule::from_parts(TrainingType::Individual, Some(7), None, None).unwrap(),
            TargetingRule::Individual { student_id: 7 }
        );
        assert!(TargetingRule::from_parts(TrainingType::Individual, None, None, None).is_err());
        assert!(TargetingRule::from_parts(
            TrainingType::Individual,
            Some(7),
            Some(AgeBracket::Adults),
            None
        )
        .is_err());
        assert!(TargetingRule::from_parts(TrainingType::Individual, Some(7), None, Some(Gender::Men))
            .is_err());
    }

    #[test]
    fn test_targeting_rule_for_group() {
        assert_eq!(
            TargetingRule::from_parts(TrainingType::Group, None, None, Some(Gender::Woman)).unwrap(),
            TargetingRule::Group {
                auditory: None,
                gender: Some(Gender::Woman)
            }
        );
        assert!(TargetingRule::from_parts(TrainingType::Group, Some(3), None, None).is_err());
    }

    #[test]
    fn test_create_request_combines_date_and_times() {
        let request: CreateTrainingRequest = serde_json::from_value(serde_json::json!({
            "date": "2025-03-01",
            "time_start": "09:00:00",
            "time_end": "10:00:00",
            "target_auditory": "adults"
        }))
        .unwrap();

        let training = request.into_new_training(1);
        assert_eq!(training.title, "New training");
        assert_eq!(training.training_type, TrainingType::Group);
        assert_eq!(training.discipline, Discipline::Mma);
        assert_eq!(training.time_start, date(2025, 3, 1).and_time(time(9, 0)));
        assert_eq!(training.time_end, date(2025, 3, 1).and_time(time(10, 0)));
        assert_matches!(
            training.validate(),
            Ok(TargetingRule::Group {
                auditory: Some(AgeBracket::Adults),
                gender: None
            })
        );
    }

    #[test]
    fn test_new_training_rejects_inverted_schedule() {
        let mut training = CreateTrainingRequest {
            title: "Late".to_string(),
            description: None,
            date: date(2025, 3, 1),
            time_start: time(11, 0),
            time_end: time(10, 0),
            training_type: TrainingType::Group,
            discipline: Discipline::Bjj,
            individual_for_id: None,
            target_auditory: None,
            target_gender: None,
        }
        .into_new_training(1);
        assert!(training.validate().is_err());

        training.time_end = training.time_start;
        assert!(training.validate().is_err());
    }

    #[test]
    fn test_discipline_wire_names() {
        assert_eq!(serde_json::to_string(&Discipline::Mma).unwrap(), "\"MMA\"");
        assert_eq!(serde_json::to_string(&Discipline::Bjj).unwrap(), "\"BJJ\"");
        assert_eq!(
            serde_json::from_str::<Discipline>("\"boxe_feminin\"").unwrap(),
            Discipline::BoxeFeminin
        );
        assert_eq!(
            serde_json::from_str::<Discipline>("\"physical_preparation\"").unwrap(),
            Discipline::PhysicalPreparation
        );
    }

    #[test]
    fn test_update_time_only_keeps_date() {
        let current = group_training();
        let patch = UpdateTrainingRequest {
            time_end: Some(time(11, 30)),
            ..Default::default()
        };

        let updated = patch.apply_to(&current).unwrap();
        assert_eq!(updated.time_start, current.time_start);
        assert_eq!(updated.time_end, date(2025, 3, 1).and_time(time(11, 30)));
        assert!(!updated.targeting_changed(&current));
    }

    #[test]
    fn test_update_date_moves_both_bounds() {
        let current = group_training();
        let patch = UpdateTrainingRequest {
            date: Some(date(2025, 4, 2)),
            time_start: Some(time(8, 0)),
            ..Default::default()
        };

        let updated = patch.apply_to(&current).unwrap();
        assert_eq!(updated.time_start, date(2025, 4, 2).and_time(time(8, 0)));
        assert_eq!(updated.time_end, date(2025, 4, 2).and_time(time(10, 0)));
    }

    #[test]
    fn test_update_rejects_end_before_start() {
        let current = group_training();
        let patch = UpdateTrainingRequest {
            time_start: Some(time(10, 30)),
            ..Default::default()
        };
        assert!(patch.apply_to(&current).is_err());
    }

    #[test]
    fn test_update_rejects_empty_patch() {
        assert!(UpdateTrainingRequest::default()
            .apply_to(&group_training())
            .is_err());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let patch: UpdateTrainingRequest = serde_json::from_value(serde_json::json!({
            "target_auditory": null,
            "target_gender": "men"
        }))
        .unwrap();

        assert_eq!(patch.target_auditory, Some(None));
        assert_eq!(patch.target_gender, Some(Some(Gender::Men)));
        assert_eq!(patch.individual_for_id, None);

        let current = group_training();
        let updated = patch.apply_to(&current).unwrap();
        assert_eq!(updated.target_auditory, None);
        assert_eq!(updated.target_gender, Some(Gender::Men));
        assert!(updated.targeting_changed(&current));
    }

    #[test]
    fn test_update_to_individual_requires_cleared_targets() {
        let current = group_training();

        let patch: UpdateTrainingRequest = serde_json::from_value(serde_json::json!({
            "type": "individual",
            "individual_for_id": 7
        }))
        .unwrap();
        assert!(patch.apply_to(&current).is_err());

        let patch: UpdateTrainingRequest = serde_json::from_value(serde_json::json!({
            "type": "individual",
            "individual_for_id": 7,
            "target_auditory": null
        }))
        .unwrap();
        let updated = patch.apply_to(&current).unwrap();
        assert_eq!(
            updated.targeting().unwrap(),
            TargetingRule::Individual { student_id: 7 }
        );
    }

    #[test]
    fn test_search_window_defaults_to_upcoming_week() {
        let today = date(2025, 1, 10);
        let window = TrainingSearchQuery::default().window(today).unwrap();
        assert_eq!(window, TimeWindow::upcoming_week(today));
        assert_eq!(window.date_end, date(2025, 1, 17));
        assert_eq!(window.time_end, NaiveTime::from_hms_opt(23, 59, 59).unwrap());
    }

    #[test]
    fn test_search_window_end_follows_given_start() {
        let query = TrainingSearchQuery {
            date_start_search: Some(date(2025, 1, 1)),
            time_start_search: Some(time(9, 0)),
            time_end_search: Some(time(12, 0)),
            ..Default::default()
        };
        let window = query.window(date(2030, 1, 1)).unwrap();
        assert_eq!(window.date_end, date(2025, 1, 8));
        assert_eq!(window.time_start, time(9, 0));
        assert!(query.has_window());
        assert!(!TrainingSearchQuery::default().has_window());
    }

    #[test]
    fn test_search_window_rejects_start_at_end_of_calendar() {
        let query: TrainingSearchQuery =
            serde_json::from_value(serde_json::json!({ "date_start_search": "+262142-12-30" }))
                .unwrap();
        assert!(query.date_start_search.is_some());
        assert!(query.window(date(2025, 1, 1)).is_err());

        let explicit_end = TrainingSearchQuery {
            date_end_search: Some(NaiveDate::MAX),
            ..query
        };
        assert_eq!(explicit_end.window(date(2025, 1, 1)).unwrap().date_end, NaiveDate::MAX);
    }

    #[test]
    fn test_upcoming_week_clamps_at_end_of_calendar() {
        let window = TimeWindow::upcoming_week(NaiveDate::MAX);
        assert_eq!(window.date_start, NaiveDate::MAX);
        assert_eq!(window.date_end, NaiveDate::MAX);
    }

    #[test]
    fn test_search_rejects_inverted_window() {
        let query = TrainingSearchQuery {
            date_start_search: Some(date(2025, 2, 1)),
            date_end_search: Some(date(2025, 1, 1)),
            ..Default::default()
        };
        assert!(query.window(date(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_search_filter_rejects_contradictory_targeting() {
        let query = TrainingSearchQuery {
            training_type: Some(TrainingType::Group),
            individual_for_id: Some(4),
            ..Default::default()
        };
        assert!(query.filter().is_err());

        let query = TrainingSearchQuery {
            training_type: Some(TrainingType::Individual),
            target_gender: Some(Gender::Woman),
            ..Default::default()
        };
        assert!(query.filter().is_err());

        let query = TrainingSearchQuery {
            discipline: Some(Discipline::Wrestling),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap().discipline, Some(Discipline::Wrestling));
    }
}
