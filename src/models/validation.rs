use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<()> {
    if password != confirmation {
        return Err(anyhow!("Passwords must match"));
    }
    Ok(())
}

pub fn validate_birth_date(birth_date: NaiveDate, today: NaiveDate) -> Result<()> {
    if birth_date > today {
        return Err(anyhow!("Birth date cannot be in the future"));
    }
    Ok(())
}

pub const TITLE_MAX_LEN: usize = 50;
pub const DESCRIPTION_MAX_LEN: usize = 255;

pub fn validate_training_text(title: &str, description: Option<&str>) -> Result<()> {
    if title.trim().is_empty() {
        return Err(anyhow!("Title cannot be empty"));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(anyhow!("Title cannot be longer than {TITLE_MAX_LEN} characters"));
    }
    if description.is_some_and(|text| text.chars().count() > DESCRIPTION_MAX_LEN) {
        return Err(anyhow!(
            "Description cannot be longer than {DESCRIPTION_MAX_LEN} characters"
        ));
    }
    Ok(())
}

/// A training must end strictly after it starts.
pub fn validate_schedule(time_start: NaiveDateTime, time_end: NaiveDateTime) -> Result<()> {
    if time_start >= time_end {
        return Err(anyhow!(
            "The end of a training must be later than its start"
        ));
    }
    Ok(())
}

/// Search bounds are inclusive, so equal bounds are allowed.
pub fn validate_search_window(
    date_start: NaiveDate,
    date_end: NaiveDate,
    time_start: NaiveTime,
    time_end: NaiveTime,
) -> Result<()> {
    if time_start > time_end {
        return Err(anyhow!(
            "The end time of a search window must not precede its start time"
        ));
    }

    if date_start > date_end {
        return Err(anyhow!(
            "The end date of a search period must not precede its start date"
        ));
    }

    Ok(())
}
