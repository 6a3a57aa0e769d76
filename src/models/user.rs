use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::auth::UserRole;
use crate::models::Discipline;

/// Age group a user belongs to; trainings can be aimed at one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "age_bracket", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AgeBracket {
    Children,
    Adults,
    Seniors,
}

impl AgeBracket {
    /// First age that is no longer a child.
    pub const ADULT_FROM: i32 = 14;
    /// First age counted as senior.
    pub const SENIOR_FROM: i32 = 60;

    pub fn from_age(age: i32) -> Self {
        if age < Self::ADULT_FROM {
            AgeBracket::Children
        } else if age < Self::SENIOR_FROM {
            AgeBracket::Adults
        } else {
            AgeBracket::Seniors
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Woman,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Competitor,
    #[default]
    NonCompetitor,
    Beginner,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub age: i32,
    pub age_bracket: AgeBracket,
    pub gender: Gender,
    pub skill_level: SkillLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert at registration, password already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub age: i32,
    pub age_bracket: AgeBracket,
    pub gender: Gender,
    pub skill_level: SkillLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub age: i32,
    pub age_bracket: AgeBracket,
    pub gender: Gender,
    pub skill_level: SkillLevel,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            age: user.age,
            age_bracket: user.age_bracket,
            gender: user.gender,
            skill_level: user.skill_level,
            created_at: user.created_at,
        }
    }
}

fn default_name() -> String {
    "Your name".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default = "default_name")]
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,
    #[validate(
        email(message = "Email must be a valid email address"),
        length(max = 255, message = "Email cannot be longer than 255 characters")
    )]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
    pub password_confirmation: String,
    pub role: UserRole,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub level: SkillLevel,
    #[serde(default)]
    pub interests: Vec<Discipline>,
    /// Overrides the bracket derived from the birth date.
    #[serde(default)]
    pub age_bracket: Option<AgeBracket>,
}

/// Full years between `birth_date` and `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

impl RegisterRequest {
    pub fn age(&self, today: NaiveDate) -> i32 {
        age_on(self.birth_date, today)
    }

    pub fn resolved_age_bracket(&self, today: NaiveDate) -> AgeBracket {
        self.age_bracket
            .unwrap_or_else(|| AgeBracket::from_age(self.age(today)))
    }
}
