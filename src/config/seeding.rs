use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;

use crate::auth::{AuthService, UserRole};
use crate::models::*;
use crate::services::{TrainingService, UserService};

const DEMO_PASSWORD: &str = "password123";

/// Demo accounts and trainings, created through the regular services.
pub struct DemoSeeder {
    pool: PgPool,
    auth_service: AuthService,
}

struct DemoUser {
    name: &'static str,
    email: &'static str,
    role: UserRole,
    birth_date: (i32, u32, u32),
    gender: Gender,
    interests: &'static [Discipline],
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        name: "Coach Carter",
        email: "coach@example.com",
        role: UserRole::Coach,
        birth_date: (1980, 5, 12),
        gender: Gender::Men,
        interests: &[Discipline::Mma, Discipline::Wrestling],
    },
    DemoUser {
        name: "Sam Student",
        email: "sam@example.com",
        role: UserRole::Student,
        birth_date: (1996, 9, 3),
        gender: Gender::Men,
        interests: &[Discipline::Bjj],
    },
    DemoUser {
        name: "Alex Student",
        email: "alex@example.com",
        role: UserRole::Student,
        birth_date: (1999, 2, 21),
        gender: Gender::Woman,
        interests: &[Discipline::BoxeFeminin, Discipline::Striking],
    },
];

impl DemoSeeder {
    pub fn new(pool: PgPool, auth_service: AuthService) -> Self {
        Self { pool, auth_service }
    }

    pub async fn seed_all(&self) -> Result<()> {
        tracing::info!("seeding demo data");

        let today = Utc::now().date_naive();
        let mut created = Vec::new();
        for demo in DEMO_USERS {
            if let Some(user_id) = self.seed_user(demo, today).await? {
                created.push((demo.email, user_id));
            }
        }

        let coach = created.iter().find(|(email, _)| *email == DEMO_USERS[0].email);
        let student = created.iter().find(|(email, _)| *email == DEMO_USERS[1].email);
        if let (Some((_, coach_id)), Some((_, student_id))) = (coach, student) {
            self.seed_trainings(*coach_id, *student_id, today).await?;
        }

        tracing::info!(users = created.len(), "demo data ready");
        Ok(())
    }

    /// Returns the new user's id, or `None` when the email is already taken.
    async fn seed_user(&self, demo: &DemoUser, today: NaiveDate) -> Result<Option<i64>> {
        let user_service = UserService::new(self.pool.clone());
        if user_service.get_user_by_email(demo.email).await?.is_some() {
            return Ok(None);
        }

        let (year, month, day) = demo.birth_date;
        let request = RegisterRequest {
            name: demo.name.to_string(),
            email: demo.email.to_string(),
            password: DEMO_PASSWORD.to_string(),
            password_confirmation: DEMO_PASSWORD.to_string(),
            role: demo.role,
            birth_date: NaiveDate::from_ymd_opt(year, month, day).context("invalid demo birth date")?,
            gender: demo.gender,
            level: SkillLevel::default(),
            interests: demo.interests.to_vec(),
            age_bracket: None,
        };

        let user = self.auth_service.register(request, today).await?;
        Ok(Some(user.id))
    }

    async fn seed_trainings(&self, coach_id: i64, student_id: i64, today: NaiveDate) -> Result<()> {
        let training_service = TrainingService::new(self.pool.clone());
        let tomorrow = today + Duration::days(1);
        let at = |hour: u32| NaiveTime::from_hms_opt(hour, 0, 0).context("invalid demo time");

        let group = CreateTrainingRequest {
            title: "Adults MMA".to_string(),
            description: Some("Open mat and drilling".to_string()),
            date: tomorrow,
            time_start: at(18)?,
            time_end: at(20)?,
            training_type: TrainingType::Group,
            discipline: Discipline::Mma,
            individual_for_id: None,
            target_auditory: Some(AgeBracket::Adults),
            target_gender: None,
        };
        let private = CreateTrainingRequest {
            title: "Private BJJ".to_string(),
            description: None,
            date: tomorrow,
            time_start: at(10)?,
            time_end: at(11)?,
            training_type: TrainingType::Individual,
            discipline: Discipline::Bjj,
            individual_for_id: Some(student_id),
            target_auditory: None,
            target_gender: None,
        };

        for request in [group, private] {
            let training = training_service.create(coach_id, request).await?;
            tracing::info!(training_id = training.id, "created demo training");
        }

        Ok(())
    }
}
