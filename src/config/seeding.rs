use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveTime};
use sqlx::PgPool;

use crate::auth::UserSession;
use crate::calendar;
use crate::models::*;
use crate::services::*;

const DEMO_PASSWORD: &str = "Password123!";

/// Inserts demo accounts, exercises, classes and a routine. Safe to run repeatedly.
pub struct DatabaseSeeder {
    pool: PgPool,
}

impl DatabaseSeeder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn seed_all(&self) -> Result<()> {
        tracing::info!("Starting database seeding...");

        self.seed_users().await?;
        self.seed_exercises().await?;
        self.seed_classes().await?;
        self.seed_routine().await?;

        tracing::info!("Database seeding completed!");
        Ok(())
    }

    async fn seed_users(&self) -> Result<()> {
        let user_service = UserService::new(self.pool.clone());

        let demo_users = vec![
            demo_user("admin@gymbro.local", "Marta", "Ruiz", ProfileInput::Admin(AdministratorProfile { active: true })),
            demo_user(
                "teacher@gymbro.local",
                "Laura",
                "Pérez",
                ProfileInput::Teacher(TeacherProfile {
                    specialty: "Pilates and functional training".to_string(),
                }),
            ),
            demo_user(
                "student@gymbro.local",
                "Carlos",
                "Gómez",
                ProfileInput::Student(StudentProfile {
                    birth_date: NaiveDate::from_ymd_opt(1998, 4, 12).unwrap_or_default(),
                    weight: 78,
                    height: 180,
                    sex: "male".to_string(),
                }),
            ),
        ];

        for user_data in demo_users {
            if user_service.get_user_by_email(&user_data.email).await?.is_none() {
                let email = user_data.email.clone();
                user_service.create_user(user_data).await?;
                tracing::info!(%email, "Created demo user");
            }
        }

        Ok(())
    }

    async fn seed_exercises(&self) -> Result<()> {
        let exercise_service = ExerciseService::new(self.pool.clone());
        if !exercise_service.list_exercises().await?.is_empty() {
            return Ok(());
        }

        let demo_exercises = [
            ("Squat", "Barbell back squat", "Medium", "Quadriceps", 12),
            ("Bench press", "Flat barbell bench press", "Medium", "Chest", 10),
            ("Deadlift", "Conventional deadlift", "Hard", "Hamstrings", 8),
            ("Plank", "Front plank hold, one rep per 10 seconds", "Easy", "Core", 6),
            ("Pull-up", "Bodyweight pull-up", "Hard", "Back", 8),
        ];

        for (name, description, difficulty, main_muscle, repetitions) in demo_exercises {
            exercise_service
                .create_exercise(ExerciseRequest {
                    name: name.to_string(),
                    description: description.to_string(),
                    difficulty: difficulty.to_string(),
                    main_muscle: main_muscle.to_string(),
                    repetitions,
                })
                .await?;
        }

        tracing::info!("Created demo exercises");
        Ok(())
    }

    async fn seed_classes(&self) -> Result<()> {
        let class_service = ClassService::new(self.pool.clone());
        if !class_service.list_classes(&ClassQuery::default()).await?.is_empty() {
            return Ok(());
        }

        let Some(teacher) = class_service.teacher_options().await?.into_iter().next() else {
            return Ok(());
        };

        let today = calendar::today();
        let demo_classes = [
            ("Pilates", 1, (9, 0), 60, "Studio 1", 12),
            ("Spinning", 2, (18, 30), 45, "Bike room", 20),
            ("Functional", 4, (19, 0), 50, "Main floor", 15),
            ("Yoga", 7, (10, 0), 75, "Studio 2", 2),
        ];

        for (name, days_ahead, (hour, minute), duration_minutes, location, capacity) in demo_classes {
            class_service
                .create_class(ClassRequest {
                    name: name.to_string(),
                    class_date: today + Duration::days(days_ahead),
                    start_time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default(),
                    duration_minutes,
                    location: Some(location.to_string()),
                    capacity,
                    teacher_id: teacher.id,
                })
                .await?;
        }

        tracing::info!(teacher_id = teacher.id, "Created demo classes");
        Ok(())
    }

    async fn seed_routine(&self) -> Result<()> {
        let user_service = UserService::new(self.pool.clone());
        let routine_service = RoutineService::new(self.pool.clone());

        let Some(student) = user_service.get_user_by_email("student@gymbro.local").await? else {
            return Ok(());
        };
        let Some(student_id) = user_service.student_id_for_user(student.id).await? else {
            return Ok(());
        };

        let session = UserSession {
            user_id: student.id,
            email: student.email.clone(),
            role: crate::auth::UserRole::Student,
            jti: String::new(),
        };
        let viewer = routine_service.viewer(&session).await?;
        let existing = routine_service.list_routines(viewer, &RoutineQuery::default()).await?;
        if existing.page.total > 0 {
            return Ok(());
        }

        let exercises = ExerciseService::new(self.pool.clone()).list_exercises().await?;
        let lines = exercises
            .iter()
            .take(3)
            .map(|exercise| ExerciseLine {
                exercise_id: Some(exercise.id),
                repetitions: Some(exercise.repetitions),
            })
            .collect();

        routine_service
            .create_routine(
                viewer,
                RoutineRequest {
                    name: "Full body starter".to_string(),
                    student_id: Some(student_id),
                    exercises: lines,
                },
            )
            .await?;

        tracing::info!(student_id, "Created demo routine");
        Ok(())
    }
}

fn demo_user(email: &str, first_name: &str, first_surname: &str, profile: ProfileInput) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
        first_name: first_name.to_string(),
        first_surname: first_surname.to_string(),
        second_surname: None,
        phone: None,
        address: None,
        profile,
    }
}
