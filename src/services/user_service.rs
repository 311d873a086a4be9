use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::auth::{hash_password, AuthError, UserRole};
use crate::error::{AppError, Result};
use crate::models::{
    like_pattern, AdministratorProfile, CreateUserRequest, Paginated, ProfileInput,
    StudentOption, StudentProfile, TeacherProfile, UpdateUserRequest, User, UserDetails,
    UserQuery, UserSummary,
};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, first_surname, second_surname, \
                            phone, address, created_at, updated_at";

const LISTED_USERS: &str = "
    SELECT u.id, u.email, u.phone,
           CONCAT_WS(' ', u.first_name, u.first_surname, NULLIF(u.second_surname, '')) AS full_name,
           CASE
               WHEN EXISTS(SELECT 1 FROM administrators a WHERE a.user_id = u.id AND a.active) THEN 'admin'
               WHEN EXISTS(SELECT 1 FROM teachers t WHERE t.user_id = u.id) THEN 'teacher'
               WHEN EXISTS(SELECT 1 FROM students s WHERE s.user_id = u.id) THEN 'student'
           END AS role
    FROM users u";

fn push_user_filters(query: &mut QueryBuilder<'_, Postgres>, search: Option<&str>, role: Option<UserRole>) {
    if let Some(search) = search {
        let pattern = like_pattern(search);
        query.push(" AND (LOWER(full_name) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(email) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(role) = role {
        query.push(" AND role = ");
        query.push_bind(role.as_str());
    }
}

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_users(&self, query: &UserQuery) -> Result<Paginated<UserSummary>> {
        let search = query.search();
        let role = query.role();
        let params = query.page_params();

        let mut count = QueryBuilder::new(format!("SELECT COUNT(*) FROM ({}) listed WHERE 1=1", LISTED_USERS));
        push_user_filters(&mut count, search.as_deref(), role);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let mut select = QueryBuilder::new(format!("SELECT * FROM ({}) listed WHERE 1=1", LISTED_USERS));
        push_user_filters(&mut select, search.as_deref(), role);
        select.push(" ORDER BY full_name, id LIMIT ");
        select.push_bind(params.per_page());
        select.push(" OFFSET ");
        select.push_bind(params.offset());

        let users = select.build_query_as::<UserSummary>().fetch_all(&self.db).await?;

        Ok(Paginated::new(users, total, params))
    }

    pub async fn get_user(&self, user_id: i64) -> Result<UserDetails> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("User", user_id))?;

        let student = sqlx::query_as::<_, StudentProfile>(
            "SELECT birth_date, weight, height, sex FROM students WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        let teacher = sqlx::query_as::<_, TeacherProfile>("SELECT specialty FROM teachers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        let administrator =
            sqlx::query_as::<_, AdministratorProfile>("SELECT active FROM administrators WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        let role = UserRole::from_profiles(
            administrator.as_ref().is_some_and(|a| a.active),
            teacher.is_some(),
            student.is_some(),
        );

        Ok(UserDetails {
            user,
            role,
            student,
            teacher,
            administrator,
        })
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Create a user together with its single role profile.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserDetails> {
        let password_hash = hash_password(&request.password).map_err(AuthError::from)?;
        let role = request.profile.role();

        let mut tx = self.db.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, password_hash, first_name, first_surname, second_surname, phone, address)
             VALUES ($1, $2, $3, $4, NULLIF($5, ''), NULLIF($6, ''), NULLIF($7, ''))
             RETURNING id",
        )
        .bind(request.email.trim())
        .bind(&password_hash)
        .bind(request.first_name.trim())
        .bind(request.first_surname.trim())
        .bind(request.second_surname.as_deref().map(str::trim))
        .bind(request.phone.as_deref().map(str::trim))
        .bind(request.address.as_deref().map(str::trim))
        .fetch_one(&mut *tx)
        .await?;

        match &request.profile {
            ProfileInput::Student(student) => {
                sqlx::query(
                    "INSERT INTO students (user_id, birth_date, weight, height, sex) VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(user_id)
                .bind(student.birth_date)
                .bind(student.weight)
                .bind(student.height)
                .bind(&student.sex)
                .execute(&mut *tx)
                .await?;
            }
            ProfileInput::Teacher(teacher) => {
                sqlx::query("INSERT INTO teachers (user_id, specialty) VALUES ($1, $2)")
                    .bind(user_id)
                    .bind(&teacher.specialty)
                    .execute(&mut *tx)
                    .await?;
            }
            ProfileInput::Admin(admin) => {
                sqlx::query("INSERT INTO administrators (user_id, active) VALUES ($1, $2)")
                    .bind(user_id)
                    .bind(admin.active)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(user_id, role = role.as_str(), "Created user");

        self.get_user(user_id).await
    }

    pub async fn update_user(&self, user_id: i64, request: UpdateUserRequest) -> Result<UserDetails> {
        let password_hash = match request.password.as_deref() {
            Some(password) if !password.is_empty() => {
                Some(hash_password(password).map_err(AuthError::from)?)
            }
            _ => None,
        };

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            "UPDATE users SET
                 email = COALESCE($2, email),
                 password_hash = COALESCE($3, password_hash),
                 first_name = COALESCE($4, first_name),
                 first_surname = COALESCE($5, first_surname),
                 second_surname = CASE WHEN $6::TEXT IS NULL THEN second_surname ELSE NULLIF($6, '') END,
                 phone = CASE WHEN $7::TEXT IS NULL THEN phone ELSE NULLIF($7, '') END,
                 address = CASE WHEN $8::TEXT IS NULL THEN address ELSE NULLIF($8, '') END,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(request.email.as_deref().map(str::trim))
        .bind(password_hash)
        .bind(request.first_name.as_deref().map(str::trim))
        .bind(request.first_surname.as_deref().map(str::trim))
        .bind(request.second_surname.as_deref().map(str::trim))
        .bind(request.phone.as_deref().map(str::trim))
        .bind(request.address.as_deref().map(str::trim))
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("User", user_id));
        }

        if let Some(profile) = &request.profile {
            let result = match profile {
                ProfileInput::Student(student) => {
                    sqlx::query(
                        "UPDATE students SET birth_date = $2, weight = $3, height = $4, sex = $5 WHERE user_id = $1",
                    )
                    .bind(user_id)
                    .bind(student.birth_date)
                    .bind(student.weight)
                    .bind(student.height)
                    .bind(&student.sex)
                    .execute(&mut *tx)
                    .await?
                }
                ProfileInput::Teacher(teacher) => {
                    sqlx::query("UPDATE teachers SET specialty = $2 WHERE user_id = $1")
                        .bind(user_id)
                        .bind(&teacher.specialty)
                        .execute(&mut *tx)
                        .await?
                }
                ProfileInput::Admin(admin) => {
                    sqlx::query("UPDATE administrators SET active = $2 WHERE user_id = $1")
                        .bind(user_id)
                        .bind(admin.active)
                        .execute(&mut *tx)
                        .await?
                }
            };

            if result.rows_affected() == 0 {
                return Err(AppError::BadRequest(format!(
                    "User {} has no {} profile",
                    user_id,
                    profile.role().as_str()
                )));
            }
        }

        tx.commit().await?;

        tracing::info!(user_id, "Updated user");

        self.get_user(user_id).await
    }

    /// Delete a user; its profiles, reservations and routines go with it.
    pub async fn delete_user(&self, user_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User", user_id));
        }

        tracing::info!(user_id, "Deleted user");
        Ok(())
    }

    /// Student profile id of a user, if it has one.
    pub async fn student_id_for_user(&self, user_id: i64) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM students WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(id)
    }

    pub async fn student_options(&self) -> Result<Vec<StudentOption>> {
        let students = sqlx::query_as::<_, StudentOption>(
            "SELECT s.id, CONCAT_WS(' ', u.first_name, u.first_surname, NULLIF(u.second_surname, '')) AS name
             FROM students s JOIN users u ON u.id = s.user_id
             ORDER BY u.first_name, u.first_surname, s.id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(students)
    }
}
