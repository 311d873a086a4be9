mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use chrono::Duration;
use gymbro::auth::{verify_password, UserRole};
use gymbro::calendar;
use gymbro::error::AppError;
use gymbro::models::*;
use gymbro::services::*;
use pretty_assertions::assert_eq;
use tower::ServiceExt;
use uuid::Uuid;

use common::{app_with, json_body, request, test_database, token_for, Fixture};

fn days_ago(days: i64) -> String {
    (calendar::today() - Duration::days(days)).format("%Y-%m-%d").to_string()
}

fn days_ahead(days: i64) -> String {
    (calendar::today() + Duration::days(days)).format("%Y-%m-%d").to_string()
}

fn reservations_matching(q: &str) -> ReservationQuery {
    ReservationQuery {
        q: Some(q.to_string()),
        ..Default::default()
    }
}

fn ids(list: &ReservationList) -> Vec<i64> {
    list.page.items.iter().map(|r| r.id).collect()
}

#[tokio::test]
async fn reservation_list_applies_every_filter() {
    let Some(pool) = test_database().await else { return };
    let mut fx = Fixture::new(pool.clone()).await;
    let reservations = ReservationService::new(pool.clone());
    let tag = fx.tag.clone();

    let boxing_teacher = fx.teacher_named("Rocky", &format!("{}tb", tag)).await;
    let (_, ana) = fx.student_named("Ana", &format!("{}sa", tag)).await;
    let (_, luis) = fx.student_named("Luis", &format!("{}sb", tag)).await;

    let default_teacher = fx.teacher_id;
    let yoga = fx.class_named(&format!("Yoga {}", tag), default_teacher, 10, 20).await;
    let boxing = fx.class_named(&format!("Boxing {}", tag), boxing_teacher, 20, 20).await;

    let ana_yoga = reservations.book(ana, yoga).await.unwrap().reservation.id;
    let luis_yoga = reservations.book(luis, yoga).await.unwrap().reservation.id;
    let ana_boxing = reservations.book(ana, boxing).await.unwrap().reservation.id;
    fx.backdate(luis_yoga, 5).await;
    fx.backdate(ana_boxing, 10).await;

    // newest booking first
    let all = reservations.list_reservations(&reservations_matching(&tag)).await.unwrap();
    assert_eq!(all.page.total, 3);
    assert_eq!(ids(&all), vec![ana_yoga, luis_yoga, ana_boxing]);
    assert!(all.teachers.iter().any(|t| t.id == boxing_teacher));

    // search reaches student surname, teacher surname and class name, ignoring case
    let by_student = reservations
        .list_reservations(&reservations_matching(&format!("{}SB", tag.to_uppercase())))
        .await
        .unwrap();
    assert_eq!(ids(&by_student), vec![luis_yoga]);

    let by_teacher = reservations
        .list_reservations(&reservations_matching(&format!("{}tb", tag)))
        .await
        .unwrap();
    assert_eq!(ids(&by_teacher), vec![ana_boxing]);

    let by_class = reservations
        .list_reservations(&reservations_matching(&format!("boxing {}", tag)))
        .await
        .unwrap();
    assert_eq!(ids(&by_class), vec![ana_boxing]);

    let by_teacher_id = reservations
        .list_reservations(&ReservationQuery {
            teacher_id: Some(boxing_teacher.to_string()),
            ..reservations_matching(&tag)
        })
        .await
        .unwrap();
    assert_eq!(ids(&by_teacher_id), vec![ana_boxing]);

    // both ends of a date range are inclusive
    let booked_window = reservations
        .list_reservations(&ReservationQuery {
            reserved_from: Some(days_ago(5)),
            reserved_to: Some(days_ago(1)),
            ..reservations_matching(&tag)
        })
        .await
        .unwrap();
    assert_eq!(ids(&booked_window), vec![luis_yoga]);

    let later_classes = reservations
        .list_reservations(&ReservationQuery {
            class_from: Some(days_ahead(20)),
            ..reservations_matching(&tag)
        })
        .await
        .unwrap();
    assert_eq!(ids(&later_classes), vec![ana_boxing]);

    let earlier_classes = reservations
        .list_reservations(&ReservationQuery {
            class_to: Some(days_ahead(10)),
            ..reservations_matching(&tag)
        })
        .await
        .unwrap();
    assert_eq!(ids(&earlier_classes), vec![ana_yoga, luis_yoga]);

    // unreadable filters are dropped, not rejected
    let lenient = reservations
        .list_reservations(&ReservationQuery {
            reserved_from: Some("last tuesday".to_string()),
            teacher_id: Some("boxing".to_string()),
            ..reservations_matching(&tag)
        })
        .await
        .unwrap();
    assert_eq!(lenient.page.total, 3);

    // same filters through the HTTP query string
    let token = token_for(fx.user_ids[0], UserRole::Teacher);
    let uri = format!(
        "/api/v1/reservations?q={}&teacher_id={}&per_page=25",
        tag, boxing_teacher
    );
    let response = app_with(pool.clone())
        .oneshot(request(Method::GET, &uri, Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["per_page"], 25);
    assert_eq!(body["items"][0]["id"], ana_boxing);

    fx.cleanup().await;
}

#[tokio::test]
async fn reservation_list_pages_through_results() {
    let Some(pool) = test_database().await else { return };
    let mut fx = Fixture::new(pool.clone()).await;
    let reservations = ReservationService::new(pool.clone());
    let tag = fx.tag.clone();

    let teacher_id = fx.teacher_id;
    let class_id = fx.class_named(&format!("Crossfit {}", tag), teacher_id, 4, 30).await;
    let mut booked = Vec::new();
    for _ in 0..12 {
        let (_, student) = fx.student().await;
        booked.push(reservations.book(student, class_id).await.unwrap().reservation.id);
    }

    let first = reservations.list_reservations(&reservations_matching(&tag)).await.unwrap();
    assert_eq!(first.page.total, 12);
    assert_eq!(first.page.total_pages, 2);
    assert_eq!(first.page.items.len(), 10);

    let second = reservations
        .list_reservations(&ReservationQuery {
            page: Some("2".to_string()),
            ..reservations_matching(&tag)
        })
        .await
        .unwrap();
    assert_eq!(second.page.page, 2);
    assert_eq!(second.page.items.len(), 2);

    let mut seen: Vec<i64> = ids(&first).into_iter().chain(ids(&second)).collect();
    seen.sort_unstable();
    booked.sort_unstable();
    assert_eq!(seen, booked);

    let past_the_end = reservations
        .list_reservations(&ReservationQuery {
            page: Some("3".to_string()),
            ..reservations_matching(&tag)
        })
        .await
        .unwrap();
    assert!(past_the_end.page.items.is_empty());
    assert_eq!(past_the_end.page.total, 12);

    // an unsupported page size falls back to 10
    let odd_size = reservations
        .list_reservations(&ReservationQuery {
            per_page: Some("7".to_string()),
            ..reservations_matching(&tag)
        })
        .await
        .unwrap();
    assert_eq!(odd_size.page.per_page, 10);
    assert_eq!(odd_size.page.items.len(), 10);

    fx.cleanup().await;
}

fn users_matching(q: &str) -> UserQuery {
    UserQuery {
        q: Some(q.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn user_list_filters_by_role_and_name() {
    let Some(pool) = test_database().await else { return };
    let mut fx = Fixture::new(pool.clone()).await;
    let users = UserService::new(pool.clone());
    let tag = fx.tag.clone();

    let (ana, _) = fx.student_named("Ana", &format!("{}ua", tag)).await;
    let bea = fx.teacher_named("Bea", &format!("{}ub", tag)).await;
    let bea_user: i64 = sqlx::query_scalar("SELECT user_id FROM teachers WHERE id = $1")
        .bind(bea)
        .fetch_one(&pool)
        .await
        .unwrap();
    let carla = fx
        .user_named("Carla", &format!("{}uc", tag), ProfileInput::Admin(AdministratorProfile { active: true }))
        .await;
    let dora = fx
        .user_named("Dora", &format!("{}ud", tag), ProfileInput::Admin(AdministratorProfile { active: false }))
        .await;

    let all = users.list_users(&users_matching(&tag)).await.unwrap();
    assert_eq!(all.total, 4);
    let listed: Vec<(i64, Option<&str>)> = all.items.iter().map(|u| (u.id, u.role.as_deref())).collect();
    assert_eq!(
        listed,
        vec![
            (ana, Some("student")),
            (bea_user, Some("teacher")),
            (carla, Some("admin")),
            (dora, None),
        ]
    );

    for (role, expected) in [("teacher", bea_user), ("admin", carla), ("Student", ana)] {
        let filtered = users
            .list_users(&UserQuery {
                role: Some(role.to_string()),
                ..users_matching(&tag)
            })
            .await
            .unwrap();
        assert_eq!(filtered.total, 1, "{}", role);
        assert_eq!(filtered.items[0].id, expected, "{}", role);
    }

    // unknown roles are ignored
    let unknown_role = users
        .list_users(&UserQuery {
            role: Some("coach".to_string()),
            ..users_matching(&tag)
        })
        .await
        .unwrap();
    assert_eq!(unknown_role.total, 4);

    // the search runs over the joined full name and the email
    let by_full_name = users
        .list_users(&users_matching(&format!("CARLA {}UC", tag.to_uppercase())))
        .await
        .unwrap();
    assert_eq!(by_full_name.items.iter().map(|u| u.id).collect::<Vec<_>>(), vec![carla]);

    let dora_email = users.get_user(dora).await.unwrap().user.email;
    let by_email = users.list_users(&users_matching(&dora_email)).await.unwrap();
    assert_eq!(by_email.items.iter().map(|u| u.id).collect::<Vec<_>>(), vec![dora]);

    let second_page = users
        .list_users(&UserQuery {
            page: Some("2".to_string()),
            ..users_matching(&tag)
        })
        .await
        .unwrap();
    assert!(second_page.items.is_empty());
    assert_eq!(second_page.total, 4);

    fx.cleanup().await;
}

#[tokio::test]
async fn user_update_clears_empty_fields_and_keeps_absent_ones() {
    let Some(pool) = test_database().await else { return };
    let mut fx = Fixture::new(pool.clone()).await;
    let users = UserService::new(pool.clone());

    let created = users
        .create_user(CreateUserRequest {
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            password: "Password123!".to_string(),
            first_name: "Marta".to_string(),
            first_surname: "Gil".to_string(),
            second_surname: Some("Ruiz".to_string()),
            phone: Some("600111222".to_string()),
            address: Some("Main St 1".to_string()),
            profile: ProfileInput::Student(StudentProfile {
                birth_date: chrono::NaiveDate::from_ymd_opt(1995, 6, 1).unwrap(),
                weight: 60,
                height: 165,
                sex: "female".to_string(),
            }),
        })
        .await
        .unwrap();
    let user_id = created.user.id;
    fx.user_ids.push(user_id);

    let updated = users
        .update_user(
            user_id,
            UpdateUserRequest {
                first_name: Some(" Martina ".to_string()),
                phone: Some(String::new()),
                address: Some("   ".to_string()),
                password: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.user.first_name, "Martina");
    assert_eq!(updated.user.first_surname, "Gil");
    assert_eq!(updated.user.second_surname.as_deref(), Some("Ruiz"));
    assert_eq!(updated.user.phone, None);
    assert_eq!(updated.user.address, None);
    assert_eq!(updated.user.email, created.user.email);
    assert_eq!(updated.user.password_hash, created.user.password_hash);
    assert_eq!(updated.role, Some(UserRole::Student));

    let updated = users
        .update_user(
            user_id,
            UpdateUserRequest {
                password: Some("NewPassword123!".to_string()),
                second_surname: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.user.second_surname, None);
    assert!(verify_password("NewPassword123!", &updated.user.password_hash).unwrap());

    // a profile the user does not have rolls the whole update back
    let mismatch = users
        .update_user(
            user_id,
            UpdateUserRequest {
                phone: Some("699000000".to_string()),
                profile: Some(ProfileInput::Teacher(TeacherProfile {
                    specialty: "Yoga".to_string(),
                })),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(mismatch, Err(AppError::BadRequest(_)));
    assert_eq!(users.get_user(user_id).await.unwrap().user.phone, None);

    assert_matches!(
        users.update_user(i64::MAX, UpdateUserRequest::default()).await,
        Err(AppError::NotFound { resource: "User", .. })
    );

    fx.cleanup().await;
}
