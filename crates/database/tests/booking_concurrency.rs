//! Database-backed checks of the booking write path. They need a migrated
//! PostgreSQL reachable through `DATABASE_URL`, so they are ignored by default.
//! Run with: cargo test -p database -- --ignored

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use configuration::DatabaseSettings;
use core_types::{
    BookingStatus, BookingUpdate, Court, MaintainedTable, NewBooking, NewClient, NewCourt,
    NewCourtType,
};
use database::{DbError, DbRepository, connect, run_migrations};
use rust_decimal_macros::dec;

const ACTOR: &str = "integration-test";

async fn repository() -> DbRepository {
    dotenvy::dotenv().ok();
    let settings = DatabaseSettings {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests"),
        host: "localhost".to_string(),
        port: 5432,
        name: "sportcourt_reservations".to_string(),
        max_connections: 5,
        acquire_timeout_secs: 5,
        connect_timeout_secs: 5,
        application_name: "courtbook-tests".to_string(),
    };
    let pool = connect(&settings).await.expect("db connect");
    run_migrations(&pool).await.expect("migrations");
    DbRepository::new(pool)
}

fn unique(tag: &str) -> String {
    format!("{}-{}", tag, Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn booking_day() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(30)
}

/// A fresh client and court so tests never see each other's bookings.
async fn seed(repo: &DbRepository) -> (i32, Court) {
    let client = repo
        .create_client(
            &NewClient {
                first_name: "Ana".to_string(),
                last_name: "Diaz".to_string(),
                phone: None,
                email: format!("{}@example.com", unique("ana")),
                birth_date: None,
            },
            ACTOR,
        )
        .await
        .expect("seed client");
    let court_type = repo
        .create_court_type(
            &NewCourtType {
                name: unique("Padel"),
                description: None,
                price_per_hour: dec!(20),
                active: true,
            },
            ACTOR,
        )
        .await
        .expect("seed court type");
    let court = repo
        .create_court(
            &NewCourt {
                name: unique("Central"),
                court_type_id: Some(court_type.id),
                sport: "padel".to_string(),
                capacity: 4,
                price_per_hour: dec!(20),
                status: core_types::CourtStatus::Active,
                opens_at: t(8, 0),
                closes_at: t(22, 0),
                description: None,
            },
            ACTOR,
        )
        .await
        .expect("seed court");
    (client.id, court)
}

fn request(client_id: i32, court_id: i32, start: NaiveTime, end: NaiveTime) -> NewBooking {
    NewBooking {
        client_id,
        court_id,
        date: booking_day(),
        start_time: start,
        end_time: end,
        notes: None,
    }
}

#[tokio::test]
#[ignore]
async fn concurrent_overlapping_bookings_admit_exactly_one() {
    let repo = repository().await;
    let (client_id, court) = seed(&repo).await;

    let first = request(client_id, court.id, t(14, 0), t(15, 30));
    let second = request(client_id, court.id, t(15, 0), t(16, 0));
    let (a, b) = {
        let (repo_a, repo_b) = (repo.clone(), repo.clone());
        let a = tokio::spawn(async move { repo_a.create_booking(&first, ACTOR).await });
        let b = tokio::spawn(async move { repo_b.create_booking(&second, ACTOR).await });
        (a.await.unwrap(), b.await.unwrap())
    };

    let results = [a, b];
    let created = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(DbError::Conflict(_))))
        .count();
    assert_eq!((created, conflicts), (1, 1), "got {:?}", results);
}

#[tokio::test]
#[ignore]
async fn back_to_back_bookings_are_both_accepted() {
    let repo = repository().await;
    let (client_id, court) = seed(&repo).await;

    repo.create_booking(&request(client_id, court.id, t(10, 0), t(11, 0)), ACTOR)
        .await
        .expect("first booking");
    repo.create_booking(&request(client_id, court.id, t(11, 0), t(12, 0)), ACTOR)
        .await
        .expect("touching booking");
}

#[tokio::test]
#[ignore]
async fn update_keeping_its_own_slot_does_not_conflict_with_itself() {
    let repo = repository().await;
    let (client_id, court) = seed(&repo).await;

    let booking = repo
        .create_booking(&request(client_id, court.id, t(18, 0), t(19, 0)), ACTOR)
        .await
        .expect("booking");
    let mut fields = request(client_id, court.id, t(18, 0), t(19, 0));
    fields.notes = Some("bring racquets".to_string());

    let updated = repo
        .update_booking(
            booking.id,
            &BookingUpdate { fields, status: BookingStatus::Confirmed },
            ACTOR,
        )
        .await
        .expect("self-overlapping update");
    assert_eq!(updated.status, BookingStatus::Confirmed);
    assert_eq!(updated.notes.as_deref(), Some("bring racquets"));
}

#[tokio::test]
#[ignore]
async fn exclusion_constraint_violation_maps_to_conflict() {
    let repo = repository().await;
    let (client_id, court) = seed(&repo).await;

    repo.create_booking(&request(client_id, court.id, t(9, 0), t(10, 0)), ACTOR)
        .await
        .expect("booking");

    // Bypasses the court lock and the in-Rust check on purpose.
    let err = sqlx::query(
        "INSERT INTO reservas (cliente_id, cancha_id, fecha_reserva, hora_inicio, hora_fin, duracion, estado) \
         VALUES ($1, $2, $3, $4, $5, 1, 'pendiente')",
    )
    .bind(client_id)
    .bind(court.id)
    .bind(booking_day())
    .bind(t(9, 30))
    .bind(t(10, 30))
    .execute(repo.pool())
    .await
    .expect_err("overlapping insert must be rejected");
    assert!(matches!(DbError::from(err), DbError::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn email_cleanup_leaves_case_twins_alone() {
    let repo = repository().await;
    let local = unique("twin");
    for email in [format!("{}@example.com", local), format!("{}@EXAMPLE.com", local)] {
        repo.create_client(
            &NewClient {
                first_name: "Twin".to_string(),
                last_name: "Case".to_string(),
                phone: None,
                email,
                birth_date: None,
            },
            ACTOR,
        )
        .await
        .expect("seed twin");
    }

    repo.clean_table(MaintainedTable::Clients, ACTOR)
        .await
        .expect("cleanup must not trip the unique e-mail constraint");
    let validation = repo
        .validate_table(MaintainedTable::Clients, ACTOR)
        .await
        .expect("validation");
    let twins = validation
        .violations
        .iter()
        .find(|v| v.rule == "email_case_duplicate")
        .map(|v| v.rows)
        .unwrap_or_default();
    assert!(twins >= 2);
}

#[tokio::test]
#[ignore]
async fn roles_of_follows_nested_groups() {
    let repo = repository().await;
    let top = unique("app").replace('-', "_");
    let group = unique("grp").replace('-', "_");
    let login = unique("usr").replace('-', "_");
    let pool = repo.pool();

    for statement in [
        format!("CREATE ROLE {} NOLOGIN", top),
        format!("CREATE ROLE {} NOLOGIN", group),
        format!("CREATE ROLE {} LOGIN", login),
        format!("GRANT {} TO {}", top, group),
        format!("GRANT {} TO {}", group, login),
    ] {
        sqlx::query(&statement).execute(pool).await.expect("role setup");
    }

    let roles = repo.roles_of(&login).await;

    for statement in [
        format!("DROP ROLE {}", login),
        format!("DROP ROLE {}", group),
        format!("DROP ROLE {}", top),
    ] {
        sqlx::query(&statement).execute(pool).await.ok();
    }

    let names: Vec<String> = roles.expect("roles").into_iter().map(|r| r.name).collect();
    assert!(names.contains(&group));
    assert!(names.contains(&top), "inherited role missing from {:?}", names);
}
