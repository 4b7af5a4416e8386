//! Repository tests against a real tenant database

use chrono::NaiveDate;
use roster_core::{
    AttendanceForm, AttendanceStatus, CheckInForm, DatabaseConfig, DuesPaymentForm, MemberFilter,
    MemberForm, MemberStatus, PaymentMethod, ReferralForm, ReferralStatus, TenancyConfig,
    TenantSettings,
};
use roster_infra::{attendance, dues, members, referrals, reports, users, InfraError, TenantSchema};
use roster_security::Role;
use roster_tenant::{
    ConnectionRegistry, RequestScope, SessionProvider, TenantDirectory, TenantId, TenantSession,
};
use std::sync::Arc;

async fn session() -> (SessionProvider, TenantSession) {
    let url = format!(
        "sqlite:file:repo-{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4()
    );
    let tenancy =
        TenancyConfig::new("acme").with_tenant("acme", TenantSettings::new(&url, "Acme Lodge"));
    let directory = Arc::new(TenantDirectory::from_config(&tenancy).unwrap());
    let registry = Arc::new(ConnectionRegistry::new(directory, DatabaseConfig::default()));
    registry.sync_all(&TenantSchema).await.unwrap();

    let provider = SessionProvider::new(registry);
    let session = provider
        .acquire(&TenantId::parse("acme").unwrap(), RequestScope::new())
        .await
        .unwrap();
    (provider, session)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn member(first: &str, last: &str, email: &str) -> MemberForm {
    MemberForm {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        phone: None,
        status: MemberStatus::Active,
        joined_on: Some(date(2024, 9, 1)),
        notes: None,
    }
}

fn payment(period: &str, amount_cents: i64) -> DuesPaymentForm {
    DuesPaymentForm {
        period: period.to_string(),
        amount_cents,
        paid_on: date(2026, 2, 1),
        method: PaymentMethod::Transfer,
        note: None,
    }
}

#[tokio::test]
async fn test_member_lifecycle() {
    let (_provider, mut session) = session().await;
    let mut guard = session.conn().unwrap();
    let conn = &mut *guard;

    let ada = members::create(conn, member("Ada", "Lovelace", "Ada@Example.com"))
        .await
        .unwrap();
    assert_eq!(ada.email, "ada@example.com");
    assert_eq!(ada.joined_on, Some(date(2024, 9, 1)));

    let duplicate = members::create(conn, member("Other", "Person", "ada@example.com")).await;
    assert!(matches!(duplicate, Err(InfraError::Conflict(_))));

    members::create(conn, member("Grace", "Hopper", "grace@example.com"))
        .await
        .unwrap();

    let mut form = member("Ada", "King", "ada@example.com");
    form.status = MemberStatus::Inactive;
    let updated = members::update(conn, ada.id, form).await.unwrap();
    assert_eq!(updated.last_name, "King");
    assert_eq!(updated.created_at, ada.created_at);

    let inactive = members::list(
        conn,
        &MemberFilter {
            status: Some(MemberStatus::Inactive),
            search: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(inactive.len(), 1);

    let found = members::list(
        conn,
        &MemberFilter {
            status: None,
            search: Some("HOP".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].first_name, "Grace");

    members::delete(conn, ada.id).await.unwrap();
    assert!(matches!(
        members::get(conn, ada.id).await,
        Err(InfraError::NotFound { entity: "member", .. })
    ));
    assert!(matches!(
        members::delete(conn, ada.id).await,
        Err(InfraError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_member_optional_fields_round_trip_as_null() {
    let (_provider, mut session) = session().await;
    let mut guard = session.conn().unwrap();
    let conn = &mut *guard;

    let mut form = member("Ada", "Lovelace", "ada@example.com");
    form.joined_on = None;
    let ada = members::create(conn, form).await.unwrap();
    assert_eq!(ada.phone, None);
    assert_eq!(ada.notes, None);
    assert_eq!(ada.joined_on, None);

    let fetched = members::get(conn, ada.id).await.unwrap();
    assert_eq!((fetched.phone, fetched.notes), (None, None));

    let mut form = member("Ada", "Lovelace", "ada@example.com");
    form.phone = Some("555-0100".to_string());
    form.notes = Some("Founding member".to_string());
    let filled = members::update(conn, ada.id, form).await.unwrap();
    assert_eq!(filled.phone.as_deref(), Some("555-0100"));
    assert_eq!(filled.notes.as_deref(), Some("Founding member"));

    // Clearing the fields writes NULL back
    let cleared = members::update(conn, ada.id, member("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    assert_eq!((cleared.phone, cleared.notes), (None, None));

    let listed = members::list(conn, &MemberFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].phone, None);

    let payment = dues::record(conn, ada.id, payment("2026", 500)).await.unwrap();
    assert_eq!(payment.note, None);
    assert_eq!(dues::list_for_member(conn, ada.id).await.unwrap()[0].note, None);
}

#[tokio::test]
async fn test_referral_without_phone_or_note() {
    let (_provider, mut session) = session().await;
    let mut guard = session.conn().unwrap();
    let conn = &mut *guard;

    members::create(conn, member("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    let form = ReferralForm {
        referrer_email: "ada@example.com".to_string(),
        candidate_name: "Mary Somerville".to_string(),
        candidate_email: "mary@example.com".to_string(),
        candidate_phone: None,
        note: None,
    };
    let referral = referrals::submit(conn, form).await.unwrap();
    assert_eq!(referral.candidate_phone, None);
    assert_eq!(referral.note, None);

    let listed = referrals::list(conn, None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].candidate_phone, None);
    assert_eq!(listed[0].note, None);

    let joined = referrals::update_status(conn, referral.id, ReferralStatus::Joined)
        .await
        .unwrap();
    let prospect = joined.prospect.unwrap();
    assert_eq!(prospect.phone, None);
    assert_eq!(
        prospect.notes,
        Some(format!("Joined through referral {}", referral.id))
    );
}

#[tokio::test]
async fn test_invalid_member_form_is_rejected() {
    let (_provider, mut session) = session().await;

    let result = members::create(&mut *session.conn().unwrap(), member("", "Nobody", "not-an-email")).await;
    assert!(matches!(result, Err(InfraError::Invalid(_))));
}

#[tokio::test]
async fn test_dues_status_for_period() {
    let (_provider, mut session) = session().await;
    let mut guard = session.conn().unwrap();
    let conn = &mut *guard;

    let ada = members::create(conn, member("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    let grace = members::create(conn, member("Grace", "Hopper", "grace@example.com"))
        .await
        .unwrap();

    dues::record(conn, ada.id, payment("2026", 6000)).await.unwrap();
    dues::record(conn, ada.id, payment("2026", 9000)).await.unwrap();
    let old = dues::record(conn, grace.id, payment("2025", 12000)).await.unwrap();
    dues::record(conn, grace.id, payment("2026", 4000)).await.unwrap();

    let standing = dues::status(conn, "2026", 12000).await.unwrap();
    assert_eq!(standing.len(), 2);

    // Ordered by last name
    assert_eq!(standing[0].member_name, "Grace Hopper");
    assert_eq!(standing[0].paid_cents, 4000);
    assert_eq!(standing[0].outstanding_cents, 8000);
    assert_eq!(standing[1].paid_cents, 15000);
    assert_eq!(standing[1].outstanding_cents, 0);

    assert_eq!(dues::list_for_member(conn, grace.id).await.unwrap().len(), 2);
    dues::delete(conn, old.id).await.unwrap();
    assert_eq!(dues::list_for_member(conn, grace.id).await.unwrap().len(), 1);

    assert!(matches!(
        dues::record(conn, 9999, payment("2026", 100)).await,
        Err(InfraError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_attendance_upsert_and_check_in() {
    let (_provider, mut session) = session().await;
    let mut guard = session.conn().unwrap();
    let conn = &mut *guard;

    let ada = members::create(conn, member("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    let meeting = date(2026, 3, 4);

    let first = attendance::record(
        conn,
        &AttendanceForm {
            member_id: ada.id,
            meeting_date: meeting,
            status: AttendanceStatus::Absent,
        },
    )
    .await
    .unwrap();

    let again = attendance::check_in(
        conn,
        CheckInForm {
            email: " ADA@example.com".to_string(),
            meeting_date: meeting,
        },
    )
    .await
    .unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(again.status, AttendanceStatus::Present);

    attendance::record(
        conn,
        &AttendanceForm {
            member_id: ada.id,
            meeting_date: date(2026, 3, 11),
            status: AttendanceStatus::Excused,
        },
    )
    .await
    .unwrap();

    assert_eq!(attendance::list_by_date(conn, meeting).await.unwrap().len(), 1);

    let summary = attendance::summary_for_member(conn, ada.id).await.unwrap();
    assert_eq!((summary.present, summary.absent, summary.excused), (1, 0, 1));

    let unknown = attendance::check_in(
        conn,
        CheckInForm {
            email: "stranger@example.com".to_string(),
            meeting_date: meeting,
        },
    )
    .await;
    assert!(matches!(unknown, Err(InfraError::Invalid(_))));
}

#[tokio::test]
async fn test_referral_joining_creates_prospect() {
    let (_provider, mut session) = session().await;
    let mut guard = session.conn().unwrap();
    let conn = &mut *guard;

    let ada = members::create(conn, member("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();

    let form = ReferralForm {
        referrer_email: "ada@example.com".to_string(),
        candidate_name: "Charles Babbage".to_string(),
        candidate_email: "Charles@Example.com".to_string(),
        candidate_phone: None,
        note: Some("Met at the engine demo".to_string()),
    };
    let referral = referrals::submit(conn, form.clone()).await.unwrap();
    assert_eq!(referral.referrer_id, Some(ada.id));
    assert_eq!(referral.status, ReferralStatus::Pending);

    let stranger = ReferralForm {
        referrer_email: "nobody@example.com".to_string(),
        ..form
    };
    assert!(matches!(
        referrals::submit(conn, stranger).await,
        Err(InfraError::Invalid(_))
    ));

    referrals::update_status(conn, referral.id, ReferralStatus::Contacted)
        .await
        .unwrap();
    let joined = referrals::update_status(conn, referral.id, ReferralStatus::Joined)
        .await
        .unwrap();
    let prospect = joined.prospect.unwrap();
    assert_eq!(prospect.status, MemberStatus::Prospect);
    assert_eq!(prospect.first_name, "Charles");
    assert_eq!(prospect.last_name, "Babbage");
    assert_eq!(prospect.email, "charles@example.com");

    let reopen = referrals::update_status(conn, referral.id, ReferralStatus::Pending).await;
    assert!(matches!(reopen, Err(InfraError::Invalid(_))));

    let pending = referrals::list(conn, Some(ReferralStatus::Pending)).await.unwrap();
    assert!(pending.is_empty());
    assert_eq!(referrals::list(conn, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_users() {
    let (_provider, mut session) = session().await;
    let mut guard = session.conn().unwrap();
    let conn = &mut *guard;

    let user = users::create(conn, "Treasurer", "$argon2id$v=19$placeholder", Role::Officer)
        .await
        .unwrap();
    assert_eq!(user.username, "treasurer");

    let taken = users::create(conn, "treasurer", "$argon2id$v=19$other", Role::Admin).await;
    assert!(matches!(taken, Err(InfraError::Conflict(_))));

    let found = users::find_by_username(conn, "TREASURER").await.unwrap().unwrap();
    assert_eq!(found.role, Role::Officer);
    assert!(users::find_by_username(conn, "ghost").await.unwrap().is_none());
    assert_eq!(users::count(conn).await.unwrap(), 1);
}

#[tokio::test]
async fn test_csv_reports() {
    let (_provider, mut session) = session().await;
    let mut guard = session.conn().unwrap();
    let conn = &mut *guard;

    let empty = String::from_utf8(reports::members_csv(conn).await.unwrap()).unwrap();
    assert_eq!(empty.trim(), "id,first_name,last_name,email,phone,status,joined_on");

    let ada = members::create(conn, member("Ada", "Lovelace", "ada@example.com"))
        .await
        .unwrap();
    dues::record(conn, ada.id, payment("2026", 2550)).await.unwrap();
    attendance::record(
        conn,
        &AttendanceForm {
            member_id: ada.id,
            meeting_date: date(2026, 4, 1),
            status: AttendanceStatus::Present,
        },
    )
    .await
    .unwrap();

    let roster = String::from_utf8(reports::members_csv(conn).await.unwrap()).unwrap();
    assert!(roster.contains("Ada,Lovelace,ada@example.com,,active,2024-09-01"));

    let standing = String::from_utf8(reports::dues_csv(conn, "2026", 12000).await.unwrap()).unwrap();
    assert!(standing.contains("Ada Lovelace,2026,25.50,120.00,94.50"));

    let meetings = String::from_utf8(
        reports::attendance_csv(conn, date(2026, 3, 1), date(2026, 4, 30))
            .await
            .unwrap(),
    )
    .unwrap();
    assert!(meetings.contains("2026-04-01"));
    assert!(meetings.contains("Ada Lovelace,present"));

    let outside = String::from_utf8(
        reports::attendance_csv(conn, date(2026, 5, 1), date(2026, 5, 31))
            .await
            .unwrap(),
    )
    .unwrap();
    assert_eq!(outside.lines().count(), 1);

    assert!(matches!(
        reports::attendance_csv(conn, date(2026, 5, 2), date(2026, 5, 1)).await,
        Err(InfraError::Invalid(_))
    ));
}
