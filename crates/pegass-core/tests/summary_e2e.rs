//! Digest of a whole day against a stubbed target API.

mod common;

use chrono::NaiveDate;
use common::*;
use mockito::{Matcher, ServerGuard};
use pegass_core::storage::MemorySessionStore;
use pegass_core::{ActivityKind, ErrorKind, PegassClient, NO_ACTIVITY};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

const CHIEF: &str = "00000001A";
const MINOR_PSE1: &str = "00000002B";
const DRIVER: &str = "00000003C";

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
}

fn client_for(server: &ServerGuard) -> PegassClient {
    PegassClient::new(config_for(server), Arc::new(MemorySessionStore::new())).unwrap()
}

fn listing_query() -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("action".into(), "65".into()),
        Matcher::UrlEncoded("debut".into(), "2024-03-09".into()),
        Matcher::UrlEncoded("fin".into(), "2024-03-09".into()),
        Matcher::UrlEncoded("zoneGeoId".into(), "92".into()),
        Matcher::UrlEncoded("page".into(), "0".into()),
    ])
}

fn occurrence(id: &str, activity: &str) -> Value {
    json!({ "id": id, "activite": { "id": activity } })
}

fn activity(id: &str, label: &str, type_code: i64, structure: i64, slot: (&str, &str)) -> Value {
    json!({
        "id": id,
        "libelle": label,
        "typeActivite": { "id": type_code, "action": { "id": 65 } },
        "structureMenantActivite": { "id": structure },
        "statut": "Complète",
        "seanceList": [
            { "id": format!("{id}-s1"), "debut": slot.0, "fin": slot.1 }
        ],
    })
}

fn registration(member: &str, role_type: &str, role: &str) -> Value {
    json!({ "utilisateur": { "id": member }, "type": role_type, "role": role })
}

fn member(id: &str, first: &str, last: &str, minor: bool) -> Value {
    json!({ "id": id, "prenom": first, "nom": last, "mineur": minor, "actif": true })
}

/// Messages of every WARN event.
struct WarnRecorder(Arc<Mutex<Vec<String>>>);

impl<S: Subscriber> Layer<S> for WarnRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut message = MessageField::default();
        event.record(&mut message);
        self.0.lock().unwrap().push(message.0);
    }
}

#[derive(Default)]
struct MessageField(String);

impl Visit for MessageField {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Run `future` on this thread with a subscriber recording warnings.
async fn with_warnings<F: Future>(future: F) -> (F::Output, Vec<String>) {
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(WarnRecorder(recorded.clone()));
    let output = {
        let _guard = tracing::subscriber::set_default(subscriber);
        future.await
    };
    let warnings = recorded.lock().unwrap().clone();
    (output, warnings)
}

async fn mock_listing(server: &mut ServerGuard, occurrences: Value) -> mockito::Mock {
    json_mock(
        server,
        "GET",
        "/crf/rest/seance",
        json!({ "content": occurrences, "number": 0, "totalPages": 1 }),
    )
    .match_query(listing_query())
    .create_async()
    .await
}

/// A field post of the local unit and the dispatch desk, listed in the
/// wrong order.
async fn mock_day(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let mut mocks = vec![
        mock_listing(
            server,
            json!([occurrence("act-r-s1", "act-r"), occurrence("act-d-s1", "act-d")]),
        )
        .await,
    ];

    let fixtures = [
        (
            "/crf/rest/activite/act-d",
            activity(
                "act-d",
                "DAUPHIN",
                10115,
                1234,
                ("2024-03-09T08:00:00", "2024-03-09T20:00:00"),
            ),
        ),
        (
            "/crf/rest/activite/act-r",
            activity(
                "act-r",
                "REGULATION",
                10114,
                97,
                ("2024-03-09T06:00:00", "2024-03-09T14:00:00"),
            ),
        ),
        (
            "/crf/rest/zonegeo/departement/92",
            json!({ "structuresFilles": [{ "id": 1234, "libelle": "UNITE LOCALE DE BOULOGNE" }] }),
        ),
        (
            "/crf/rest/seance/act-d-s1/inscription",
            json!([
                registration(CHIEF, "NOMI", "254"),
                registration(MINOR_PSE1, "FORM", "166"),
                registration(DRIVER, "COMP", "10"),
            ]),
        ),
        (
            "/crf/rest/seance/act-r-s1/inscription",
            json!([
                registration("00000011K", "COMP", "18"),
                registration("00000012L", "COMP", "18"),
                registration("00000013M", "COMP", "80"),
                registration("00000014N", "COMP", "63"),
            ]),
        ),
        (
            "/crf/rest/utilisateur/00000001A",
            member(CHIEF, "Jeanne", "Martin", false),
        ),
        (
            "/crf/rest/utilisateur/00000002B",
            member(MINOR_PSE1, "Léo", "Petit", true),
        ),
        (
            "/crf/rest/utilisateur/00000003C",
            member(DRIVER, "Paul", "Durand", false),
        ),
    ];
    for (path, body) in fixtures {
        mocks.push(json_mock(server, "GET", path, body).create_async().await);
    }

    mocks.push(
        json_mock(
            server,
            "GET",
            "/crf/rest/moyencomutilisateur",
            json!([
                { "moyenComId": "MAIL", "libelle": "jeanne@example.org" },
                { "moyenComId": "POR", "libelle": "0601020304" }
            ]),
        )
        .match_query(Matcher::UrlEncoded("utilisateur".into(), CHIEF.into()))
        .create_async()
        .await,
    );
    // dispatch desk members
    mocks.push(
        server
            .mock("GET", Matcher::Regex(r"^/crf/rest/utilisateur/0000001\d[A-Z]$".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(member("00000011K", "Alex", "Roux", false).to_string())
            .create_async()
            .await,
    );
    mocks
}

#[tokio::test]
async fn field_posts_print_before_dispatch() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_day(&mut server).await;
    let client = client_for(&server);

    let digest = client
        .summarize(day(), ActivityKind::MedicalDispatch, false)
        .await
        .unwrap();

    let dauphin = digest.find("DAUPHIN [BOULOGNE]").unwrap();
    let regulation = digest.find("REGULATION").unwrap();
    assert!(dauphin < regulation, "{digest}");
    assert!(digest.starts_with("DAUPHIN"), "{digest}");
    assert!(digest.contains("\t✅ — 08:00 - 20:00 [3 PAX]"), "{digest}");
    assert!(digest.contains("⚠️ 1 🔞"), "{digest}");
    assert!(digest.contains("📞 Jeanne Martin 0601020304"), "{digest}");
    assert!(digest.contains("⚠️ 0 PSE2"), "{digest}");
    assert!(!digest.contains("PSE1 (max 1)"), "{digest}");
}

#[tokio::test]
async fn dispatch_desk_counts_evaluators_as_dispatchers() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_day(&mut server).await;
    let client = client_for(&server);

    let digest = client
        .summarize(day(), ActivityKind::MedicalDispatch, false)
        .await
        .unwrap();

    assert!(digest.contains("\t✅ — 06:00 - 14:00 [4 PAX][CRF]"), "{digest}");
    assert!(digest.contains("4 ARS, 0 OPR, 0 Stagiaire"), "{digest}");
    assert!(digest.contains("ℹ️ Evaluation in progress"), "{digest}");
    // no header suffix on the dispatch desk
    assert!(digest.contains("\nREGULATION\n"), "{digest}");
}

#[tokio::test]
async fn fire_brigade_digest_skips_medical_posts() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_day(&mut server).await;
    let client = client_for(&server);

    let digest = client
        .summarize(day(), ActivityKind::FireBrigade, false)
        .await
        .unwrap();

    assert_eq!(digest, NO_ACTIVITY);
}

#[tokio::test]
async fn suppressed_details_skip_registrant_lookups() {
    let mut server = mockito::Server::new_async().await;
    let inscriptions = server
        .mock("GET", Matcher::Regex(r"/inscription$".into()))
        .expect(0)
        .create_async()
        .await;
    let _listing = mock_listing(&mut server, json!([occurrence("act-d-s1", "act-d")])).await;
    let _activity = json_mock(
        &mut server,
        "GET",
        "/crf/rest/activite/act-d",
        activity(
            "act-d",
            "DAUPHIN",
            10115,
            1234,
            ("2024-03-09T08:00:00", "2024-03-09T20:00:00"),
        ),
    )
    .create_async()
    .await;
    let _structures = json_mock(
        &mut server,
        "GET",
        "/crf/rest/zonegeo/departement/92",
        json!({ "structuresFilles": [{ "id": 1234, "libelle": "UNITE LOCALE DE BOULOGNE" }] }),
    )
    .create_async()
    .await;
    let client = client_for(&server);

    let digest = client
        .summarize(day(), ActivityKind::MedicalDispatch, true)
        .await
        .unwrap();

    assert_eq!(digest, "DAUPHIN [BOULOGNE]\n\t✅ — 08:00 - 20:00\n");
    inscriptions.assert_async().await;
}

#[tokio::test]
async fn empty_day_prints_fallback() {
    let mut server = mockito::Server::new_async().await;
    let _listing = json_mock(
        &mut server,
        "GET",
        "/crf/rest/seance",
        json!({ "content": [], "totalElements": 0 }),
    )
    .match_query(Matcher::Any)
    .create_async()
    .await;
    let structures = server
        .mock("GET", "/crf/rest/zonegeo/departement/92")
        .expect(0)
        .create_async()
        .await;
    let client = client_for(&server);

    let digest = client
        .summarize(day(), ActivityKind::MedicalDispatch, false)
        .await
        .unwrap();

    assert_eq!(digest, NO_ACTIVITY);
    structures.assert_async().await;
}

#[tokio::test]
async fn failed_listing_is_fatal() {
    let mut server = mockito::Server::new_async().await;
    let _listing = server
        .mock("GET", "/crf/rest/seance")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    let client = client_for(&server);

    let err = client
        .summarize(day(), ActivityKind::MedicalDispatch, false)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProtocolState);
}

#[tokio::test]
async fn unreadable_activity_is_skipped() {
    let mut server = mockito::Server::new_async().await;
    let _listing = mock_listing(
        &mut server,
        json!([occurrence("gone-s1", "gone"), occurrence("act-r-s1", "act-r")]),
    )
    .await;
    let _gone = server
        .mock("GET", "/crf/rest/activite/gone")
        .with_status(404)
        .create_async()
        .await;
    let _activity = json_mock(
        &mut server,
        "GET",
        "/crf/rest/activite/act-r",
        activity(
            "act-r",
            "REGULATION",
            10114,
            97,
            ("2024-03-09T06:00:00", "2024-03-09T14:00:00"),
        ),
    )
    .create_async()
    .await;
    let _registrations = json_mock(
        &mut server,
        "GET",
        "/crf/rest/seance/act-r-s1/inscription",
        json!([]),
    )
    .create_async()
    .await;
    let client = client_for(&server);

    let digest = client
        .summarize(day(), ActivityKind::MedicalDispatch, false)
        .await
        .unwrap();

    assert_eq!(digest, "REGULATION\n\t✅ — 06:00 - 14:00 [0 PAX]\n");
}

#[tokio::test]
async fn repeated_label_prints_one_section() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = vec![
        mock_listing(
            &mut server,
            json!([
                occurrence("act-d2-s1", "act-d2"),
                occurrence("act-c-s1", "act-c"),
                occurrence("act-d1-s1", "act-d1"),
            ]),
        )
        .await,
    ];
    let fixtures = [
        (
            "/crf/rest/activite/act-d1",
            activity(
                "act-d1",
                "01-DAUPHIN",
                10115,
                1234,
                ("2024-03-09T08:00:00", "2024-03-09T12:00:00"),
            ),
        ),
        (
            "/crf/rest/activite/act-c",
            activity(
                "act-c",
                "02-CLAMART",
                10115,
                1234,
                ("2024-03-09T10:00:00", "2024-03-09T14:00:00"),
            ),
        ),
        (
            "/crf/rest/activite/act-d2",
            activity(
                "act-d2",
                "01-DAUPHIN",
                10115,
                1234,
                ("2024-03-09T20:00:00", "2024-03-09T23:00:00"),
            ),
        ),
        (
            "/crf/rest/zonegeo/departement/92",
            json!({ "structuresFilles": [{ "id": 1234, "libelle": "UNITE LOCALE DE BOULOGNE" }] }),
        ),
    ];
    for (path, body) in fixtures {
        mocks.push(json_mock(&mut server, "GET", path, body).create_async().await);
    }
    let client = client_for(&server);

    let digest = client
        .summarize(day(), ActivityKind::MedicalDispatch, true)
        .await
        .unwrap();

    assert_eq!(digest.matches("01-DAUPHIN").count(), 1, "{digest}");
    assert_eq!(digest.matches("02-CLAMART").count(), 1, "{digest}");
    assert_eq!(
        digest,
        "01-DAUPHIN [BOULOGNE]\n\t✅ — 08:00 - 12:00\n\t✅ — 20:00 - 23:00\n\n\
         02-CLAMART [BOULOGNE]\n\t✅ — 10:00 - 14:00\n"
    );
}

#[tokio::test]
async fn unmapped_role_is_counted_and_warned_once() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = vec![mock_listing(&mut server, json!([occurrence("act-d-s1", "act-d")])).await];
    let fixtures = [
        (
            "/crf/rest/activite/act-d",
            activity(
                "act-d",
                "DAUPHIN",
                10115,
                1234,
                ("2024-03-09T08:00:00", "2024-03-09T20:00:00"),
            ),
        ),
        (
            "/crf/rest/seance/act-d-s1/inscription",
            json!([
                registration("00000004D", "FORM", "167"),
                registration("00000009X", "XXX", "999"),
            ]),
        ),
        (
            "/crf/rest/utilisateur/00000004D",
            member("00000004D", "Ana", "Blanc", false),
        ),
        (
            "/crf/rest/utilisateur/00000009X",
            member("00000009X", "Marc", "Noir", false),
        ),
    ];
    for (path, body) in fixtures {
        mocks.push(json_mock(&mut server, "GET", path, body).create_async().await);
    }
    let client = client_for(&server);
    let activities = client
        .activities_on(day(), ActivityKind::MedicalDispatch)
        .await
        .unwrap();

    let (tally, warnings) = with_warnings(client.registrant_tally(&activities[0])).await;
    let tally = tally.unwrap();

    assert_eq!(tally.unknown, 1);
    assert_eq!(tally.pse2, 1);
    assert_eq!(tally.participants, 2);
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(
        warnings[0].contains("role type 'XXX' code '999'"),
        "{warnings:?}"
    );
}
