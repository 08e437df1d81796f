//! Roster listings and dispatch statistics over paginated endpoints.

mod common;

use chrono::NaiveDate;
use common::*;
use mockito::{Matcher, ServerGuard};
use pegass_core::storage::MemorySessionStore;
use pegass_core::{DateRange, ErrorKind, MemberCounters, PegassClient, RoleType};
use serde_json::{json, Value};
use std::sync::Arc;

fn client_for(server: &ServerGuard) -> PegassClient {
    PegassClient::new(config_for(server), Arc::new(MemorySessionStore::new())).unwrap()
}

fn members(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({ "id": id, "nom": "NOM", "prenom": id, "actif": true }))
            .collect(),
    )
}

#[tokio::test]
async fn dispatchers_span_every_page_in_order() {
    let mut server = mockito::Server::new_async().await;
    let mut pages = Vec::new();
    for (index, ids) in [["A1", "A2", "A3"], ["B1", "B2", "B3"]].iter().enumerate() {
        pages.push(
            json_mock(
                &mut server,
                "GET",
                "/crf/rest/utilisateur",
                json!({ "list": members(ids), "page": index, "pages": 2, "total": 6 }),
            )
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("role".into(), "18".into()),
                Matcher::UrlEncoded("perPage".into(), "11".into()),
                Matcher::UrlEncoded("zoneGeoId".into(), "92".into()),
                Matcher::UrlEncoded("page".into(), index.to_string()),
            ]))
            .expect(1)
            .create_async()
            .await,
        );
    }
    let client = client_for(&server);

    let dispatchers = client.fetch_dispatchers().await.unwrap();

    let ids: Vec<&str> = dispatchers.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["A1", "A2", "A3", "B1", "B2", "B3"]);
    for page in pages {
        page.assert_async().await;
    }
}

#[tokio::test]
async fn role_lookup_is_by_exact_label() {
    let mut server = mockito::Server::new_async().await;
    let _roles = json_mock(
        &mut server,
        "GET",
        "/crf/rest/roles",
        json!([
            { "id": "254", "libelle": "Chef d'intervention", "type": "NOMI" },
            { "id": "166", "libelle": "PSE1", "type": "FORM" },
            { "id": "167", "libelle": "PSE2", "type": "FORM" }
        ]),
    )
    .create_async()
    .await;
    let client = client_for(&server);

    let role = client.find_role_by_name("PSE1").await.unwrap();
    assert_eq!(role.id, "166");
    assert_eq!(role.role_type, RoleType::Training);

    let err = client.find_role_by_name("PSE").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn nomination_search_uses_its_own_filter() {
    let mut server = mockito::Server::new_async().await;
    let search = json_mock(
        &mut server,
        "GET",
        "/crf/rest/utilisateur",
        json!({ "content": members(&["C1"]), "last": true }),
    )
    .match_query(Matcher::UrlEncoded("nomination".into(), "254".into()))
    .expect(1)
    .create_async()
    .await;
    let client = client_for(&server);
    let role = pegass_core::Role::new("254", "Chef d'intervention", RoleType::Nomination);

    let found = client.fetch_users_for_role(&role).await.unwrap();

    assert_eq!(found.len(), 1);
    search.assert_async().await;
}

#[tokio::test]
async fn unsupported_role_type_is_rejected_before_any_request() {
    let server = mockito::Server::new_async().await;
    let client = client_for(&server);
    let role = pegass_core::Role::new("1", "Participant", RoleType::Other("PART".into()));

    let err = client.fetch_users_for_role(&role).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn aggregated_stats_follow_the_last_flag() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for (index, occurrence, last) in [(0, "occ-1", false), (1, "occ-2", true)] {
        let listing = json_mock(
            &mut server,
            "GET",
            "/crf/rest/seance",
            json!({ "content": [{ "id": occurrence }], "last": last }),
        )
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("typeActivite".into(), "10114".into()),
            Matcher::UrlEncoded("structure".into(), "97".into()),
            Matcher::UrlEncoded("statut".into(), "COMPLETE".into()),
            Matcher::UrlEncoded("debut".into(), "2024-01-01".into()),
            Matcher::UrlEncoded("fin".into(), "2024-12-31".into()),
            Matcher::UrlEncoded("page".into(), index.to_string()),
        ]))
        .create_async()
        .await;
        mocks.push(listing);
    }
    let registration = |member: &str, role: &str| {
        json!({ "utilisateur": { "id": member }, "role": role, "type": "COMP" })
    };
    let _first = json_mock(
        &mut server,
        "GET",
        "/crf/rest/seance/occ-1/inscription",
        json!([registration("A", "18"), registration("B", "47")]),
    )
    .create_async()
    .await;
    let _second = json_mock(
        &mut server,
        "GET",
        "/crf/rest/seance/occ-2/inscription",
        json!([
            registration("A", "63"),
            registration("A", "80"),
            registration("C", "254")
        ]),
    )
    .create_async()
    .await;
    let client = client_for(&server);
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    )
    .unwrap();

    let stats = client.fetch_aggregated_stats(range).await.unwrap();

    assert_eq!(
        stats["A"],
        MemberCounters {
            dispatch: 2,
            evaluation: 1,
            radio_operator: 0
        }
    );
    assert_eq!(stats["B"].radio_operator, 1);
    // unsupported roles still list the member
    assert_eq!(stats["C"], MemberCounters::default());
    assert_eq!(stats.len(), 3);
}

#[tokio::test]
async fn aggregated_stats_abort_on_any_failure() {
    let mut server = mockito::Server::new_async().await;
    let _listing = json_mock(
        &mut server,
        "GET",
        "/crf/rest/seance",
        json!({ "content": [{ "id": "occ-1" }], "last": true }),
    )
    .match_query(Matcher::Any)
    .create_async()
    .await;
    let _registrations = server
        .mock("GET", "/crf/rest/seance/occ-1/inscription")
        .with_status(503)
        .create_async()
        .await;
    let client = client_for(&server);
    let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    assert!(client.fetch_aggregated_stats(DateRange::day(day)).await.is_err());
}

#[tokio::test]
async fn dispatcher_shifts_read_member_statistics() {
    let mut server = mockito::Server::new_async().await;
    let _search = json_mock(
        &mut server,
        "GET",
        "/crf/rest/utilisateur",
        json!({ "content": members(&["D1"]), "last": true }),
    )
    .match_query(Matcher::Any)
    .create_async()
    .await;
    let _stats = json_mock(
        &mut server,
        "GET",
        "/crf/rest/statistiques/benevole/D1/2023-01-01/2023-12-31/quantite",
        json!({
            "statistiques": [{
                "statistiquesGroupeAction": { "label": "Urgence et Secourisme", "nombre": 30 },
                "statistiquesActivites": [
                    { "label": "Régulation", "nombre": 12 },
                    { "label": "Poste de secours", "nombre": 18 }
                ]
            }]
        }),
    )
    .create_async()
    .await;
    let client = client_for(&server);
    let range = pegass_core::roster::year_range(2023).unwrap();

    let counts = client.dispatcher_shift_counts(range).await.unwrap();

    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].0.id, "D1");
    assert_eq!(counts[0].1, 12);
}
