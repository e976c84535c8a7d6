//! End-to-end tests for dataset functions against a mock OpenData server

#[path = "common/mod.rs"]
mod common;

use aemet_opendata::datasets;
use aemet_opendata::errors::AppError;
use aemet_opendata::models::ExtremeParameter;
use common::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn stations(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Mounts the metadata endpoint `endpoint` and the data URL it points at.
async fn mount_dataset(server: &MockServer, endpoint: &str, data_path: &str, body: ResponseTemplate) {
    let data_url = format!("{}{data_path}", server.uri());
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&data_url)))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(data_path))
        .respond_with(body)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_normal_values_concatenates_stations() {
    let server = MockServer::start().await;
    mount_dataset(
        &server,
        "/valores/climatologicos/normales/estacion/3195",
        "/sh/normales-3195",
        ResponseTemplate::new(200).set_body_json(json!([{"indicativo": "3195", "mes": "1"}])),
    )
    .await;
    mount_dataset(
        &server,
        "/valores/climatologicos/normales/estacion/0076",
        "/sh/normales-0076",
        ResponseTemplate::new(200).set_body_json(json!({"indicativo": "0076", "mes": "1"})),
    )
    .await;

    let config = test_config(&server.uri(), &["k1"]);
    let client = reqwest::Client::new();
    let records = datasets::normal_values(&client, &config, &stations(&["3195", "0076"]))
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![
            json!({"indicativo": "3195", "mes": "1"}),
            json!({"indicativo": "0076", "mes": "1"}),
        ]
    );
}

#[tokio::test]
async fn test_monthly_climatology_requests_three_year_chunks() {
    let server = MockServer::start().await;
    mount_dataset(
        &server,
        "/valores/climatologicos/mensualesanuales/datos/anioini/2015/aniofin/2017/estacion/3195",
        "/sh/m1",
        ResponseTemplate::new(200).set_body_json(json!([{"fecha": "2015-1"}])),
    )
    .await;
    mount_dataset(
        &server,
        "/valores/climatologicos/mensualesanuales/datos/anioini/2018/aniofin/2019/estacion/3195",
        "/sh/m2",
        ResponseTemplate::new(200).set_body_json(json!([{"fecha": "2018-1"}, {"fecha": "2019-1"}])),
    )
    .await;

    let config = test_config(&server.uri(), &["k1"]);
    let client = reqwest::Client::new();
    let records = datasets::monthly_climatology(&client, &config, &stations(&["3195"]), 2015, 2019)
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["fecha"], "2015-1");
    assert_eq!(records[2]["fecha"], "2019-1");
}

#[tokio::test]
async fn test_daily_climatology_sends_full_timestamps() {
    let server = MockServer::start().await;
    mount_dataset(
        &server,
        "/valores/climatologicos/diarios/datos/fechaini/2022-01-01T00:00:00UTC/fechafin/2022-01-02T23:59:59UTC/estacion/3195",
        "/sh/d1",
        ResponseTemplate::new(200).set_body_raw(SAMPLE_DAILY_RECORDS, "text/plain;charset=ISO-8859-15"),
    )
    .await;

    let config = test_config(&server.uri(), &["k1"]);
    let client = reqwest::Client::new();
    let records = datasets::daily_climatology(
        &client,
        &config,
        &stations(&["3195"]),
        "2022-01-01",
        "2022-01-02",
    )
    .await
    .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["tmed"], "8,1");
}

#[tokio::test]
async fn test_extreme_values_uses_requested_parameters() {
    let server = MockServer::start().await;
    mount_dataset(
        &server,
        "/valores/climatologicos/valoresextremos/parametro/T/estacion/3195",
        "/sh/t",
        ResponseTemplate::new(200).set_body_json(json!({"parametro": "T"})),
    )
    .await;

    let config = test_config(&server.uri(), &["k1"]);
    let client = reqwest::Client::new();
    let records = datasets::extreme_values(
        &client,
        &config,
        &stations(&["3195"]),
        &[ExtremeParameter::Temperature],
    )
    .await
    .unwrap();

    assert_eq!(records, vec![json!({"parametro": "T"})]);
}

#[tokio::test]
async fn test_rotates_to_second_key_on_quota_error() {
    let server = MockServer::start().await;
    let data_url = format!("{}/sh/normales", server.uri());

    Mock::given(method("GET"))
        .and(path("/valores/climatologicos/normales/estacion/3195"))
        .and(query_param("api_key", "exhausted"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/valores/climatologicos/normales/estacion/3195"))
        .and(query_param("api_key", "fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&data_url)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sh/normales"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"mes": "13"}])))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), &["exhausted", "fresh"]);
    let client = reqwest::Client::new();
    let records = datasets::normal_values(&client, &config, &stations(&["3195"]))
        .await
        .unwrap();

    assert_eq!(records, vec![json!({"mes": "13"})]);
}

#[tokio::test]
async fn test_latest_warnings_extracts_tar_gz() {
    let server = MockServer::start().await;
    let archive = create_test_tar_gz(&[("Z_CAP_C_LEMM_20260117.xml", SAMPLE_CAP_XML.as_bytes())]);
    mount_dataset(
        &server,
        "/avisos_cap/ultimoelaborado/area/72",
        "/sh/avisos",
        ResponseTemplate::new(200).set_body_raw(archive, "application/octet-stream"),
    )
    .await;

    let config = test_config(&server.uri(), &["k1"]);
    let client = reqwest::Client::new();
    let entries = datasets::latest_warnings(&client, &config, "72").await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries["Z_CAP_C_LEMM_20260117.xml"], SAMPLE_CAP_XML);
}

#[tokio::test]
async fn test_warnings_archive_returns_one_archive_per_window() {
    let server = MockServer::start().await;
    mount_dataset(
        &server,
        "/avisos_cap/archivo/fechaini/2026-01-01T00:00:00UTC/fechafin/2026-01-02T23:59:59UTC",
        "/sh/w1",
        ResponseTemplate::new(200).set_body_raw(
            create_test_tar_gz(&[("w1.xml", b"<alert>1</alert>")]),
            "application/octet-stream",
        ),
    )
    .await;
    mount_dataset(
        &server,
        "/avisos_cap/archivo/fechaini/2026-01-03T00:00:00UTC/fechafin/2026-01-03T23:59:59UTC",
        "/sh/w2",
        ResponseTemplate::new(200).set_body_raw(
            create_test_tar_bz2(&[("w2.xml", b"<alert>2</alert>")]),
            "application/octet-stream",
        ),
    )
    .await;

    let config = test_config(&server.uri(), &["k1"]);
    let client = reqwest::Client::new();
    let archives = datasets::warnings_archive(&client, &config, "2026-01-01", "2026-01-03")
        .await
        .unwrap();

    assert_eq!(archives.len(), 2);
    assert_eq!(archives[0].entries["w1.xml"], "<alert>1</alert>");
    assert_eq!(archives[1].entries["w2.xml"], "<alert>2</alert>");
    assert_eq!(archives[1].window.start, archives[1].window.end);
}

#[tokio::test]
async fn test_upstream_error_stops_dataset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/valores/climatologicos/normales/estacion/9999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "descripcion": "No hay datos que satisfagan esos criterios",
            "estado": 404
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), &["k1", "k2"]);
    let client = reqwest::Client::new();
    let result = datasets::normal_values(&client, &config, &stations(&["9999"])).await;

    assert!(matches!(result, Err(AppError::Upstream { status: 404, .. })));
}

#[tokio::test]
async fn test_validation_errors_send_no_requests() {
    let server = MockServer::start().await;
    let config = test_config(&server.uri(), &["k1"]);
    let client = reqwest::Client::new();

    let no_stations = datasets::normal_values(&client, &config, &[]).await;
    assert!(matches!(no_stations, Err(AppError::InvalidInput(_))));

    let bad_date =
        datasets::daily_climatology(&client, &config, &stations(&["3195"]), "01/01/2022", "2022-01-31")
            .await;
    assert!(matches!(bad_date, Err(AppError::InvalidInput(_))));

    let reversed =
        datasets::monthly_climatology(&client, &config, &stations(&["3195"]), 2020, 2010).await;
    assert!(matches!(reversed, Err(AppError::InvalidInput(_))));

    let bad_area = datasets::latest_warnings(&client, &config, "99").await;
    assert!(matches!(bad_area, Err(AppError::InvalidInput(_))));

    let no_keys = test_config(&server.uri(), &[]);
    let missing_keys = datasets::normal_values(&client, &no_keys, &stations(&["3195"])).await;
    assert!(matches!(missing_keys, Err(AppError::InvalidInput(_))));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_raw_endpoint_with_relative_path() {
    let server = MockServer::start().await;
    mount_dataset(
        &server,
        "/valores/climatologicos/inventarioestaciones/todasestaciones",
        "/sh/inventario",
        ResponseTemplate::new(200).set_body_json(json!([{"indicativo": "3195"}])),
    )
    .await;

    let config = test_config(&server.uri(), &["k1"]);
    let client = reqwest::Client::new();
    let records = datasets::raw_endpoint(
        &client,
        &config,
        "valores/climatologicos/inventarioestaciones/todasestaciones",
    )
    .await
    .unwrap();

    assert_eq!(records, vec![json!({"indicativo": "3195"})]);
}
