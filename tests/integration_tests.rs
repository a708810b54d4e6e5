use activity_map::app::surface::{PAGE_FILE, SNAPSHOT_FILE};
use activity_map::core::{ClusterPolicy, Pipeline, TimeFilter};
use activity_map::{
    GeoJsonSurface, HttpFetcher, IngestEngine, LocalStorage, MapError, MapRenderer, MapView,
    SheetPipeline,
};
use chrono::{Duration, SecondsFormat, Utc};
use httpmock::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

const HEADER: &str = "Timestamp,Latitude,Longitude,Date of ICE activity,Time of ICE activity,Approximate number of ICE agents,Location of ICE activity,Borough of ICE activity,Description of ICE activity";

fn hours_ago(hours: i64) -> String {
    (Utc::now() - Duration::hours(hours)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn sheet_body() -> String {
    format!(
        "{header}\n\
         x,40.7001,-73.9001,{recent},9am,between 3 and 5,Jamaica Ave,Queens,<script>alert(1)</script>\n\
         x,abc,-73.9,{recent},9am,1 or 2,Nowhere,Queens,bad latitude\n\
         x,40.7003,-73.9004,{old},noon,More than 10,Archer Ave,Queens,Checkpoint\n\
         \n\
         x,40.8500,-73.8500,not a date,,,Fordham Rd,Bronx,\n",
        header = HEADER,
        recent = hours_ago(2),
        old = hours_ago(72),
    )
}

fn read_snapshot(dir: &TempDir) -> Value {
    let bytes = std::fs::read(dir.path().join(SNAPSHOT_FILE)).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn features_of_kind<'a>(snapshot: &'a Value, kind: &str) -> Vec<&'a Value> {
    snapshot["features"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["properties"]["kind"] == kind)
        .collect()
}

#[tokio::test]
async fn test_end_to_end_sheet_to_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let sheet_mock = server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(200)
            .header("Content-Type", "text/csv")
            .body(sheet_body());
    });

    let surface = GeoJsonSurface::new(LocalStorage::new(temp_dir.path()));
    assert_ok!(surface.write_page().await);
    let mut view = MapView::new(
        surface,
        MapRenderer::for_policy(ClusterPolicy::Weight, 0.01),
        TimeFilter::All,
    );
    let engine = IngestEngine::new(SheetPipeline::new(HttpFetcher::new(server.url("/pub"))));

    let records = engine.run().await.unwrap();
    sheet_mock.assert();
    assert_eq!(records.len(), 3);

    let visible = view.load(records).await.unwrap();
    assert_eq!(visible, 3);

    let snapshot = read_snapshot(&temp_dir);
    let markers = features_of_kind(&snapshot, "marker");
    let clusters = features_of_kind(&snapshot, "cluster");

    assert_eq!(markers.len(), 3);
    assert_eq!(markers[0]["properties"]["radius"], 12.0);
    assert_eq!(markers[0]["properties"]["weight"], 4);
    assert_eq!(markers[2]["properties"]["radius"], 10.0);

    let popup = markers[0]["properties"]["popup_html"].as_str().unwrap();
    assert!(popup.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!popup.contains("<script>"));

    // 兩筆 Queens 報告落在同一格
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0]["properties"]["count"], 2);
    assert_eq!(clusters[0]["properties"]["total_weight"], 19);
    assert_eq!(clusters[0]["properties"]["radius"], 10.0 + 19f64.sqrt() * 3.0);

    // 被聚合的標記指向所屬群集，單獨的 Bronx 標記沒有
    let cluster_id = &clusters[0]["properties"]["id"];
    assert_eq!(&markers[0]["properties"]["cluster"], cluster_id);
    assert_eq!(&markers[1]["properties"]["cluster"], cluster_id);
    assert!(markers[2]["properties"]["cluster"].is_null());

    assert!(temp_dir.path().join(PAGE_FILE).exists());
}

#[tokio::test]
async fn test_recent_filter_hides_old_and_undated_reports() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(200).body(sheet_body());
    });

    let mut view = MapView::new(
        GeoJsonSurface::new(LocalStorage::new(temp_dir.path())),
        MapRenderer::default(),
        TimeFilter::All,
    );
    let engine = IngestEngine::new(SheetPipeline::new(HttpFetcher::new(server.url("/pub"))));
    view.load(engine.run().await.unwrap()).await.unwrap();

    assert_eq!(view.set_filter(TimeFilter::Recent24h).await.unwrap(), 1);

    let snapshot = read_snapshot(&temp_dir);
    assert_eq!(features_of_kind(&snapshot, "marker").len(), 1);
    assert!(features_of_kind(&snapshot, "cluster").is_empty());
    assert_eq!(snapshot["metadata"]["filter"], "24h");
    assert_eq!(snapshot["metadata"]["total_records"], 3);
}

#[tokio::test]
async fn test_failed_fetch_leaves_previous_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let mut ok_mock = server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(200).body(sheet_body());
    });

    let mut view = MapView::new(
        GeoJsonSurface::new(LocalStorage::new(temp_dir.path())),
        MapRenderer::default(),
        TimeFilter::All,
    );
    let engine = IngestEngine::new(SheetPipeline::new(HttpFetcher::new(server.url("/pub"))));
    view.load(engine.run().await.unwrap()).await.unwrap();
    let before = std::fs::read(temp_dir.path().join(SNAPSHOT_FILE)).unwrap();

    ok_mock.delete();
    server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(503);
    });

    let result = engine.run().await;
    let err = assert_err!(result);
    assert!(matches!(err, MapError::ContentError { .. }));

    let after = std::fs::read(temp_dir.path().join(SNAPSHOT_FILE)).unwrap();
    assert_eq!(before, after);
    assert_eq!(view.store().len(), 3);
}

#[tokio::test]
async fn test_pipeline_is_idempotent_for_identical_text() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/pub");
        then.status(200).body(sheet_body());
    });

    let pipeline = SheetPipeline::new(HttpFetcher::new(server.url("/pub")));
    let rows = pipeline.extract().await.unwrap();
    let first = pipeline.transform(rows.clone()).await.unwrap();
    let second = pipeline.transform(rows).await.unwrap();

    assert_eq!(first, second);
}
