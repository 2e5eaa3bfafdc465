mod common;

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::{response_json, response_text, TestApp};

const IMPORT_URI: &str = "/api/v1/products/import";
const EXPORT_URI: &str = "/api/v1/products/export";

#[tokio::test]
async fn import_classifies_new_identical_and_changed_rows() {
    let app = TestApp::new().await;
    app.create_product("Hammer", 5).await;
    let saw = app.create_product("Saw", 2).await;
    let saw_id = saw["id"].as_i64().unwrap();

    let csv = "name,unit,category,brand,stock,status,image\n\
               SAW,pcs,Tools,Acme,9,In Stock,\n\
               Drill,pcs,Power,Bosch,3,In Stock,\n\
               hammer,pcs,Tools,Acme,5,In Stock,\n";
    let response = app.upload_csv(IMPORT_URI, "file", csv).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!({ "added": 1, "updated": 1, "skipped": 1 })
    );

    let saw_after = response_json(
        app.request(Method::GET, &format!("/api/v1/products/{saw_id}"), None)
            .await,
    )
    .await;
    assert_eq!(saw_after["stock"], 9);
    assert_eq!(saw_after["name"], "Saw");

    // bulk updates do not write history
    let history = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/products/{saw_id}/history"),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blank_name_rows_are_skipped_without_failing() {
    let app = TestApp::new().await;
    let csv = "name,stock\n,3\n   ,4\nLadder,1\n";

    let response = app.upload_csv(IMPORT_URI, "file", csv).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!({ "added": 1, "updated": 0, "skipped": 2 })
    );
}

#[tokio::test]
async fn missing_file_part_is_rejected() {
    let app = TestApp::new().await;
    let response = app.upload_csv(IMPORT_URI, "attachment", "name\nX\n").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["message"], "No file uploaded");
}

#[tokio::test]
async fn malformed_csv_rejects_the_whole_batch() {
    let app = TestApp::new().await;
    let csv = "name,stock\nGood Row,1\nBad Row,2,surplus\n";

    let response = app.upload_csv(IMPORT_URI, "file", csv).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Failed to parse CSV");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));

    let list = response_json(app.request(Method::GET, "/api/v1/products", None).await).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn export_is_a_quoted_csv_attachment() {
    let app = TestApp::new().await;
    app.create_product("Stud \"Finder\"", 3).await;

    let response = app.request(Method::GET, EXPORT_URI, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"products_export.csv\""
    );
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let csv = response_text(response).await;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("id,name,unit,category,brand,stock,status,image,createdAt,updatedAt")
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("1,\"Stud \"\"Finder\"\"\",\"pcs\",\"Tools\",\"Acme\",3,\"In Stock\",\"\","));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn export_then_reimport_changes_nothing() {
    let app = TestApp::new().await;
    app.create_product("Crowbar", 2).await;
    app.create_product("Nail Set, small", 0).await;
    app.create_product("Mitre Box", 14).await;

    let exported = response_text(app.request(Method::GET, EXPORT_URI, None).await).await;

    let response = app.upload_csv(IMPORT_URI, "file", &exported).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!({ "added": 0, "updated": 0, "skipped": 3 })
    );
}
