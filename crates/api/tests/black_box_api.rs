use reqwest::StatusCode;
use serde_json::{json, Value};

use schoolhub_api::app::{build_app, services::AppServices};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over a fresh in-memory store, on an ephemeral port.
        let app = build_app(AppServices::in_memory());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.patch(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        read(res).await
    }

    async fn delete(&self, path: &str) -> StatusCode {
        self.client.delete(self.url(path)).send().await.unwrap().status()
    }

    async fn create_item(&self, name: &str, total: i64) -> i64 {
        let (status, body) = self
            .post("/inventory_item", json!({ "name": name, "total_quantity": total }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create item: {body}");
        body["id"].as_i64().unwrap()
    }

    async fn register_staff(&self, name: &str) -> i64 {
        let (status, body) = self.post("/staff", json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "register staff: {body}");
        body["id"].as_i64().unwrap()
    }

    async fn issue(&self, item_id: i64, faculty_id: i64, quantity: i64) -> (StatusCode, Value) {
        self.post(
            "/assign_item/issue",
            json!({ "item_id": item_id, "faculty_id": faculty_id, "quantity_issued": quantity }),
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "in_memory");
}

#[tokio::test]
async fn issue_and_return_round_trip() {
    let srv = TestServer::spawn().await;
    let item = srv.create_item("Projector", 10).await;
    let faculty = srv.register_staff("Ms. Wanjiru").await;

    let (status, record) = srv.issue(item, faculty, 4).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["quantity_issued"], 4);
    assert_eq!(record["status"], "issued");
    let record_id = record["id"].as_i64().unwrap();

    let (_, item_body) = srv.get(&format!("/inventory_item/{item}")).await;
    assert_eq!(item_body["available_quantity"], 6);

    let (status, issued) = srv.get("/assign_item/issued").await;
    assert_eq!(status, StatusCode::OK);
    let issued = issued.as_array().unwrap();
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0]["item_name"], "Projector");
    assert_eq!(issued[0]["faculty_name"], "Ms. Wanjiru");

    let (status, record) = srv
        .patch(&format!("/assign_item/return/{record_id}"), json!({ "return_quantity": 4 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["quantity_issued"], 0);
    assert_eq!(record["status"], "closed");

    let (_, item_body) = srv.get(&format!("/inventory_item/{item}")).await;
    assert_eq!(item_body["available_quantity"], 10);

    let (_, issued) = srv.get("/assign_item/issued").await;
    assert!(issued.as_array().unwrap().is_empty());
    let (_, history) = srv.get("/assign_item/history").await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], record_id);
}

#[tokio::test]
async fn repeated_issue_accumulates_on_one_row() {
    let srv = TestServer::spawn().await;
    let item = srv.create_item("Microscope", 10).await;
    let faculty = srv.register_staff("Mr. Chen").await;

    let (_, first) = srv.issue(item, faculty, 2).await;
    let (status, second) = srv.issue(item, faculty, 3).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["quantity_issued"], 5);

    let (_, issued) = srv.get("/assign_item/issued").await;
    assert_eq!(issued.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn over_issue_and_over_return_are_rejected() {
    let srv = TestServer::spawn().await;
    let item = srv.create_item("Tablet", 3).await;
    let faculty = srv.register_staff("Mrs. Okafor").await;

    let (status, body) = srv.issue(item, faculty, 5).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["available"], 3);

    let (_, record) = srv.issue(item, faculty, 2).await;
    let record_id = record["id"].as_i64().unwrap();
    let (status, body) = srv
        .patch(&format!("/assign_item/return/{record_id}"), json!({ "return_quantity": 3 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "over_return");
    assert_eq!(body["issued"], 2);
}

#[tokio::test]
async fn invalid_requests_are_400() {
    let srv = TestServer::spawn().await;
    let item = srv.create_item("Chair", 5).await;
    let faculty = srv.register_staff("Mr. Diallo").await;

    let (status, body) = srv.issue(item, faculty, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (status, body) = srv
        .post("/assign_item/issue", json!({ "item_id": item, "quantity_issued": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("faculty_id"));

    let (status, body) = srv.post("/inventory_item", json!({ "name": "  ", "total_quantity": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (status, body) = srv.get("/inventory_item/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let res = srv
        .client
        .post(srv.url("/staff"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_rows_are_404() {
    let srv = TestServer::spawn().await;
    let item = srv.create_item("Whiteboard", 2).await;

    let (status, body) = srv.issue(item, 999, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = srv.patch("/assign_item/return/999", json!({ "return_quantity": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.get("/inventory_item/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.get("/staff/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn total_cannot_drop_below_issued() {
    let srv = TestServer::spawn().await;
    let item = srv.create_item("Laptop", 10).await;
    let faculty = srv.register_staff("Ms. Rossi").await;
    srv.issue(item, faculty, 7).await;

    let (status, body) = srv
        .patch(&format!("/inventory_item/{item}"), json!({ "total_quantity": 5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "below_issued");
    assert_eq!(body["issued"], 7);

    let (status, body) = srv
        .patch(&format!("/inventory_item/{item}"), json!({ "total_quantity": 12, "name": "Laptop (15in)" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Laptop (15in)");
    assert_eq!(body["total_quantity"], 12);
    assert_eq!(body["available_quantity"], 5);

    let (_, movements) = srv.get(&format!("/inventory_item/{item}/movements")).await;
    let kinds: Vec<_> = movements
        .as_array()
        .unwrap()
        .iter()
        .map(|m| (m["kind"].as_str().unwrap().to_string(), m["quantity"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![("issued".to_string(), 7), ("total_adjusted".to_string(), 2)]
    );
}

#[tokio::test]
async fn delete_is_blocked_while_units_are_out() {
    let srv = TestServer::spawn().await;
    let item = srv.create_item("Drum kit", 1).await;
    let faculty = srv.register_staff("Mr. Haddad").await;
    let (_, record) = srv.issue(item, faculty, 1).await;
    let record_id = record["id"].as_i64().unwrap();

    let res = srv.client.delete(srv.url(&format!("/inventory_item/{item}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "item_in_use");

    srv.patch(&format!("/assign_item/return/{record_id}"), json!({ "return_quantity": 1 }))
        .await;
    assert_eq!(srv.delete(&format!("/inventory_item/{item}")).await, StatusCode::NO_CONTENT);

    let (status, _) = srv.get(&format!("/inventory_item/{item}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, history) = srv.get("/assign_item/history").await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn staff_directory_lists_by_name() {
    let srv = TestServer::spawn().await;
    srv.register_staff("Zainab").await;
    let adam = srv.register_staff("Adam").await;

    let (status, staff) = srv.get("/staff").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = staff
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Adam", "Zainab"]);

    let (status, member) = srv.get(&format!("/staff/{adam}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member["name"], "Adam");
}
