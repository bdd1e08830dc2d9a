//! Integration tests for the campus directory backend.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, ChangeFeed, Repository};
use crate::directory::LocationStore;
use crate::notifications::{LocalStore, NotificationCenter};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    local_state_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let local_state_path = temp_dir.path().join("local-state.json");

        // Initialize database and in-memory state
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool, ChangeFeed::default()));
        let locations = Arc::new(LocationStore::new());
        locations.init(&repo).await.expect("Failed to init store");
        let notifications = Arc::new(NotificationCenter::new(
            repo.clone(),
            LocalStore::new(&local_state_path),
        ));

        let config = Config {
            api_psk: psk.clone(),
            db_path,
            local_state_path: local_state_path.clone(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            poll_interval: Duration::from_secs(3_600),
        };

        let state = AppState {
            repo,
            locations,
            notifications,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            local_state_path,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn delete(&self, path: &str) -> (u16, Value) {
        let resp = self.client.delete(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn create_location(&self, bucket: &str, name: &str, tags: &[&str]) -> String {
        let (status, body) = self
            .post(
                "/api/locations",
                json!({
                    "bucket": bucket,
                    "name": name,
                    "description": format!("{} on campus", name),
                    "building": "Main Quad",
                    "openingHours": "8:00 - 18:00",
                    "image": "https://example.org/img.png",
                    "tags": tags,
                }),
            )
            .await;
        assert_eq!(status, 200, "create location failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn notification_titles(&self) -> Vec<String> {
        let (_, body) = self.get("/api/notifications").await;
        body["data"]["notifications"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["title"].as_str().unwrap().to_string())
            .collect()
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_admin_routes_require_psk() {
    let fixture = TestFixture::new().await;
    let anonymous = Client::new();

    let resp = anonymous
        .get(fixture.url("/api/locations"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = anonymous
        .get(fixture.url("/api/notifications"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = anonymous
        .get(fixture.url("/api/locations"))
        .header("Authorization", "Bearer test-api-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Public directory reads need no key
    for path in [
        "/api/directory",
        "/api/search?q=hall",
        "/api/categories/dining",
    ] {
        let resp = anonymous.get(fixture.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 200, "{} should be public", path);
    }
}

#[tokio::test]
async fn test_auth_disabled_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let (status, body) = fixture.get("/api/medicines").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_location_crud_updates_directory() {
    let fixture = TestFixture::new().await;

    let cafe = fixture
        .create_location("dining", "Commons Cafe", &["Dining", "Coffee"])
        .await;
    fixture
        .create_location("library", "Main Library", &["Quiet"])
        .await;
    fixture
        .create_location("academic", "Bio Lab", &["Science"])
        .await;

    // Directory reflects the writes without a restart
    let (status, body) = fixture.get("/api/directory").await;
    assert_eq!(status, 200);
    let buckets = body["data"]["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 6);
    assert_eq!(buckets[0]["bucket"], "academic");
    assert_eq!(buckets[0]["locations"][0]["name"], "Bio Lab");
    assert_eq!(buckets[2]["label"], "Dining Halls");
    assert_eq!(buckets[2]["locations"][0]["id"], cafe.as_str());

    // Name search, case-insensitive
    let (_, body) = fixture.get("/api/search?q=LIB").await;
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Main Library");
    assert_eq!(results[0]["category"], "Libraries");

    let (_, body) = fixture.get("/api/search?q=").await;
    assert_eq!(body["data"]["total"], 0);

    // Move the cafe to the student center bucket
    let (status, body) = fixture
        .put(
            &format!("/api/locations/{}", cafe),
            json!({
                "bucket": "student_center",
                "name": "Commons Cafe",
                "building": "Student Union",
                "tags": ["Dining"],
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["bucket"], "student_center");

    let (_, body) = fixture.get("/api/categories/dining").await;
    assert!(body["data"]["locations"].as_array().unwrap().is_empty());
    let (_, body) = fixture.get("/api/categories/student_center").await;
    assert_eq!(body["data"]["locations"][0]["building"], "Student Union");

    // Delete
    let (status, _) = fixture.delete(&format!("/api/locations/{}", cafe)).await;
    assert_eq!(status, 200);
    let (status, body) = fixture.get(&format!("/api/locations/{}", cafe)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    let (_, body) = fixture.get("/api/categories/student_center").await;
    assert!(body["data"]["locations"].as_array().unwrap().is_empty());

    // Every write was audited
    let (_, body) = fixture.get("/api/activity?limit=10").await;
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["actionType"].as_str().unwrap())
        .collect();
    assert_eq!(actions[0], "delete_student_center");
    assert!(actions.contains(&"update_student_center"));
    assert!(actions.contains(&"create_dining"));
}

#[tokio::test]
async fn test_category_filter_and_tag_toggle() {
    let fixture = TestFixture::new().await;

    fixture
        .create_location("dining", "Commons Cafe", &["Dining", "Coffee"])
        .await;
    fixture
        .create_location("dining", "Green Plate", &["Dining", "Vegan"])
        .await;
    fixture
        .create_location("dining", "Night Owl", &["Late Night"])
        .await;

    let (_, body) = fixture.get("/api/categories/dining?tags=Dining").await;
    let names: Vec<&str> = body["data"]["locations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Commons Cafe", "Green Plate"]);
    assert_eq!(
        body["data"]["allTags"],
        json!(["Dining", "Coffee", "Vegan", "Late Night"])
    );

    let (_, body) = fixture
        .get("/api/categories/dining?tags=Dining&toggle=Vegan")
        .await;
    assert_eq!(body["data"]["selectedTags"], json!(["Dining", "Vegan"]));
    assert_eq!(body["data"]["locations"][0]["name"], "Green Plate");
    assert_eq!(body["data"]["locations"].as_array().unwrap().len(), 1);

    let (_, body) = fixture
        .get("/api/categories/dining?tags=Dining&toggle=Dining&q=owl")
        .await;
    assert_eq!(body["data"]["selectedTags"], json!([]));
    assert_eq!(body["data"]["locations"][0]["name"], "Night Owl");

    // Repeated parameters select several tags, commas included
    fixture
        .create_location("dining", "Tea Room", &["Coffee, Tea", "Dining"])
        .await;
    let (_, body) = fixture
        .get("/api/categories/dining?tags=Coffee%2C%20Tea&tags=Dining")
        .await;
    assert_eq!(body["data"]["selectedTags"], json!(["Coffee, Tea", "Dining"]));
    assert_eq!(body["data"]["locations"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["locations"][0]["name"], "Tea Room");

    let (status, _) = fixture.get("/api/categories/parking").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_location_validation() {
    let fixture = TestFixture::new().await;
    let revision_before = fixture.get("/api/directory").await.1["revisionId"].clone();

    let (status, body) = fixture
        .post(
            "/api/locations",
            json!({ "bucket": "sports", "name": "  ", "building": "Arena" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture
        .post(
            "/api/locations",
            json!({ "bucket": "sports", "name": "Arena", "building": "" }),
        )
        .await;
    assert_eq!(status, 400);

    // Unknown or missing categories are validation failures, not extractor errors
    let (status, body) = fixture
        .post(
            "/api/locations",
            json!({ "bucket": "parking", "name": "Lot B", "building": "East" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .post("/api/locations", json!({ "bucket": "library" }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture.get("/api/locations?category=parking").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Nothing was written
    let (_, body) = fixture.get("/api/directory").await;
    assert_eq!(body["revisionId"], revision_before);
}

#[tokio::test]
async fn test_notification_read_and_delete_flow() {
    let fixture = TestFixture::new().await;

    let mut ids = Vec::new();
    for title in ["First", "Second", "Third"] {
        let (status, body) = fixture
            .post(
                "/api/notifications",
                json!({ "title": title, "message": "Hello", "type": "info" }),
            )
            .await;
        assert_eq!(status, 200);
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let (_, body) = fixture.get("/api/notifications").await;
    assert_eq!(body["data"]["unreadCount"], 3);
    assert_eq!(body["data"]["notifications"][0]["title"], "Third");
    assert_eq!(body["data"]["notifications"][0]["time"], "just now");

    // Marking twice is the same as once, on disk too
    let local = LocalStore::new(&fixture.local_state_path);
    let mut persisted = Vec::new();
    for attempt in 0..2 {
        let (status, body) = fixture
            .post(&format!("/api/notifications/{}/read", ids[0]), json!({}))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["unreadCount"], 2);

        let read_ids = local.read_ids().await.unwrap();
        if attempt == 0 {
            assert_eq!(read_ids, vec![ids[0].clone()]);
            persisted = read_ids;
        } else {
            assert_eq!(read_ids, persisted);
        }
    }

    // Unknown ids are ignored
    let (status, body) = fixture
        .post("/api/notifications/not-a-real-id/read", json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["unreadCount"], 2);

    let (_, body) = fixture.post("/api/notifications/read-all", json!({})).await;
    assert_eq!(body["data"]["unreadCount"], 0);

    // Read state survives a re-fetch
    let (_, body) = fixture.get("/api/notifications").await;
    assert_eq!(body["data"]["unreadCount"], 0);

    // Deletes need confirmation
    let (status, body) = fixture
        .post(
            "/api/notifications/delete",
            json!({ "ids": [ids[1].clone()] }),
        )
        .await;
    assert_eq!(status, 428);
    assert_eq!(body["error"]["code"], "CONFIRMATION_REQUIRED");

    let (status, body) = fixture
        .post(
            "/api/notifications/delete",
            json!({ "ids": [ids[1].clone()], "confirm": true }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["notifications"].as_array().unwrap().len(), 2);

    // Empty selection is a no-op without confirmation
    let (status, body) = fixture
        .post("/api/notifications/delete", json!({ "ids": [] }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["notifications"].as_array().unwrap().len(), 2);

    let (status, _) = fixture.delete("/api/notifications").await;
    assert_eq!(status, 428);

    let (status, body) = fixture.delete("/api/notifications?confirm=true").await;
    assert_eq!(status, 200);
    assert!(body["data"]["notifications"].as_array().unwrap().is_empty());

    // A new notification after clearing starts unread
    fixture
        .post(
            "/api/notifications",
            json!({ "title": "Fresh", "message": "Hi", "type": "success" }),
        )
        .await;
    let (_, body) = fixture.get("/api/notifications").await;
    assert_eq!(body["data"]["unreadCount"], 1);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let fixture = TestFixture::new().await;

    for name in ["Hall A", "Hall B", "Hall C"] {
        fixture.create_location("academic", name, &[]).await;
    }
    fixture.create_location("sports", "Arena", &[]).await;

    let (status, body) = fixture.get("/api/stats/dashboard").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalLocations"], 4);

    let cards = body["data"]["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 6);
    assert_eq!(cards[0]["title"], "Academic Buildings");
    assert_eq!(cards[0]["value"], 3);
    assert_eq!(cards[0]["previousValue"], 2);
    assert_eq!(cards[0]["delta"]["percentage"], "50.0");
    assert_eq!(cards[0]["delta"]["isIncrease"], true);

    // Zero baseline
    assert_eq!(cards[1]["value"], 0);
    assert_eq!(cards[1]["delta"]["percentage"], "0");
    assert_eq!(cards[1]["delta"]["isIncrease"], false);
}

#[tokio::test]
async fn test_medicine_writes_raise_notifications() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/medicines",
            json!({ "name": "Ibuprofen", "category": "Pain Relief", "price": 4.5, "stock": 50 }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "In Stock");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    assert_eq!(fixture.notification_titles().await, vec!["New Medicine Added"]);

    let (status, body) = fixture
        .put(
            &format!("/api/medicines/{}", id),
            json!({ "name": "Ibuprofen", "category": "Pain Relief", "price": 4.5, "stock": 0 }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "Out of Stock");

    let titles = fixture.notification_titles().await;
    assert_eq!(titles.len(), 3);
    assert!(titles.contains(&"Medicine Updated".to_string()));
    assert!(titles.contains(&"Out of Stock Alert".to_string()));

    // Low stock on creation adds a warning
    fixture
        .post(
            "/api/medicines",
            json!({ "name": "Insulin", "category": "Diabetes", "price": 30.0, "stock": 5 }),
        )
        .await;
    let titles = fixture.notification_titles().await;
    assert!(titles.contains(&"Low Stock Warning".to_string()));

    let (status, _) = fixture.delete(&format!("/api/medicines/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(fixture.notification_titles().await[0], "Medicine Deleted");

    // Validation happens before any write
    let (status, body) = fixture
        .post(
            "/api/medicines",
            json!({ "name": "Bad", "category": "Misc", "price": -1.0, "stock": 1 }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_pharmacy_stock_and_stats() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/pharmacies",
            json!({
                "name": "Campus Pharmacy",
                "location": "Health Center",
                "phone": "555-0100",
                "openHours": "9-17",
                "latitude": 6.67,
                "longitude": -1.57,
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["available"], true);
    let pharmacy_id = body["data"]["id"].as_str().unwrap().to_string();

    let mut medicine_ids = Vec::new();
    for (name, category) in [
        ("Aspirin", "Pain Relief"),
        ("Amoxicillin", "Antibiotics"),
        ("Paracetamol", "Pain Relief"),
    ] {
        let (_, body) = fixture
            .post(
                "/api/medicines",
                json!({ "name": name, "category": category, "price": 2.0, "stock": 100 }),
            )
            .await;
        medicine_ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    for (medicine_id, quantity) in medicine_ids.iter().zip([40, 0, 5]) {
        let (status, _) = fixture
            .put(
                &format!("/api/pharmacies/{}/stock/{}", pharmacy_id, medicine_id),
                json!({ "quantity": quantity }),
            )
            .await;
        assert_eq!(status, 200);
    }

    let (status, body) = fixture
        .get(&format!("/api/pharmacies/{}/stats", pharmacy_id))
        .await;
    assert_eq!(status, 200);
    let stats = &body["data"];
    assert_eq!(stats["totalMedicines"]["value"], 3);
    assert_eq!(stats["inStock"]["value"], 2);
    assert_eq!(stats["outOfStock"]["value"], 1);
    assert_eq!(stats["lowStock"]["value"], 1);
    assert_eq!(stats["popularMedicines"][0]["name"], "Aspirin");
    assert_eq!(stats["categoryDistribution"][0]["category"], "Antibiotics");
    assert_eq!(stats["categoryDistribution"][1]["count"], 2);

    let (status, body) = fixture
        .delete(&format!(
            "/api/pharmacies/{}/stock/{}",
            pharmacy_id, medicine_ids[1]
        ))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = fixture
        .put(
            &format!("/api/pharmacies/{}/stock/{}", "missing", medicine_ids[0]),
            json!({ "quantity": 1 }),
        )
        .await;
    assert_eq!(status, 404);

    let (status, _) = fixture.get("/api/pharmacies/missing/stats").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_user_validation_and_notifications() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/users",
            json!({ "email": "pharm@example.org", "fullName": "Pat", "role": "Pharmacy" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .post(
            "/api/users",
            json!({ "email": "admin@example.org", "fullName": "Alex Admin", "role": "Admin" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "Inactive");
    let user_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = fixture
        .post(
            "/api/users",
            json!({ "email": "admin@example.org", "fullName": "Duplicate", "role": "Staff" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture.delete(&format!("/api/users/{}", user_id)).await;
    assert_eq!(status, 200);
    let (status, _) = fixture.get(&format!("/api/users/{}", user_id)).await;
    assert_eq!(status, 404);

    let (status, body) = fixture
        .post(
            "/api/users",
            json!({ "email": "root@example.org", "fullName": "Root", "role": "Superuser" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = fixture
        .post("/api/users", json!({ "email": "nobody@example.org" }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let titles = fixture.notification_titles().await;
    assert_eq!(titles[0], "Admin user deleted");
    assert!(titles.contains(&"New admin user created".to_string()));
}

#[tokio::test]
async fn test_pharmacy_login_and_password_change() {
    let fixture = TestFixture::new().await;
    let anonymous = Client::new();

    let (_, body) = fixture
        .post(
            "/api/pharmacies",
            json!({ "name": "Campus Pharmacy", "location": "Health Center", "phone": "555-0100" }),
        )
        .await;
    let pharmacy_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = fixture
        .post(
            "/api/users",
            json!({
                "email": "counter@example.org",
                "fullName": "Counter Desk",
                "role": "Pharmacy",
                "pharmacyId": pharmacy_id,
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["temporaryPassword"], "PharmCampusPharmacy123");
    assert_eq!(body["data"]["mustChangePassword"], true);
    assert!(body["data"].get("passwordHash").is_none());
    let user_id = body["data"]["id"].as_str().unwrap().to_string();

    let login = |password: &str| {
        json!({ "username": "Counter@Example.org", "password": password })
    };

    // Portal routes need no API key
    let resp = anonymous
        .post(fixture.url("/api/pharmacy/login"))
        .json(&login("wrong-password"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = anonymous
        .post(fixture.url("/api/pharmacy/login"))
        .json(&login("PharmCampusPharmacy123"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["pharmacyName"], "Campus Pharmacy");
    assert_eq!(body["data"]["mustChangePassword"], true);

    let (_, body) = fixture.get(&format!("/api/users/{}", user_id)).await;
    assert_eq!(body["data"]["status"], "Active");

    // Self-service change clears the first-login flag
    let resp = anonymous
        .post(fixture.url("/api/pharmacy/change-password"))
        .json(&json!({
            "username": "counter@example.org",
            "currentPassword": "PharmCampusPharmacy123",
            "newPassword": "short",
            "confirmPassword": "short",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = anonymous
        .post(fixture.url("/api/pharmacy/change-password"))
        .json(&json!({
            "username": "counter@example.org",
            "currentPassword": "PharmCampusPharmacy123",
            "newPassword": "a-much-better-secret",
            "confirmPassword": "a-much-better-secret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["mustChangePassword"], false);

    let resp = anonymous
        .post(fixture.url("/api/pharmacy/login"))
        .json(&login("PharmCampusPharmacy123"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let resp = anonymous
        .post(fixture.url("/api/pharmacy/login"))
        .json(&login("a-much-better-secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Admin reset requires the API key and matching confirmation
    let resp = anonymous
        .put(fixture.url(&format!("/api/users/{}/password", user_id)))
        .json(&json!({ "newPassword": "reset-secret", "confirmPassword": "reset-secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let (status, _) = fixture
        .put(
            &format!("/api/users/{}/password", user_id),
            json!({ "newPassword": "reset-secret", "confirmPassword": "other-secret" }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, body) = fixture
        .put(
            &format!("/api/users/{}/password", user_id),
            json!({ "newPassword": "PharmReset123", "confirmPassword": "PharmReset123" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["mustChangePassword"], true);

    let resp = anonymous
        .post(fixture.url("/api/pharmacy/login"))
        .json(&login("PharmReset123"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["mustChangePassword"], true);

    let titles = fixture.notification_titles().await;
    assert_eq!(titles[0], "Pharmacy password updated");
}
