#[cfg(test)]
mod crm_api_integration_tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use leadserver::crm::MemoryCrmStore;
    use leadserver::{build_router, AppConfig, AppState};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(
            AppConfig::default(),
            Arc::new(MemoryCrmStore::new()),
        ));
        (build_router(state.clone()), state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_lead(app: &Router, body: Value) -> Value {
        let (status, lead) = send(app, "POST", "/api/leads", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{lead}");
        lead
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let (app, _) = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "memory");
    }

    #[tokio::test]
    async fn test_create_lead_applies_defaults() {
        let (app, _) = app();
        let lead = create_lead(&app, json!({ "website_url": "acme.com" })).await;
        assert_eq!(lead["website_url"], "https://acme.com");
        assert_eq!(lead["linkedin_url"], "https://linkedin.com/company/acme.com");
        assert_eq!(lead["status"], "Keep an Eye");
        assert_eq!(lead["team_size"], "1-3");
        assert_eq!(lead["funding_type"], "Bootstrapped");
        assert_eq!(lead["edition"], "Select Edition");

        let id = lead["id"].as_str().unwrap();
        let (status, fetched) = send(&app, "GET", &format!("/api/leads/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], lead["id"]);
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let (app, _) = app();
        for i in 0..3 {
            create_lead(&app, json!({ "name": format!("crm-{i}"), "category": "CRM" })).await;
        }
        create_lead(&app, json!({ "name": "other", "category": "Analytics" })).await;

        let (status, page) = send(&app, "GET", "/api/leads?category=CRM&page_size=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total_items"], 3);
        assert_eq!(page["total_pages"], 2);
        assert_eq!(page["items"].as_array().unwrap().len(), 2);
        assert_eq!(page["page_numbers"], json!([1, 2]));

        let (_, page) = send(
            &app,
            "GET",
            "/api/leads?category=all&sort_by=name&sort_order=asc",
            None,
        )
        .await;
        assert_eq!(page["total_items"], 4);
        assert_eq!(page["items"][0]["name"], "crm-0");
        assert_eq!(page["items"][3]["name"], "other");
    }

    #[tokio::test]
    async fn test_status_change_creates_then_moves_deal() {
        let (app, _) = app();
        let lead = create_lead(
            &app,
            json!({ "website_url": "https://acme.com", "category": "CRM", "arr": 1200.0 }),
        )
        .await;
        let id = lead["id"].as_str().unwrap();
        let uri = format!("/api/leads/{id}/status");

        let (status, update) = send(&app, "PUT", &uri, Some(json!({ "status": "Connected" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(update["lead"]["status"], "Connected");
        assert_eq!(update["deal_sync"]["action"], "created");
        assert_eq!(update["deal_sync"]["detail"]["name"], "acme.com - CRM");
        assert_eq!(update["deal_sync"]["detail"]["value"], 1200.0);

        let (_, update) = send(&app, "PUT", &uri, Some(json!({ "status": "Meeting Booked" }))).await;
        assert_eq!(update["deal_sync"]["action"], "updated");
        assert_eq!(update["deal_sync"]["detail"]["stage"], "Meeting Booked");

        let (_, update) = send(&app, "PUT", &uri, Some(json!({ "status": "Hotlist" }))).await;
        assert_eq!(update["deal_sync"]["action"], "not_applicable");

        let (_, deals) = send(&app, "GET", "/api/deals", None).await;
        let deals = deals.as_array().unwrap();
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0]["stage"], "Meeting Booked");

        let (_, hotlist) = send(&app, "GET", "/api/leads/hotlist", None).await;
        assert_eq!(hotlist["total_items"], 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_reports_partial_failure() {
        let (app, _) = app();
        let a = create_lead(&app, json!({ "name": "a" })).await;
        let b = create_lead(&app, json!({ "name": "b" })).await;
        let missing = uuid::Uuid::new_v4();

        let (status, outcome) = send(
            &app,
            "POST",
            "/api/leads/bulk-delete",
            Some(json!({ "ids": [a["id"], b["id"], missing] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["succeeded"], 2);
        assert_eq!(outcome["failed"], 1);
        assert_eq!(outcome["message"], "Deleted 2 leads, failed to delete 1");

        let (_, page) = send(&app, "GET", "/api/leads", None).await;
        assert_eq!(page["total_items"], 0);
    }

    #[tokio::test]
    async fn test_bulk_delete_rejects_malformed_ids() {
        let (app, _) = app();
        let lead = create_lead(&app, json!({ "name": "kept" })).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/leads/bulk-delete",
            Some(json!({ "ids": ["nope"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(&app, "POST", "/api/leads/bulk-delete", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, "GET", &format!("/api/leads/{}", lead["id"].as_str().unwrap()), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_import_urls_uses_template() {
        let (app, _) = app();
        let (status, outcome) = send(
            &app,
            "POST",
            "/api/leads/import-urls",
            Some(json!({
                "input": "acme.com https://globex.io\nnot-a-url",
                "template": { "category": "SaaS", "status": "Hotlist" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{outcome}");
        assert_eq!(outcome["succeeded"], 2);
        assert_eq!(outcome["message"], "Successfully created 2 leads from 2 URLs");
        for lead in outcome["created"].as_array().unwrap() {
            assert_eq!(lead["category"], "SaaS");
            assert_eq!(lead["status"], "Hotlist");
        }

        let (status, body) = send(
            &app,
            "POST",
            "/api/leads/import-urls",
            Some(json!({ "input": "nothing here" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("No valid URLs"));
    }

    #[tokio::test]
    async fn test_error_bodies() {
        let (app, _) = app();
        let missing = uuid::Uuid::new_v4();
        let (status, body) = send(&app, "GET", &format!("/api/leads/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().starts_with("Not found"));

        let (status, body) = send(
            &app,
            "POST",
            "/api/leads",
            Some(json!({ "status": "Very Hot" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = send(&app, "GET", "/api/analytics/leads?period=decade", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_field_edit_is_deferred_until_flush() {
        let (app, state) = app();
        let lead = create_lead(&app, json!({ "name": "Before" })).await;
        let id = lead["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/leads/{id}/fields/name"),
            Some(json!({ "value": "After" })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["status"], "scheduled");
        assert_eq!(body["field"], "name");

        let (_, unchanged) = send(&app, "GET", &format!("/api/leads/{id}"), None).await;
        assert_eq!(unchanged["name"], "Before");

        assert_eq!(state.field_edits.flush().await, 1);
        let (_, changed) = send(&app, "GET", &format!("/api/leads/{id}"), None).await;
        assert_eq!(changed["name"], "After");

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/leads/{id}/fields/favourite_colour"),
            Some(json!({ "value": "blue" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_team_invite_and_activate() {
        let (app, _) = app();
        let (status, member) = send(
            &app,
            "POST",
            "/api/team",
            Some(json!({ "name": " Dana ", "email": "Dana@Example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(member["status"], "pending");
        assert_eq!(member["role"], "viewer");
        assert_eq!(member["permissions"]["dashboard"], true);
        assert_eq!(member["permissions"]["leads"], false);

        let id = member["id"].as_str().unwrap();
        let (_, member) = send(&app, "POST", &format!("/api/team/{id}/activate"), None).await;
        assert_eq!(member["status"], "active");

        let (status, body) = send(&app, "POST", "/api/team", Some(json!({ "name": "No Email" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_sales_funnel_counts_statuses() {
        let (app, _) = app();
        for status in ["Connected", "Connected", "Meeting Booked", "Hotlist"] {
            create_lead(&app, json!({ "status": status })).await;
        }
        let (status, funnel) = send(&app, "GET", "/api/analytics/funnel", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            funnel,
            json!({ "total_leads": 4, "connected": 2, "meeting_booked": 1, "meeting_done": 0 })
        );
    }

    #[tokio::test]
    async fn test_revenue_trends_and_recent_activity() {
        let (app, _) = app();
        create_lead(&app, json!({ "website_url": "acme.com", "arr": 300.0 })).await;
        create_lead(&app, json!({ "website_url": "globex.io", "arr": 200.0 })).await;

        let (status, trends) = send(&app, "GET", "/api/analytics/revenue-trends", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(trends["categories"].as_array().unwrap().len(), 12);
        assert_eq!(trends["series"][0]["name"], "Monthly Revenue");
        let total: f64 = trends["series"][0]["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .sum();
        assert_eq!(total, 500.0);

        let (_, past) = send(&app, "GET", "/api/analytics/revenue-trends?year=1999", None).await;
        assert_eq!(past["year"], 1999);
        assert!(past["series"][0]["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|v| v.as_f64() == Some(0.0)));

        let (status, feed) = send(&app, "GET", "/api/analytics/recent-activity", None).await;
        assert_eq!(status, StatusCode::OK);
        let feed = feed.as_array().unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0]["type"], "contact");
        assert!(feed[0]["title"].as_str().unwrap().starts_with("New lead added: "));
    }
}
