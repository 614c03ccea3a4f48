//! Webhook resource integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::{client, test_household_id, url};

    const ALL: &[&str] = &["create.webhooks", "read.webhooks", "update.webhooks", "archive.webhooks"];

    fn webhook(name: &str) -> Value {
        json!({
            "name": name,
            "contentType": "application/json",
            "url": "https://example.com/hook",
            "method": "POST",
            "events": ["webhook_created"],
        })
    }

    async fn create(client: &reqwest::Client, name: &str) -> String {
        let resp = client
            .post(url("/api/v1/webhooks"))
            .json(&webhook(name))
            .send()
            .await
            .expect("create");
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = resp.json().await.expect("json body");
        body["data"]["id"].as_str().expect("webhook id").to_owned()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_read_update_and_archive_webhook() {
        let client = client(&test_household_id("hooks"), ALL);
        let id = create(&client, "ping").await;
        let item = url(&format!("/api/v1/webhooks/{id}"));

        let resp = client.get(&item).send().await.expect("read");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("json body");
        assert_eq!(body["data"]["name"], "ping");

        let resp = client
            .put(&item)
            .json(&json!({"name": "pong"}))
            .send()
            .await
            .expect("update");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("json body");
        assert_eq!(body["data"]["name"], "pong");
        assert!(!body["data"]["lastUpdatedAt"].is_null());

        let resp = client.delete(&item).send().await.expect("archive");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = client.get(&item).send().await.expect("read");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_page_webhook_list() {
        let client = client(&test_household_id("paging"), ALL);
        for i in 0..3 {
            create(&client, &format!("hook-{i}")).await;
        }

        let resp = client
            .get(url("/api/v1/webhooks?page=2&limit=2"))
            .send()
            .await
            .expect("list");
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("json body");
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["pagination"]["page"], 2);
        assert_eq!(body["pagination"]["limit"], 2);
        assert_eq!(body["pagination"]["totalCount"], 3);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_invalid_webhook() {
        let client = client(&test_household_id("invalid"), ALL);
        let resp = client
            .post(url("/api/v1/webhooks"))
            .json(&json!({"name": "", "url": "nope", "method": "POST", "contentType": "application/json"}))
            .send()
            .await
            .expect("create");

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.expect("json body");
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_forbid_archive_without_permission() {
        let household = test_household_id("forbid");
        let id = create(&client(&household, ALL), "keep").await;

        let resp = client(&household, &["read.webhooks"])
            .delete(url(&format!("/api/v1/webhooks/{id}")))
            .send()
            .await
            .expect("archive");
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
