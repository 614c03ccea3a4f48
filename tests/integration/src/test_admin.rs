//! Admin queue passthrough, permission check and data privacy tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use crate::{client, test_household_id, url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_publish_arbitrary_queue_message() {
        let client = client(&test_household_id("admin"), &[]);
        let resp = client
            .post(url("/api/v1/admin/queues/test"))
            .json(&json!({
                "queueName": "data_changes",
                "body": r#"{"eventType":"webhook_created","householdId":"h1"}"#,
            }))
            .send()
            .await
            .expect("publish");

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("json body");
        assert_eq!(body["data"]["success"], true);
        assert!(body["error"].is_null());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_queue() {
        let client = client(&test_household_id("admin"), &[]);
        let resp = client
            .post(url("/api/v1/admin/queues/test"))
            .json(&json!({"queueName": "nope", "body": "{}"}))
            .send()
            .await
            .expect("publish");

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.expect("json body");
        assert_eq!(body["error"]["code"], "invalid_request_input");
        assert_eq!(body["error"]["message"], "invalid queue name");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_check_permissions() {
        let client = client(&test_household_id("perms"), &["read.webhooks"]);
        let resp = client
            .post(url("/api/v1/users/permissions/check"))
            .json(&json!({"permissions": ["read.webhooks", "create.webhooks"]}))
            .send()
            .await
            .expect("check");

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("json body");
        assert_eq!(body["data"]["permissions"]["read.webhooks"], true);
        assert_eq!(body["data"]["permissions"]["create.webhooks"], false);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_accept_data_disclosure_request() {
        let client = client(&test_household_id("privacy"), &[]);
        let resp = client
            .post(url("/api/v1/data_privacy/disclose"))
            .send()
            .await
            .expect("disclose");

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let body: Value = resp.json().await.expect("json body");
        assert!(!body["data"]["reportID"].as_str().unwrap_or_default().is_empty());
    }
}
