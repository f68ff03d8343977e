//! Tests for client module

#[cfg(test)]
mod tests {
    use crate::client::posts::parse_page;
    use crate::client::{IdentitySelector, PageRequest, PostsClient};
    use crate::error::SignalError;
    use crate::testing::{page, post, posts_config, status, StubServer};
    use serde_json::json;
    use std::time::Duration;

    fn request() -> PageRequest {
        PageRequest::first(
            IdentitySelector::UserId("107780257626128497".to_string()),
            true,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_selector_requires_exactly_one() {
        assert_eq!(
            IdentitySelector::from_parts(Some("42"), None).unwrap(),
            IdentitySelector::UserId("42".to_string())
        );
        assert_eq!(
            IdentitySelector::from_parts(None, Some("@realDonaldTrump")).unwrap(),
            IdentitySelector::Handle("realDonaldTrump".to_string())
        );
        assert!(matches!(
            IdentitySelector::from_parts(None, None),
            Err(SignalError::InvalidArgument(_))
        ));
        assert!(matches!(
            IdentitySelector::from_parts(Some("  "), Some("")),
            Err(SignalError::InvalidArgument(_))
        ));
        assert!(matches!(
            IdentitySelector::from_parts(Some("42"), Some("someone")),
            Err(SignalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_page_success() {
        let body = json!({
            "success": true,
            "posts": [
                {"id": "1", "text": "hello", "created_at": "2025-01-01T00:00:00Z"},
                {"id": 2, "text": null}
            ],
            "next_max_id": "abc"
        })
        .to_string();

        let page = parse_page(&body).unwrap();
        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.posts[0].text.as_deref(), Some("hello"));
        assert_eq!(page.posts[1].id.as_deref(), Some("2"));
        assert!(page.posts[1].text.is_none());
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_page_missing_posts_is_empty() {
        let page = parse_page(r#"{"success": true}"#).unwrap();
        assert!(page.posts.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_parse_page_empty_cursor_is_none() {
        let page = parse_page(r#"{"success": true, "posts": [], "next_max_id": ""}"#).unwrap();
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_parse_page_rejects_malformed() {
        let cases = [
            r#"{"success": false}"#,
            r#"{"posts": []}"#,
            r#"{"success": true, "posts": {"id": "1"}}"#,
            r#"{"success": true, "posts": null}"#,
            r#"{"success": true, "posts": ["not a record"]}"#,
            r#"[1, 2, 3]"#,
            "<html>oops</html>",
        ];
        for body in cases {
            assert!(
                matches!(parse_page(body), Err(SignalError::ResponseFormat(_))),
                "expected format error for {}",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_page_sends_auth_and_params() {
        let stub = StubServer::start(vec![page(json!([post("1", "hi")]), Some("cursor-2"))]).await;
        let client = PostsClient::new(&posts_config(&stub.url)).unwrap();

        let mut req = request();
        req.cursor = Some("cursor-1".to_string());
        let page = client.fetch_page(&req).await.unwrap();

        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("cursor-2"));

        let seen = &stub.requests()[0];
        assert_eq!(seen.method, axum::http::Method::GET);
        assert_eq!(seen.headers.get("x-api-key").unwrap(), "test-key");
        assert_eq!(seen.headers.get("accept").unwrap(), "application/json");
        assert_eq!(seen.query.get("trim").map(String::as_str), Some("true"));
        assert_eq!(seen.query.get("user_id").map(String::as_str), Some("107780257626128497"));
        assert_eq!(seen.query.get("next_max_id").map(String::as_str), Some("cursor-1"));
        assert!(!seen.query.contains_key("handle"));
    }

    #[tokio::test]
    async fn test_fetch_page_by_handle_without_trim() {
        let stub = StubServer::start(vec![page(json!([]), None)]).await;
        let client = PostsClient::new(&posts_config(&stub.url)).unwrap();

        let req = PageRequest::first(
            IdentitySelector::Handle("realDonaldTrump".to_string()),
            false,
            Duration::from_secs(5),
        );
        client.fetch_page(&req).await.unwrap();

        let seen = &stub.requests()[0];
        assert_eq!(seen.query.get("trim").map(String::as_str), Some("false"));
        assert_eq!(seen.query.get("handle").map(String::as_str), Some("realDonaldTrump"));
        assert!(!seen.query.contains_key("user_id"));
        assert!(!seen.query.contains_key("next_max_id"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let stub = StubServer::start(vec![page(json!([]), None)]).await;
        let mut config = posts_config(&stub.url);
        config.api_key = String::new();
        let client = PostsClient::new(&config).unwrap();

        let result = client.fetch_page(&request()).await;
        assert!(matches!(result, Err(SignalError::Config(_))));
        assert_eq!(stub.hits(), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let stub = StubServer::start(vec![status(401)]).await;
        let client = PostsClient::new(&posts_config(&stub.url)).unwrap();

        let result = client.fetch_page(&request()).await;
        assert!(matches!(result, Err(SignalError::Auth { status: 401 })));
        assert_eq!(stub.hits(), 1);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        for code in [400u16, 403, 404] {
            let stub = StubServer::start(vec![status(code)]).await;
            let client = PostsClient::new(&posts_config(&stub.url)).unwrap();

            let result = client.fetch_page(&request()).await;
            assert!(result.is_err(), "status {} should fail", code);
            assert_eq!(stub.hits(), 1, "status {} must not be retried", code);
        }
    }

    #[tokio::test]
    async fn test_forbidden_and_not_found_classification() {
        let stub = StubServer::start(vec![status(403)]).await;
        let client = PostsClient::new(&posts_config(&stub.url)).unwrap();
        assert!(matches!(
            client.fetch_page(&request()).await,
            Err(SignalError::Auth { status: 403 })
        ));

        let stub = StubServer::start(vec![status(404)]).await;
        let client = PostsClient::new(&posts_config(&stub.url)).unwrap();
        assert!(matches!(
            client.fetch_page(&request()).await,
            Err(SignalError::UnexpectedStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retry_budget() {
        for code in [500u16, 502, 503, 504] {
            let stub = StubServer::start(vec![status(code)]).await;
            let client = PostsClient::new(&posts_config(&stub.url)).unwrap();

            let result = client.fetch_page(&request()).await;
            assert!(matches!(result, Err(SignalError::Transient(_))), "status {}", code);
            assert_eq!(stub.hits(), 4, "status {} should use 1 + 3 attempts", code);
        }
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_after_retries() {
        let stub = StubServer::start(vec![status(429)]).await;
        let client = PostsClient::new(&posts_config(&stub.url)).unwrap();

        let result = client.fetch_page(&request()).await;
        assert!(matches!(result, Err(SignalError::RateLimited { attempts: 4 })));
        assert_eq!(stub.hits(), 4);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let stub = StubServer::start(vec![
            status(503),
            status(429),
            page(json!([post("7", "back online")]), None),
        ])
        .await;
        let client = PostsClient::new(&posts_config(&stub.url)).unwrap();

        let page = client.fetch_page(&request()).await.unwrap();
        assert_eq!(page.posts[0].id.as_deref(), Some("7"));
        assert_eq!(stub.hits(), 3);
    }

    #[tokio::test]
    async fn test_success_is_not_retried() {
        let stub = StubServer::start(vec![page(json!([]), None)]).await;
        let client = PostsClient::new(&posts_config(&stub.url)).unwrap();

        client.fetch_page(&request()).await.unwrap();
        assert_eq!(stub.hits(), 1);
    }

    #[tokio::test]
    async fn test_retry_budget_is_configurable() {
        let stub = StubServer::start(vec![status(500)]).await;
        let mut config = posts_config(&stub.url);
        config.retry.max_retries = 1;
        let client = PostsClient::new(&config).unwrap();

        assert!(client.fetch_page(&request()).await.is_err());
        assert_eq!(stub.hits(), 2);
    }

    #[tokio::test]
    async fn test_success_flag_false_is_format_error() {
        let stub = StubServer::start(vec![(200, r#"{"success": false}"#.to_string())]).await;
        let client = PostsClient::new(&posts_config(&stub.url)).unwrap();

        let result = client.fetch_page(&request()).await;
        assert!(matches!(result, Err(SignalError::ResponseFormat(_))));
        assert_eq!(stub.hits(), 1);
    }

    #[tokio::test]
    async fn test_slow_server_times_out_as_transient() {
        let stub = StubServer::start_with_delay(vec![page(json!([]), None)], Duration::from_millis(500)).await;
        let mut config = posts_config(&stub.url);
        config.retry.max_retries = 1;
        let client = PostsClient::new(&config).unwrap();

        let mut req = request();
        req.timeout = Duration::from_millis(50);
        let result = client.fetch_page(&req).await;

        assert!(matches!(result, Err(SignalError::Transient(_))));
        assert_eq!(stub.hits(), 2);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = posts_config(&format!("http://{}/posts", addr));
        let client = PostsClient::new(&config).unwrap();

        let result = client.fetch_page(&request()).await;
        assert!(matches!(result, Err(SignalError::Transient(_))));
    }
}
