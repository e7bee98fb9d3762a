use snippetbox_db::DbPool;

use super::test_request_with_db;

#[sqlx::test]
async fn ping_answers_ok(pool: DbPool) {
    test_request_with_db(pool, |request| async move {
        let response = request.get("/ping").await;

        response.assert_status_ok();
        response.assert_text("OK");
    })
    .await
}

#[sqlx::test]
async fn responses_carry_secure_headers(pool: DbPool) {
    test_request_with_db(pool, |request| async move {
        for path in ["/", "/snippets/9999", "/static/css/main.css"] {
            let response = request.get(path).await;

            assert_eq!(response.header("x-frame-options"), "deny", "for {path}");
            assert_eq!(response.header("x-content-type-options"), "nosniff");
            assert_eq!(response.header("referrer-policy"), "origin-when-cross-origin");
            assert_eq!(response.header("x-xss-protection"), "0");
            assert!(
                response
                    .header("content-security-policy")
                    .to_str()
                    .unwrap()
                    .starts_with("default-src 'self'")
            );
        }
    })
    .await
}

#[sqlx::test]
async fn static_assets_are_served(pool: DbPool) {
    test_request_with_db(pool, |request| async move {
        let response = request.get("/static/css/main.css").await;

        response.assert_status_ok();
        assert!(response.text().contains("body"));
    })
    .await
}

#[sqlx::test]
async fn public_pages_are_not_marked_no_store(pool: DbPool) {
    test_request_with_db(pool, |request| async move {
        let response = request.get("/").await;

        assert!(response.headers().get("cache-control").is_none());
    })
    .await
}
