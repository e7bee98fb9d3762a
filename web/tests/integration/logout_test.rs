use serde_json::Value;
use snippetbox_db::DbPool;

use super::{mock_logged_in_state, session_token, test_request_with_db};

async fn session_data(token: &str, pool: &DbPool) -> Option<Value> {
    let data: Option<Vec<u8>> = sqlx::query_scalar("select data from sessions where token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await
        .unwrap();

    data.map(|data| serde_json::from_slice(&data).unwrap())
}

#[sqlx::test]
async fn logout_replaces_the_session_with_an_anonymous_one(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let (_user, login) = mock_logged_in_state(&request, &pool).await;
        let old_token = session_token(&login);
        assert!(session_data(&old_token, &pool).await.is_some());

        let response = request.post("/auth/logout").await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), "/");

        let new_token = session_token(&response);
        assert_ne!(new_token, old_token, "logout must issue a new token");
        assert!(
            session_data(&old_token, &pool).await.is_none(),
            "the old session must no longer resolve"
        );

        let data = session_data(&new_token, &pool)
            .await
            .expect("the new session holds the flash message");
        let keys: Vec<&String> = data.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["flash"], "the new session must be anonymous");

        let home = request.get("/").await;
        assert!(home.text().contains("logged out successfully"));
        assert!(home.text().contains("Login"));

        let protected = request.get("/snippets/new").await;
        assert!(protected.status_code().is_redirection());
    })
    .await
}

#[sqlx::test]
async fn logout_requires_login(pool: DbPool) {
    test_request_with_db(pool, |request| async move {
        let response = request.post("/auth/logout").await;

        assert!(response.status_code().is_redirection());
        assert!(
            response
                .header("location")
                .to_str()
                .unwrap()
                .starts_with("/auth/login")
        );
    })
    .await
}
