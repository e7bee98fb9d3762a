use axum::http::StatusCode;
use chrono::{Duration, Utc};
use snippetbox_db::{
    DbPool,
    entities::snippet::{Snippet, SnippetChangeset},
};

use super::{authenticated_request, count_rows, test_request_with_db};

#[sqlx::test]
async fn home_lists_the_seeded_snippets(pool: DbPool) {
    test_request_with_db(pool, |request| async move {
        let response = request.get("/").await;

        response.assert_status_ok();
        let body = response.text();
        assert!(body.contains("An old silent pond"));
        assert!(body.contains("Over the wintry forest"));
        assert!(body.contains("First autumn morning"));
        assert!(body.contains("Signup"), "anonymous visitors get the signup link");
    })
    .await
}

#[sqlx::test]
async fn show_renders_an_active_snippet(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let snippet = Snippet::insert(
            "O snail",
            "Climb Mount Fuji,\nBut slowly, slowly!",
            Duration::days(7),
            Utc::now(),
            &pool,
        )
        .await
        .unwrap();

        let response = request.get(&format!("/snippets/{}", snippet.id)).await;

        response.assert_status_ok();
        assert!(response.text().contains("O snail"));
        assert!(response.text().contains("Climb Mount Fuji,"));
    })
    .await
}

#[sqlx::test]
async fn show_is_not_found_for_missing_expired_or_malformed_ids(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let expired = Snippet::insert(
            "Old",
            "gone",
            Duration::days(1),
            Utc::now() - Duration::days(8),
            &pool,
        )
        .await
        .unwrap();

        for path in [
            format!("/snippets/{}", expired.id),
            "/snippets/9999".to_string(),
            "/snippets/0".to_string(),
            "/snippets/-1".to_string(),
            "/snippets/abc".to_string(),
        ] {
            let response = request.get(&path).await;

            response.assert_status_not_found();
            assert_eq!(response.text(), "Not Found", "for {path}");
        }
    })
    .await
}

#[sqlx::test]
async fn new_snippet_form_requires_login(pool: DbPool) {
    test_request_with_db(pool, |request| async move {
        let response = request.get("/snippets/new").await;

        assert!(response.status_code().is_redirection());
        let location = response.header("location");
        assert!(
            location.to_str().unwrap().starts_with("/auth/login?next="),
            "redirected to {location:?}"
        );
    })
    .await
}

#[sqlx::test]
async fn creating_a_snippet_requires_login(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let response = request
            .post("/snippets")
            .form(&SnippetChangeset {
                title: "O snail".to_string(),
                content: "Climb Mount Fuji".to_string(),
                expires: 7,
            })
            .await;

        assert!(response.status_code().is_redirection());
        assert_eq!(count_rows("snippets", &pool).await, 3);
    })
    .await
}

#[sqlx::test]
async fn signed_in_users_can_create_snippets(pool: DbPool) {
    authenticated_request(pool, |request, _user| async move {
        let form = request.get("/snippets/new").await;
        form.assert_status_ok();
        assert_eq!(form.header("cache-control"), "no-store");

        let response = request
            .post("/snippets")
            .form(&SnippetChangeset {
                title: "O snail".to_string(),
                content: "Climb Mount Fuji,\nBut slowly, slowly!".to_string(),
                expires: 7,
            })
            .await;

        response.assert_status_see_other();
        let location = response.header("location").to_str().unwrap().to_string();
        assert!(location.starts_with("/snippets/"), "redirected to {location}");

        let page = request.get(&location).await;
        page.assert_status_ok();
        assert!(page.text().contains("O snail"));
        assert!(page.text().contains("Snippet successfully created!"));

        let again = request.get(&location).await;
        assert!(!again.text().contains("Snippet successfully created!"));
    })
    .await
}

#[sqlx::test]
async fn invalid_snippets_rerender_the_form(pool: DbPool) {
    authenticated_request(pool.clone(), |request, _user| async move {
        let response = request
            .post("/snippets")
            .form(&SnippetChangeset {
                title: "   ".to_string(),
                content: "Kept content".to_string(),
                expires: 30,
            })
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.text();
        assert!(body.contains("This field cannot be blank"));
        assert!(body.contains("This field must equal 1, 7 or 365"));
        assert!(body.contains("Kept content"));
        assert_eq!(count_rows("snippets", &pool).await, 3);
    })
    .await
}
