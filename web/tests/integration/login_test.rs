use axum::http::StatusCode;
use fake::{Fake as _, Faker};
use snippetbox_db::{
    DbPool,
    entities::{
        session::Session,
        user::{RegisterUser, User, UserCredentials},
    },
};

use super::{count_rows, session_token, test_request_with_db};

#[sqlx::test]
async fn login_creates_session_on_success(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let user: RegisterUser = Faker.fake();

        User::create(user.clone(), &pool).await.unwrap();

        let response = request
            .post("/auth/login")
            .form(&UserCredentials {
                email: user.email,
                password: user.password,
                next: None,
            })
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), "/snippets/new");

        let token = session_token(&response);
        let session = sqlx::query_as::<_, Session>(
            "select token, data, expiry from sessions where token = ?",
        )
        .bind(&token)
        .fetch_optional(&pool)
        .await
        .unwrap()
        .expect("no session found in the database");

        assert_eq!(
            token, session.token,
            "session cookie did not match the stored token"
        );
        assert_eq!(token.len(), 22);

        let cookie = response.cookie("id").to_string();
        assert!(cookie.contains("HttpOnly"), "got {cookie}");
        assert!(cookie.contains("SameSite=Strict"), "got {cookie}");
    })
    .await
}

#[sqlx::test]
async fn login_replaces_an_existing_anonymous_session(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let user: RegisterUser = Faker.fake();

        // Signing up leaves a flash message, which starts an anonymous session.
        let signup = request.post("/auth/register").form(&user).await;
        signup.assert_status_see_other();
        let anonymous_token = session_token(&signup);

        let login = request
            .post("/auth/login")
            .form(&UserCredentials {
                email: user.email,
                password: user.password,
                next: None,
            })
            .await;
        login.assert_status_see_other();
        let authenticated_token = session_token(&login);

        assert_ne!(
            authenticated_token, anonymous_token,
            "login must issue a new token"
        );
        let old_rows: i64 = sqlx::query_scalar("select count(*) from sessions where token = ?")
            .bind(&anonymous_token)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(old_rows, 0, "the anonymous session must no longer resolve");
        assert_eq!(count_rows("sessions", &pool).await, 1);
    })
    .await
}

#[sqlx::test]
async fn login_follows_local_next_only(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let user: RegisterUser = Faker.fake();
        User::create(user.clone(), &pool).await.unwrap();

        let response = request
            .post("/auth/login")
            .form(&UserCredentials {
                email: user.email.clone(),
                password: user.password.clone(),
                next: Some("/snippets/1".to_string()),
            })
            .await;
        assert_eq!(response.header("location"), "/snippets/1");

        let response = request
            .post("/auth/login")
            .form(&UserCredentials {
                email: user.email,
                password: user.password,
                next: Some("//evil.example.com/".to_string()),
            })
            .await;
        assert_eq!(response.header("location"), "/snippets/new");
    })
    .await
}

#[sqlx::test]
async fn login_page_keeps_the_requested_page(pool: DbPool) {
    test_request_with_db(pool, |request| async move {
        let response = request.get("/auth/login?next=/snippets/new").await;

        response.assert_status_ok();
        assert!(response.text().contains(r#"name="next""#));
    })
    .await
}

#[sqlx::test]
async fn login_does_not_create_session_on_invalid_credentials(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let user: RegisterUser = Faker.fake();

        // 😉User is not created in the database

        let response = request
            .post("/auth/login")
            .form(&UserCredentials {
                email: user.email,
                password: user.password,
                next: None,
            })
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("Email or password is incorrect"));
        assert!(
            response.maybe_cookie("id").is_none(),
            "oops a session cookie was created for a non existent user"
        );
    })
    .await
}

#[sqlx::test]
async fn login_rejects_a_wrong_password_like_an_unknown_user(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let user: RegisterUser = Faker.fake();

        User::create(user.clone(), &pool)
            .await
            .expect("failed to create user in test db");

        let wrong_password = request
            .post("/auth/login")
            .form(&UserCredentials {
                email: user.email.clone(),
                password: "wrongPa$$word".into(),
                next: None,
            })
            .await;

        let unknown_user = request
            .post("/auth/login")
            .form(&UserCredentials {
                email: "thisisnotauser@fake.com".into(),
                password: user.password,
                next: None,
            })
            .await;

        for response in [wrong_password, unknown_user] {
            response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
            assert!(response.text().contains("Email or password is incorrect"));
            assert!(response.maybe_cookie("id").is_none());
        }
    })
    .await
}

#[sqlx::test]
async fn login_validates_the_form_first(pool: DbPool) {
    test_request_with_db(pool, |request| async move {
        let response = request
            .post("/auth/login")
            .form(&UserCredentials {
                email: "".into(),
                password: "".into(),
                next: None,
            })
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("This field cannot be blank"));
        assert!(!response.text().contains("Email or password is incorrect"));
    })
    .await
}
