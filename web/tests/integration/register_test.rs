use axum::http::StatusCode;
use snippetbox_db::{
    DbPool,
    entities::user::{RegisterUser, User},
};

use super::{count_rows, test_request_with_db};

fn alice() -> RegisterUser {
    RegisterUser {
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        password: "pa$$word123".to_string(),
    }
}

#[sqlx::test]
async fn signup_creates_the_user_and_redirects_to_login(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let response = request.post("/auth/register").form(&alice()).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), "/auth/login");

        let user = User::try_get_by_email("alice@example.com", &pool)
            .await
            .unwrap()
            .expect("user was not stored");
        assert_eq!(user.name, "Alice");
        assert_ne!(user.hashed_password, "pa$$word123");

        let login = request.get("/auth/login").await;
        assert!(
            login
                .text()
                .contains("Your signup was successful. Please log in.")
        );
    })
    .await
}

#[sqlx::test]
async fn signup_with_a_taken_email_is_rejected(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        User::create(alice(), &pool).await.unwrap();

        let response = request
            .post("/auth/register")
            .form(&RegisterUser {
                name: "Another Alice".to_string(),
                ..alice()
            })
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.text().contains("Email address is already in use"));
        assert!(response.text().contains("Another Alice"));
        assert_eq!(count_rows("users", &pool).await, 1);
    })
    .await
}

#[sqlx::test]
async fn signup_validates_every_field(pool: DbPool) {
    test_request_with_db(pool.clone(), |request| async move {
        let response = request
            .post("/auth/register")
            .form(&RegisterUser {
                name: "".to_string(),
                email: "not-an-email".to_string(),
                password: "s3cr3t!".to_string(),
            })
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.text();
        assert!(body.contains("This field cannot be blank"));
        assert!(body.contains("This field must be a valid email address"));
        assert!(body.contains("This field must be at least 8 characters long"));
        assert!(!body.contains("s3cr3t!"), "the password must not be echoed");
        assert_eq!(count_rows("users", &pool).await, 0);
    })
    .await
}
