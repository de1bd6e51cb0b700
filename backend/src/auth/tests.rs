use super::*;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn token_with(secret: &str, sub: &str, aud: &str, exp: usize) -> String {
    let claims = SupabaseClaims {
        sub: sub.to_string(),
        role: "authenticated".to_string(),
        email: Some("test@example.com".to_string()),
        aud: aud.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn far_future() -> usize {
    9999999999
}

#[test]
fn test_verify_supabase_jwt_success() {
    let verifier = SupabaseJwtVerifier::new(SECRET);
    let token = token_with(SECRET, USER_ID, "authenticated", far_future());

    let user = verifier.verify(&token).expect("Valid token should pass");
    assert_eq!(user.user_id, Uuid::parse_str(USER_ID).unwrap());
    assert_eq!(user.email.as_deref(), Some("test@example.com"));
    assert_eq!(user.role, "authenticated");
}

#[test]
fn test_verify_supabase_jwt_expired() {
    let verifier = SupabaseJwtVerifier::new(SECRET);
    let token = token_with(SECRET, USER_ID, "authenticated", 1);

    assert!(verifier.verify(&token).is_err());
}

#[test]
fn test_verify_supabase_jwt_invalid_signature() {
    let verifier = SupabaseJwtVerifier::new(SECRET);
    let token = token_with("wrongsecret", USER_ID, "authenticated", far_future());

    assert!(verifier.verify(&token).is_err());
}

#[test]
fn test_verify_supabase_jwt_wrong_audience() {
    let verifier = SupabaseJwtVerifier::new(SECRET);
    let token = token_with(SECRET, USER_ID, "anon", far_future());

    assert!(verifier.verify(&token).is_err());
}

#[test]
fn test_verify_supabase_jwt_non_uuid_subject() {
    let verifier = SupabaseJwtVerifier::new(SECRET);
    let token = token_with(SECRET, "not-a-uuid", "authenticated", far_future());

    assert!(verifier.verify(&token).is_err());
}

async fn extract(request: Request<()>) -> Result<AuthUser, ApiError> {
    let (mut parts, _) = request.into_parts();
    AuthUser::from_request_parts(&mut parts, &()).await
}

#[tokio::test]
async fn test_extractor_reads_bearer_token() {
    let token = token_with(SECRET, USER_ID, "authenticated", far_future());
    let mut request = Request::builder()
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .body(())
        .unwrap();
    request
        .extensions_mut()
        .insert(Arc::new(SupabaseJwtVerifier::new(SECRET)));

    let user = extract(request).await.unwrap();
    assert_eq!(user.user_id, Uuid::parse_str(USER_ID).unwrap());
}

#[tokio::test]
async fn test_extractor_rejects_missing_header_with_401() {
    let mut request = Request::builder().body(()).unwrap();
    request
        .extensions_mut()
        .insert(Arc::new(SupabaseJwtVerifier::new(SECRET)));

    let err = extract(request).await.unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_extractor_rejects_non_bearer_scheme() {
    let mut request = Request::builder()
        .header(AUTHORIZATION, "Basic abc")
        .body(())
        .unwrap();
    request
        .extensions_mut()
        .insert(Arc::new(SupabaseJwtVerifier::new(SECRET)));

    let err = extract(request).await.unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
}
