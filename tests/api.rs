//! End-to-end API tests: register, login, catalog, portfolio, buy/sell.
//! These run against a real Postgres and are ignored by default:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use portfolio_tracker::api::routes::{AppState, app_router};
use portfolio_tracker::persistence::create_pool_and_migrate;
use uuid::Uuid;

/// Spawn app on a random port and return (base_url, guard that keeps server running).
async fn spawn_app() -> (String, tokio::task::JoinHandle<()>) {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for API tests");
    let pool = create_pool_and_migrate(&database_url).await.unwrap();
    let state = AppState {
        db: pool,
        jwt_secret: b"test-jwt-secret".to_vec(),
        token_ttl_minutes: 15,
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);
    let app = app_router(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base_url, handle)
}

fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4())
}

fn unique_symbol() -> String {
    format!("T{}", Uuid::new_v4().simple())
}

async fn register(client: &reqwest::Client, base_url: &str, email: &str) -> (Uuid, String) {
    let res = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&serde_json::json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);
    let json: serde_json::Value = res.json().await.unwrap();
    let id = json["id"].as_str().unwrap().parse().unwrap();
    let token = json["token"].as_str().unwrap().to_string();
    (id, token)
}

async fn create_stock(client: &reqwest::Client, base_url: &str, symbol: &str, price: f64) -> Uuid {
    let res = client
        .post(format!("{}/api/stocks", base_url))
        .json(&serde_json::json!({
            "symbol": symbol,
            "name": "Test Corp",
            "currency": "USD",
            "price": price,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);
    let json: serde_json::Value = res.json().await.unwrap();
    json["id"].as_str().unwrap().parse().unwrap()
}

async fn create_portfolio(client: &reqwest::Client, base_url: &str, token: &str) {
    let res = client
        .post(format!("{}/api/portfolios", base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);
}

async fn trade(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    action: &str,
    stock_id: Uuid,
    amount: i64,
    price: f64,
) -> reqwest::Response {
    client
        .post(format!("{}/api/transactions/{}", base_url, action))
        .bearer_auth(token)
        .json(&serde_json::json!({ "stock_id": stock_id, "amount": amount, "price": price }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn register_login_me_flow() {
    let (base_url, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    let (id, _) = register(&client, &base_url, &email).await;

    let res = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&serde_json::json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let json: serde_json::Value = res.json().await.unwrap();
    let token = json["token"].as_str().unwrap();

    let res = client
        .get(format!("{}/api/users/me", base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let json: serde_json::Value = res.json().await.unwrap();
    assert_eq!(json["id"].as_str().unwrap(), id.to_string());
    assert_eq!(json["email"].as_str().unwrap(), email);
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn duplicate_registration_rejected_and_first_user_intact() {
    let (base_url, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    let (_, token) = register(&client, &base_url, &email).await;

    let res = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&serde_json::json!({ "email": email, "password": "different" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let json: serde_json::Value = res.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("already registered"));

    // First registration still authenticates.
    let res = client
        .get(format!("{}/api/users/me", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn login_with_wrong_password_rejected() {
    let (base_url, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();
    register(&client, &base_url, &email).await;

    let res = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&serde_json::json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn protected_routes_reject_missing_or_bad_token() {
    let (base_url, _handle) = spawn_app().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/users/me", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);

    let res = client
        .get(format!("{}/api/portfolios", base_url))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn duplicate_stock_symbol_rejected() {
    let (base_url, _handle) = spawn_app().await;
    let client = reqwest::Client::new();
    let symbol = unique_symbol();

    create_stock(&client, &base_url, &symbol, 100.0).await;
    let res = client
        .post(format!("{}/api/stocks", base_url))
        .json(&serde_json::json!({
            "symbol": symbol,
            "name": "Other Corp",
            "currency": "USD",
            "price": 50.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn buy_sell_flow_maintains_weighted_average() {
    let (base_url, _handle) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_, token) = register(&client, &base_url, &unique_email()).await;
    let stock_id = create_stock(&client, &base_url, &unique_symbol(), 100.0).await;

    // Buying before creating a portfolio fails; nothing is auto-created.
    let res = trade(&client, &base_url, &token, "buy", stock_id, 10, 100.0).await;
    assert_eq!(res.status().as_u16(), 404);

    create_portfolio(&client, &base_url, &token).await;

    let res = trade(&client, &base_url, &token, "buy", stock_id, 10, 100.0).await;
    assert_eq!(res.status().as_u16(), 201);
    let res = trade(&client, &base_url, &token, "buy", stock_id, 10, 200.0).await;
    assert_eq!(res.status().as_u16(), 201);
    let json: serde_json::Value = res.json().await.unwrap();
    assert_eq!(json["type"].as_str().unwrap(), "BUY");

    let res = client
        .get(format!("{}/api/portfolios", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let positions: serde_json::Value = res.json().await.unwrap();
    assert_eq!(positions.as_array().unwrap().len(), 1);
    assert_eq!(positions[0]["quantity"].as_i64().unwrap(), 20);
    assert!((positions[0]["average_cost"].as_f64().unwrap() - 150.0).abs() < 1e-9);

    // Overselling is rejected and leaves the position unchanged.
    let res = trade(&client, &base_url, &token, "sell", stock_id, 21, 150.0).await;
    assert_eq!(res.status().as_u16(), 400);

    // Non-positive amounts are rejected up front.
    let res = trade(&client, &base_url, &token, "buy", stock_id, 0, 150.0).await;
    assert_eq!(res.status().as_u16(), 400);
    let res = trade(&client, &base_url, &token, "sell", stock_id, -3, 150.0).await;
    assert_eq!(res.status().as_u16(), 400);

    // Selling the full quantity deletes the position.
    let res = trade(&client, &base_url, &token, "sell", stock_id, 20, 180.0).await;
    assert_eq!(res.status().as_u16(), 201);
    let res = client
        .get(format!("{}/api/portfolios", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);

    // History carries all three executions, newest first.
    let res = client
        .get(format!("{}/api/transactions/history", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let history: serde_json::Value = res.json().await.unwrap();
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["type"].as_str().unwrap(), "SELL");
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn unknown_stock_rejected_on_buy() {
    let (base_url, _handle) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_, token) = register(&client, &base_url, &unique_email()).await;
    create_portfolio(&client, &base_url, &token).await;

    let res = trade(&client, &base_url, &token, "buy", Uuid::new_v4(), 5, 10.0).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn second_portfolio_rejected() {
    let (base_url, _handle) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_, token) = register(&client, &base_url, &unique_email()).await;
    create_portfolio(&client, &base_url, &token).await;

    let res = client
        .post(format!("{}/api/portfolios", base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
}
