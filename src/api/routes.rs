use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::auth::{self, AuthUser};
use crate::error::AppError;
use crate::ledger;
use crate::persistence;
use crate::types::portfolio::Portfolio;
use crate::types::position::PositionView;
use crate::types::stock::Stock;
use crate::types::transaction::{TransactionHistory, TransactionRecord};
use crate::types::user::User;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_secret: Vec<u8>,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct StockCreate {
    pub symbol: String,
    pub name: String,
    pub currency: String,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub stock_id: Uuid,
    pub amount: i64,
    pub price: f64,
}

async fn health() -> &'static str {
    "healthy"
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if body.email.is_empty() {
        return Err(AppError::InvalidInput("email is required".into()));
    }
    if body.password.is_empty() {
        return Err(AppError::InvalidInput("password is required".into()));
    }
    if persistence::get_user_by_email(&state.db, &body.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("email already registered".into()));
    }
    let user_id = Uuid::new_v4();
    let password_hash = auth::hash_password(&body.password)?;
    persistence::insert_user(&state.db, user_id, &body.email, &password_hash, Utc::now()).await?;
    let token = auth::create_token(&state.jwt_secret, user_id, state.token_ttl_minutes)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;
    tracing::info!(%user_id, "registered user");
    Ok((StatusCode::CREATED, Json(RegisterResponse { id: user_id, token })))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, AppError> {
    // Unknown email and wrong password produce the same rejection.
    let user = persistence::get_user_by_email(&state.db, &body.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if !auth::verify_password(&body.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }
    let token = auth::create_token(&state.jwt_secret, user.id, state.token_ttl_minutes)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;
    Ok(Json(TokenResponse { token }))
}

async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>, AppError> {
    let row = persistence::get_user_by_id(&state.db, user.user_id)
        .await?
        .ok_or(AppError::NotFound("user not found"))?;
    Ok(Json(User {
        id: row.id,
        email: row.email,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

async fn list_stocks(State(state): State<AppState>) -> Result<Json<Vec<Stock>>, AppError> {
    let stocks = persistence::list_stocks(&state.db).await?;
    Ok(Json(stocks))
}

async fn create_stock(
    State(state): State<AppState>,
    Json(body): Json<StockCreate>,
) -> Result<(StatusCode, Json<Stock>), AppError> {
    if body.symbol.is_empty() {
        return Err(AppError::InvalidInput("symbol is required".into()));
    }
    if persistence::get_stock_by_symbol(&state.db, &body.symbol)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("symbol already exists".into()));
    }
    let stock = Stock {
        id: Uuid::new_v4(),
        symbol: body.symbol,
        name: body.name,
        currency: body.currency,
        last_price: body.price,
        last_updated: Utc::now(),
    };
    persistence::insert_stock(&state.db, &stock).await?;
    tracing::info!(symbol = %stock.symbol, "created stock");
    Ok((StatusCode::CREATED, Json(stock)))
}

async fn get_stock(
    State(state): State<AppState>,
    Path(stock_id): Path<Uuid>,
) -> Result<Json<Stock>, AppError> {
    let mut conn = state.db.acquire().await?;
    let stock = persistence::get_stock_by_id(&mut conn, stock_id)
        .await?
        .ok_or(AppError::NotFound("stock not found"))?;
    Ok(Json(stock))
}

async fn portfolio_positions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<PositionView>>, AppError> {
    let portfolio = {
        let mut conn = state.db.acquire().await?;
        persistence::get_portfolio_for_user(&mut conn, user.user_id)
            .await?
            .ok_or(AppError::NotFound("portfolio not found"))?
    };
    let views = ledger::portfolio_positions(&state.db, portfolio.id).await?;
    if views.is_empty() {
        return Err(AppError::NotFound("no positions found"));
    }
    Ok(Json(views))
}

async fn create_portfolio(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<Portfolio>), AppError> {
    {
        let mut conn = state.db.acquire().await?;
        if persistence::get_portfolio_for_user(&mut conn, user.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("portfolio already exists".into()));
        }
    }
    let portfolio = Portfolio {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        created_at: Utc::now(),
    };
    persistence::insert_portfolio(&state.db, &portfolio).await?;
    tracing::info!(user_id = %user.user_id, "created portfolio");
    Ok((StatusCode::CREATED, Json(portfolio)))
}

async fn buy(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<TradeRequest>,
) -> Result<(StatusCode, Json<TransactionRecord>), AppError> {
    let record =
        ledger::execute_buy(&state.db, user.user_id, body.stock_id, body.amount, body.price)
            .await?;
    tracing::info!(user_id = %user.user_id, stock_id = %body.stock_id, amount = body.amount, "executed buy");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn sell(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<TradeRequest>,
) -> Result<(StatusCode, Json<TransactionRecord>), AppError> {
    let record =
        ledger::execute_sell(&state.db, user.user_id, body.stock_id, body.amount, body.price)
            .await?;
    tracing::info!(user_id = %user.user_id, stock_id = %body.stock_id, amount = body.amount, "executed sell");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn transaction_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TransactionHistory>>, AppError> {
    let history = persistence::list_transactions_for_user(&state.db, user.user_id).await?;
    if history.is_empty() {
        return Err(AppError::NotFound("no transactions found"));
    }
    Ok(Json(history))
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/users/me", get(me))
        .route("/api/stocks", get(list_stocks).post(create_stock))
        .route("/api/stocks/{stock_id}", get(get_stock))
        .route("/api/portfolios", get(portfolio_positions).post(create_portfolio))
        .route("/api/transactions/buy", post(buy))
        .route("/api/transactions/sell", post(sell))
        .route("/api/transactions/history", get(transaction_history))
        .with_state(state)
}
