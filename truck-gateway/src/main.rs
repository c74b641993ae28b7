// IceTruck Gateway Service - HTTP entry point for the point-of-sale core
// Translates the truck's REST surface into register commands and query reads

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use truck_core::{Account, Config, Error, Item, PurchaseRequest, Register, TruckInventory};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub register: Arc<Register>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuyFoodRequest {
    pub food_item_id: Uuid,
    pub customer_id: Uuid,
    pub ice_cream_truck_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuyFoodResponse {
    pub success: bool,
    pub message: String,
    pub record_id: Uuid,
    pub total_price: Decimal,
    pub stock_remaining: u32,
    pub balance_remaining: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFoodItemRequest {
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default)]
    pub flavors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    pub truck_id: Uuid,
    pub total_revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: String,
    pub store_reachable: bool,
}

// Error handling
pub enum GatewayError {
    Core(Error),
    Internal(String),
}

/// Status code for each core error kind: unresolved IDs map to 404,
/// rejected business rules to 400, infrastructure failures to 500
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::ItemNotFound(_) | Error::AccountNotFound(_) | Error::TruckNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        Error::InvalidQuantity(_)
        | Error::InvalidPrice(_)
        | Error::InvalidBalance(_)
        | Error::TotalOverflow { .. }
        | Error::InsufficientStock { .. }
        | Error::InsufficientBalance { .. }
        | Error::ItemNameTaken(_)
        | Error::AlreadyProvisioned => StatusCode::BAD_REQUEST,
        Error::Storage(_)
        | Error::Serialization(_)
        | Error::Concurrency(_)
        | Error::Config(_)
        | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GatewayError::Core(err) => (status_for(&err), err.to_string()),
            GatewayError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", msg))
            }
        };

        (status, Json(serde_json::json!({
            "error": message,
            "timestamp": chrono::Utc::now(),
        }))).into_response()
    }
}

impl From<Error> for GatewayError {
    fn from(err: Error) -> Self {
        GatewayError::Core(err)
    }
}

// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_reachable = state.register.queries().stats().is_ok();
    let config = state.register.config();

    Json(HealthResponse {
        status: if store_reachable { "healthy" } else { "degraded" },
        service: config.service_name.clone(),
        version: config.service_version.clone(),
        store_reachable,
    })
}

// Prometheus metrics endpoint
async fn metrics_handler(State(state): State<AppState>) -> Result<String, GatewayError> {
    state
        .register
        .metrics()
        .export()
        .map_err(|e| GatewayError::Internal(format!("Failed to export metrics: {}", e)))
}

// Buy food from the truck
async fn buy_food(
    State(state): State<AppState>,
    Json(body): Json<BuyFoodRequest>,
) -> Result<Json<BuyFoodResponse>, GatewayError> {
    info!(
        "Received buy_food: item {} x{} for customer {}",
        body.food_item_id, body.quantity, body.customer_id
    );

    let receipt = state
        .register
        .purchase(PurchaseRequest {
            item_id: body.food_item_id,
            account_id: body.customer_id,
            truck_id: body.ice_cream_truck_id,
            quantity: body.quantity,
        })
        .await?;

    Ok(Json(BuyFoodResponse {
        success: true,
        message: "ENJOY!".to_string(),
        record_id: receipt.record.id,
        total_price: receipt.record.total,
        stock_remaining: receipt.stock_remaining,
        balance_remaining: receipt.balance_remaining,
    }))
}

// Total revenue for a truck
async fn revenue(
    State(state): State<AppState>,
    Path(truck_id): Path<Uuid>,
) -> Result<Json<RevenueResponse>, GatewayError> {
    let total_revenue = state.register.total_revenue(truck_id)?;

    Ok(Json(RevenueResponse {
        truck_id,
        total_revenue,
    }))
}

// A truck and the items it currently offers
async fn inventory(
    State(state): State<AppState>,
    Path(truck_id): Path<Uuid>,
) -> Result<Json<TruckInventory>, GatewayError> {
    Ok(Json(state.register.truck_inventory(truck_id)?))
}

// List the full catalog
async fn list_food_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, GatewayError> {
    Ok(Json(state.register.queries().list_items()?))
}

// Look up one catalog item
async fn get_food_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Item>, GatewayError> {
    Ok(Json(state.register.queries().get_item(item_id)?))
}

// Add a catalog item (administrative)
async fn create_food_item(
    State(state): State<AppState>,
    Json(body): Json<CreateFoodItemRequest>,
) -> Result<(StatusCode, Json<Item>), GatewayError> {
    let item = Item::new(body.name, body.price, body.stock).with_flavors(body.flavors);
    let item = state.register.create_item(item).await?;

    Ok((StatusCode::CREATED, Json(item)))
}

// Open a customer account (administrative)
async fn create_customer(
    State(state): State<AppState>,
    Json(body): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Account>), GatewayError> {
    let account = state
        .register
        .create_account(Account::new(body.name, body.balance))
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

// Provision the default truck and catalog
async fn add_default_data(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, GatewayError> {
    let truck = state.register.provision_defaults().await?;
    info!("Provisioned default truck {} ({})", truck.name, truck.id);

    Ok(Json(MessageResponse {
        message: "Default data added successfully.".to_string(),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("🚀 Starting IceTruck Gateway Service");

    // Load configuration: file when TRUCK_CONFIG is set, environment otherwise
    let config = match std::env::var("TRUCK_CONFIG") {
        Ok(path) => Config::from_file(&path)?,
        Err(_) => Config::from_env()?,
    };
    let bind_addr = config.http_listen_addr.clone();

    info!("Opening register at {:?}", config.data_dir);
    let register = Register::open(config).await?;

    let state = AppState {
        register: Arc::new(register),
    };

    // Build router with CORS and request tracing
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/buy_food", post(buy_food))
        .route("/revenue/:truck_id", get(revenue))
        .route("/inventory/:truck_id", get(inventory))
        .route("/food_items", get(list_food_items).post(create_food_item))
        .route("/food_items/:item_id", get(get_food_item))
        .route("/customers", post(create_customer))
        .route("/add_default_data", post(add_default_data))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("✅ Gateway listening on: {}", bind_addr);
    info!("   POST /buy_food             - Purchase from the truck");
    info!("   GET  /revenue/:truck_id    - Total revenue for a truck");
    info!("   GET  /inventory/:truck_id  - Truck inventory");
    info!("   GET  /food_items           - List catalog");
    info!("   POST /food_items           - Add catalog item");
    info!("   POST /customers            - Open customer account");
    info!("   POST /add_default_data     - Provision default data");
    info!("   GET  /health               - Health check");
    info!("   GET  /metrics              - Prometheus metrics");

    axum::serve(listener, app).await?;

    Ok(())
}
