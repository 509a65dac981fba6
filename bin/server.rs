// Inventario de Equipos - Web Server
// REST API with Axum: catalog, category stats, shareable HTML report

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use inventario::{CategoryAggregator, Equipo, StatsReport};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    // Color accumulator survives across requests so legend colors stay stable
    aggregator: Arc<Mutex<CategoryAggregator>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Equipment response (simplified for API)
#[derive(Serialize)]
struct EquipoResponse {
    id: String,
    modelo: String,
    descripcion: String,
    numero_serie: String,
    estado: String,
    categoria: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    imagen: Option<String>,
    fecha_registro: String,
}

impl From<Equipo> for EquipoResponse {
    fn from(equipo: Equipo) -> Self {
        Self {
            id: equipo.id,
            modelo: equipo.modelo,
            descripcion: equipo.descripcion,
            numero_serie: equipo.numero_serie,
            estado: equipo.estado,
            categoria: equipo.categoria,
            imagen: equipo.imagen,
            fecha_registro: equipo.fecha_registro.to_rfc3339(),
        }
    }
}

/// Stats response: chart data plus ready-made legend lines
#[derive(Serialize)]
struct StatsResponse {
    labels: Vec<String>,
    counts: Vec<usize>,
    colors: std::collections::HashMap<String, String>,
    legend: Vec<String>,
    total: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/equipos - Get all equipment records
async fn get_equipos(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match inventario::get_all_equipos(&conn) {
        Ok(equipos) => {
            let response: Vec<EquipoResponse> = equipos.into_iter().map(|e| e.into()).collect();
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => {
            eprintln!("Error getting equipos: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<EquipoResponse>::new())),
            )
                .into_response()
        }
    }
}

/// GET /api/equipos/categoria/:categoria - Filter records by category
async fn get_equipos_by_categoria(
    State(state): State<AppState>,
    Path(categoria): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    // Decode URL-encoded category name
    let decoded = urlencoding::decode(&categoria)
        .unwrap_or_else(|_| categoria.clone().into())
        .into_owned();

    match inventario::get_equipos_by_categoria(&conn, &decoded) {
        Ok(equipos) => {
            let response: Vec<EquipoResponse> = equipos.into_iter().map(|e| e.into()).collect();
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => {
            eprintln!("Error getting equipos for category {}: {}", decoded, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<EquipoResponse>::new())),
            )
                .into_response()
        }
    }
}

/// GET /api/stats - Category tally for chart + legend
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match inventario::get_all_equipos(&conn) {
        Ok(equipos) => {
            let mut aggregator = state.aggregator.lock().unwrap();
            let tally = aggregator.recompute(&equipos);

            let stats = StatsResponse {
                legend: tally.legend(),
                total: tally.total(),
                labels: tally.labels,
                counts: tally.counts,
                colors: tally.colors,
            };

            (StatusCode::OK, Json(ApiResponse::ok(stats))).into_response()
        }
        Err(e) => {
            eprintln!("Error getting stats: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(StatsResponse {
                    labels: vec![],
                    counts: vec![],
                    colors: Default::default(),
                    legend: vec![],
                    total: 0,
                })),
            )
                .into_response()
        }
    }
}

/// GET /report - Shareable HTML statistics report
async fn get_report(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match inventario::get_all_equipos(&conn) {
        Ok(equipos) => {
            let mut aggregator = state.aggregator.lock().unwrap();
            let tally = aggregator.recompute(&equipos);
            let report = StatsReport::from_tally(&tally);
            Html(report.to_html()).into_response()
        }
        Err(e) => {
            eprintln!("Error building report: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Error generando el reporte</h1>".to_string()),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Inventario de Equipos - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Open database
    let db_path = std::env::var("INVENTARIO_DB").unwrap_or_else(|_| "equipos.db".to_string());

    let conn = Connection::open(&db_path).expect("Failed to open database");
    inventario::setup_database(&conn).expect("Failed to initialize database");
    println!("✓ Database opened: {}", db_path);

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        aggregator: Arc::new(Mutex::new(CategoryAggregator::new())),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/equipos", get(get_equipos))
        .route("/equipos/categoria/:categoria", get(get_equipos_by_categoria))
        .route("/stats", get(get_stats));

    // Build main router
    let app = Router::new()
        .route("/report", get(get_report))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API:    http://localhost:3000/api/equipos");
    println!("   Stats:  http://localhost:3000/api/stats");
    println!("   Report: http://localhost:3000/report");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
