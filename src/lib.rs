// Inventario de Equipos - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod db;
pub mod report;
pub mod stats;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use db::{
    delete_equipo, get_all_equipos, get_equipo, get_equipos_by_categoria, insert_equipos,
    load_csv, setup_database, update_equipo, verify_count, Equipo,
};
pub use report::{ReportEntry, StatsReport};
pub use stats::{CategoryAggregator, CategoryTally, PALETTE};
pub use store::{EquipmentStore, SubscriptionId};
pub use validation::{EquipoValidator, ValidationError, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
