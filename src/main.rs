// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

// Use library instead of local modules
use inventario::{CategoryAggregator, EquipmentStore, StatsReport};

fn db_path() -> PathBuf {
    env::var("INVENTARIO_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("equipos.db"))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => {
            let csv_path = args
                .get(2)
                .context("Usage: inventario import <equipos.csv>")?;
            run_import(Path::new(csv_path))?;
        }
        Some("report") => {
            let out_path = args
                .get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("estadisticas.html"));
            run_report(&out_path)?;
        }
        _ => run_ui_mode()?,
    }

    Ok(())
}

fn run_import(csv_path: &Path) -> Result<()> {
    println!("🗄️  Importando equipos: CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Leyendo CSV...");
    let equipos = inventario::load_csv(csv_path)?;
    println!("✓ {} equipos leídos de {:?}", equipos.len(), csv_path);

    println!("\n🔧 Abriendo base de datos...");
    let mut store = EquipmentStore::open(&db_path())?;

    println!("\n💾 Insertando equipos...");
    let inserted = store.import(&equipos)?;
    let total = inventario::verify_count(store.connection())?;

    println!("✓ Insertados: {}", inserted);
    println!("✓ Duplicados omitidos: {}", equipos.len() - inserted);
    println!("✓ Total en la base: {}", total);

    Ok(())
}

fn run_report(out_path: &Path) -> Result<()> {
    println!("📄 Generando reporte de estadísticas...");

    let store = EquipmentStore::open(&db_path())?;
    let equipos = store.snapshot()?;

    let mut aggregator = CategoryAggregator::new();
    let tally = aggregator.recompute(&equipos);
    let report = StatsReport::from_tally(&tally);

    std::fs::write(out_path, report.to_html())
        .with_context(|| format!("Failed to write report to {:?}", out_path))?;

    println!("✓ {}", report.summary());
    println!("✓ Reporte escrito en {:?}", out_path);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    println!("🖥️  Cargando catálogo de equipos...\n");

    let path = db_path();
    if !path.exists() {
        eprintln!("❌ Base de datos no encontrada!");
        eprintln!("   Ejecuta: inventario import <equipos.csv>");
        eprintln!("   para cargar equipos primero.");
        std::process::exit(1);
    }

    let store = EquipmentStore::open(&path)?;
    let equipos = store.snapshot()?;

    println!("✓ {} equipos cargados\n", equipos.len());
    println!("Iniciando UI... (pulsa 'q' para salir)\n");

    let mut app = ui::App::new(equipos);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI cerrada");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ Modo TUI no disponible!");
    eprintln!("   Recompila con: cargo build --features tui");
    eprintln!("   O usa la API: cargo run --bin inventario-server --features server");
    std::process::exit(1);
}
