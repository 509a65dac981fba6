use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// One piece of tracked equipment.
///
/// `id` is the stable identity (UUID string); everything else is a value the
/// user can edit. `categoria` may be left empty by imports — such records are
/// stored but excluded from category statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipo {
    #[serde(default = "default_uuid")]
    pub id: String,

    #[serde(rename = "Modelo")]
    pub modelo: String,

    #[serde(rename = "Descripcion")]
    pub descripcion: String,

    #[serde(rename = "NumeroSerie")]
    pub numero_serie: String,

    #[serde(rename = "Estado")]
    pub estado: String,

    #[serde(rename = "Categoria", default)]
    pub categoria: String,

    /// Opaque image reference (file path or URI); optional
    #[serde(rename = "Imagen", default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagen: Option<String>,

    #[serde(default = "Utc::now")]
    pub fecha_registro: DateTime<Utc>,
}

fn default_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Equipo {
    pub fn new(
        modelo: String,
        descripcion: String,
        numero_serie: String,
        estado: String,
        categoria: String,
        imagen: Option<String>,
    ) -> Self {
        Equipo {
            id: default_uuid(),
            modelo,
            descripcion,
            numero_serie,
            estado,
            categoria,
            imagen,
            fecha_registro: Utc::now(),
        }
    }

    /// Hash for import deduplication (model + serial number).
    /// NOTE: identity is `id`; this hash only detects re-imports.
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}{}", self.modelo, self.numero_serie));
        format!("{:x}", hasher.finalize())
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS equipos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            equipo_uuid TEXT UNIQUE NOT NULL,
            idempotency_hash TEXT UNIQUE NOT NULL,
            modelo TEXT NOT NULL,
            descripcion TEXT NOT NULL,
            numero_serie TEXT NOT NULL,
            estado TEXT NOT NULL,
            categoria TEXT NOT NULL,
            imagen TEXT,
            fecha_registro TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_equipos_categoria ON equipos(categoria)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_equipos_hash ON equipos(idempotency_hash)",
        [],
    )?;

    Ok(())
}

/// Load equipment records from a CSV file (Modelo, Descripcion, NumeroSerie,
/// Estado, Categoria, Imagen columns).
pub fn load_csv(csv_path: &Path) -> Result<Vec<Equipo>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut equipos = Vec::new();

    for result in rdr.deserialize() {
        let equipo: Equipo = result.context("Failed to deserialize equipment record")?;
        equipos.push(equipo);
    }

    Ok(equipos)
}

/// Insert records, skipping duplicates (same model + serial number already
/// imported). Returns the number actually inserted.
pub fn insert_equipos(conn: &Connection, equipos: &[Equipo]) -> Result<usize> {
    let mut inserted = 0;

    for equipo in equipos {
        let hash = equipo.compute_idempotency_hash();

        let result = conn.execute(
            "INSERT INTO equipos (
                equipo_uuid, idempotency_hash, modelo, descripcion,
                numero_serie, estado, categoria, imagen, fecha_registro
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                equipo.id,
                hash,
                equipo.modelo,
                equipo.descripcion,
                equipo.numero_serie,
                equipo.estado,
                equipo.categoria,
                equipo.imagen,
                equipo.fecha_registro.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // Re-import of an existing record: skip silently
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(inserted)
}

/// Update an existing record's editable values by UUID
pub fn update_equipo(conn: &Connection, equipo: &Equipo) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE equipos SET
            modelo = ?1, descripcion = ?2, numero_serie = ?3,
            estado = ?4, categoria = ?5, imagen = ?6,
            idempotency_hash = ?7
         WHERE equipo_uuid = ?8",
        params![
            equipo.modelo,
            equipo.descripcion,
            equipo.numero_serie,
            equipo.estado,
            equipo.categoria,
            equipo.imagen,
            equipo.compute_idempotency_hash(),
            equipo.id,
        ],
    )?;

    Ok(changed > 0)
}

/// Delete a record by UUID
pub fn delete_equipo(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM equipos WHERE equipo_uuid = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn get_all_equipos(conn: &Connection) -> Result<Vec<Equipo>> {
    let mut stmt = conn.prepare(
        "SELECT equipo_uuid, modelo, descripcion, numero_serie,
                estado, categoria, imagen, fecha_registro
         FROM equipos ORDER BY id",
    )?;

    let rows = stmt.query_map([], row_to_equipo)?;

    let mut equipos = Vec::new();
    for equipo in rows {
        equipos.push(equipo?);
    }

    Ok(equipos)
}

pub fn get_equipo(conn: &Connection, id: &str) -> Result<Option<Equipo>> {
    let mut stmt = conn.prepare(
        "SELECT equipo_uuid, modelo, descripcion, numero_serie,
                estado, categoria, imagen, fecha_registro
         FROM equipos WHERE equipo_uuid = ?1",
    )?;

    let equipo = stmt.query_row(params![id], row_to_equipo).optional()?;
    Ok(equipo)
}

pub fn get_equipos_by_categoria(conn: &Connection, categoria: &str) -> Result<Vec<Equipo>> {
    let mut stmt = conn.prepare(
        "SELECT equipo_uuid, modelo, descripcion, numero_serie,
                estado, categoria, imagen, fecha_registro
         FROM equipos WHERE categoria = ?1 ORDER BY id",
    )?;

    let rows = stmt.query_map(params![categoria], row_to_equipo)?;

    let mut equipos = Vec::new();
    for equipo in rows {
        equipos.push(equipo?);
    }

    Ok(equipos)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM equipos", [], |row| row.get(0))?;
    Ok(count)
}

fn row_to_equipo(row: &rusqlite::Row) -> rusqlite::Result<Equipo> {
    let fecha_str: String = row.get(7)?;
    let fecha_registro = DateTime::parse_from_rfc3339(&fecha_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Equipo {
        id: row.get(0)?,
        modelo: row.get(1)?,
        descripcion: row.get(2)?,
        numero_serie: row.get(3)?,
        estado: row.get(4)?,
        categoria: row.get(5)?,
        imagen: row.get(6)?,
        fecha_registro,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn sample(modelo: &str, serie: &str, categoria: &str) -> Equipo {
        Equipo::new(
            modelo.to_string(),
            "Equipo de oficina".to_string(),
            serie.to_string(),
            "Operativo".to_string(),
            categoria.to_string(),
            None,
        )
    }

    #[test]
    fn test_insert_and_read_back() {
        let conn = test_conn();
        let equipos = vec![
            sample("MacBook Pro", "SN-001", "laptop"),
            sample("Dell U2720Q", "SN-002", "monitor"),
        ];

        let inserted = insert_equipos(&conn, &equipos).unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(verify_count(&conn).unwrap(), 2);

        let stored = get_all_equipos(&conn).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].modelo, "MacBook Pro");
        assert_eq!(stored[1].categoria, "monitor");
    }

    #[test]
    fn test_duplicate_import_is_skipped() {
        let conn = test_conn();
        let first = sample("MacBook Pro", "SN-001", "laptop");
        let mut second = sample("MacBook Pro", "SN-001", "laptop");
        second.id = uuid::Uuid::new_v4().to_string();

        insert_equipos(&conn, &[first]).unwrap();
        let inserted = insert_equipos(&conn, &[second]).unwrap();

        assert_eq!(inserted, 0);
        assert_eq!(verify_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_update_equipo() {
        let conn = test_conn();
        let mut equipo = sample("MacBook Pro", "SN-001", "laptop");
        insert_equipos(&conn, &[equipo.clone()]).unwrap();

        equipo.estado = "En reparación".to_string();
        equipo.categoria = "taller".to_string();
        assert!(update_equipo(&conn, &equipo).unwrap());

        let stored = get_equipo(&conn, &equipo.id).unwrap().unwrap();
        assert_eq!(stored.estado, "En reparación");
        assert_eq!(stored.categoria, "taller");
    }

    #[test]
    fn test_update_unknown_returns_false() {
        let conn = test_conn();
        let equipo = sample("MacBook Pro", "SN-001", "laptop");
        assert!(!update_equipo(&conn, &equipo).unwrap());
    }

    #[test]
    fn test_delete_equipo() {
        let conn = test_conn();
        let equipo = sample("MacBook Pro", "SN-001", "laptop");
        let id = equipo.id.clone();
        insert_equipos(&conn, &[equipo]).unwrap();

        assert!(delete_equipo(&conn, &id).unwrap());
        assert!(!delete_equipo(&conn, &id).unwrap());
        assert_eq!(verify_count(&conn).unwrap(), 0);
    }

    #[test]
    fn test_filter_by_categoria() {
        let conn = test_conn();
        let equipos = vec![
            sample("MacBook Pro", "SN-001", "laptop"),
            sample("ThinkPad X1", "SN-002", "laptop"),
            sample("Dell U2720Q", "SN-003", "monitor"),
        ];
        insert_equipos(&conn, &equipos).unwrap();

        let laptops = get_equipos_by_categoria(&conn, "laptop").unwrap();
        assert_eq!(laptops.len(), 2);

        let none = get_equipos_by_categoria(&conn, "impresora").unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_idempotency_hash_ignores_editable_fields() {
        let a = sample("MacBook Pro", "SN-001", "laptop");
        let mut b = sample("MacBook Pro", "SN-001", "monitor");
        b.estado = "Dañado".to_string();

        assert_eq!(a.compute_idempotency_hash(), b.compute_idempotency_hash());

        let c = sample("MacBook Pro", "SN-002", "laptop");
        assert_ne!(a.compute_idempotency_hash(), c.compute_idempotency_hash());
    }

    #[test]
    fn test_empty_categoria_roundtrips() {
        let conn = test_conn();
        let equipo = sample("Cable HDMI", "SN-009", "");
        insert_equipos(&conn, &[equipo]).unwrap();

        let stored = get_all_equipos(&conn).unwrap();
        assert_eq!(stored[0].categoria, "");
    }
}
