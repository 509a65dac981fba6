// 📄 Statistics Report - shareable export of the category tally
// Renders the same label/count/color/percentage values the statistics screen
// shows, as a self-contained HTML document or plain text.

use crate::stats::CategoryTally;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const REPORT_CSS: &str = r#"
body { font-family: -apple-system, "Segoe UI", sans-serif; margin: 40px; color: #1c2733; }
h1 { font-size: 22px; margin-bottom: 4px; }
.meta { color: #5b6678; font-size: 13px; margin-bottom: 24px; }
table { border-collapse: collapse; width: 100%; max-width: 640px; }
th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid #dde3ea; font-size: 14px; }
th { color: #5b6678; text-transform: uppercase; font-size: 11px; letter-spacing: 0.04em; }
.swatch { display: inline-block; width: 12px; height: 12px; border-radius: 3px; margin-right: 8px; vertical-align: baseline; }
.total { margin-top: 16px; font-weight: 600; }
.empty { color: #5b6678; font-style: italic; margin-top: 24px; }
"#;

// ============================================================================
// REPORT DATA
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub label: String,
    pub count: usize,
    pub color: String,
    pub percentage: f64,
}

/// Frozen snapshot of one tally, ready to render and share.
/// A report with zero categorized records renders an explicit
/// "Sin datos" document instead of dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub entries: Vec<ReportEntry>,
    pub total: usize,
    pub generated_at: DateTime<Utc>,
}

impl StatsReport {
    pub fn from_tally(tally: &CategoryTally) -> Self {
        let entries = tally
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| ReportEntry {
                label: label.clone(),
                count: tally.counts[i],
                color: tally.color_for(label).unwrap_or("#C9CBCF").to_string(),
                percentage: tally.percentage(i).unwrap_or(0.0),
            })
            .collect();

        StatsReport {
            entries,
            total: tally.total(),
            generated_at: Utc::now(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.total > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Estadísticas por categoría: {} equipos en {} categorías",
            self.total,
            self.entries.len()
        )
    }

    /// Plain-text rendering (one legend line per category)
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Estadísticas de Equipos por Categoría\n");
        out.push_str(&format!(
            "Generado: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        if !self.has_data() {
            out.push_str("Sin datos: no hay equipos registrados con categoría.\n");
            return out;
        }

        for entry in &self.entries {
            out.push_str(&format!(
                "{}: {} equipos ({:.1}%)\n",
                entry.label, entry.count, entry.percentage
            ));
        }
        out.push_str(&format!("\nTotal: {} equipos\n", self.total));
        out
    }

    /// Self-contained HTML document with the legend colors inlined
    pub fn to_html(&self) -> String {
        let mut body = String::new();

        if self.has_data() {
            body.push_str("<table>\n<tr><th>Categoría</th><th>Equipos</th><th>Porcentaje</th></tr>\n");
            for entry in &self.entries {
                body.push_str(&format!(
                    "<tr><td><span class=\"swatch\" style=\"background:{}\"></span>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
                    entry.color,
                    escape_html(&entry.label),
                    entry.count,
                    entry.percentage,
                ));
            }
            body.push_str("</table>\n");
            body.push_str(&format!(
                "<p class=\"total\">Total: {} equipos</p>\n",
                self.total
            ));
        } else {
            body.push_str(
                "<p class=\"empty\">Sin datos: no hay equipos registrados con categoría.</p>\n",
            );
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Estadísticas de Equipos</title>\n<style>{REPORT_CSS}</style>\n</head>\n<body>\n\
             <h1>Estadísticas de Equipos por Categoría</h1>\n\
             <p class=\"meta\">Generado: {}</p>\n{body}</body>\n</html>\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
        )
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Equipo;
    use crate::stats::CategoryAggregator;

    fn equipo(categoria: &str) -> Equipo {
        Equipo::new(
            "MacBook Pro".to_string(),
            "Portátil".to_string(),
            "SN-001".to_string(),
            "Operativo".to_string(),
            categoria.to_string(),
            None,
        )
    }

    fn report_for(categorias: &[&str]) -> StatsReport {
        let records: Vec<Equipo> = categorias.iter().map(|c| equipo(c)).collect();
        let mut aggregator = CategoryAggregator::new();
        StatsReport::from_tally(&aggregator.recompute(&records))
    }

    #[test]
    fn test_entries_carry_tally_values() {
        let report = report_for(&["laptop", "laptop", "monitor"]);

        assert_eq!(report.total, 3);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].label, "laptop");
        assert_eq!(report.entries[0].count, 2);
        assert_eq!(report.entries[0].color, "#FF6384");
        assert!((report.entries[0].percentage - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_no_data_report() {
        let report = report_for(&["", ""]);

        assert!(!report.has_data());
        assert!(report.to_text().contains("Sin datos"));
        assert!(report.to_html().contains("Sin datos"));
    }

    #[test]
    fn test_text_rendering_uses_legend_shape() {
        let report = report_for(&["laptop", "monitor", "laptop", "laptop"]);
        let text = report.to_text();

        assert!(text.contains("laptop: 3 equipos (75.0%)"));
        assert!(text.contains("monitor: 1 equipos (25.0%)"));
        assert!(text.contains("Total: 4 equipos"));
    }

    #[test]
    fn test_html_contains_colors_and_labels() {
        let report = report_for(&["laptop", "monitor"]);
        let html = report.to_html();

        assert!(html.contains("background:#FF6384"));
        assert!(html.contains("background:#36A2EB"));
        assert!(html.contains("<td><span class=\"swatch\""));
        assert!(html.contains("Total: 2 equipos"));
    }

    #[test]
    fn test_html_escapes_labels() {
        let report = report_for(&["<script>"]);
        let html = report.to_html();

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_summary() {
        let report = report_for(&["laptop", "laptop", "monitor"]);
        assert_eq!(
            report.summary(),
            "Estadísticas por categoría: 3 equipos en 2 categorías"
        );
    }
}
