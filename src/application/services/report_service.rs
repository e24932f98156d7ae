//! Sales-by-article report
//!
//! Rows are fetched fresh for every request and rendered as a plain-text
//! table with es-ES number formatting.

use std::sync::Arc;

use crate::application::errors::BotError;
use crate::domain::entities::{Article, ArticleQuery, ArticleTotals};
use crate::domain::traits::ArticleSource;

/// Fetched rows plus their totals
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleReport {
    pub articles: Vec<Article>,
    pub totals: ArticleTotals,
}

impl ArticleReport {
    pub fn new(articles: Vec<Article>) -> Self {
        let totals = ArticleTotals::from_articles(&articles);
        Self { articles, totals }
    }
}

/// Report service
pub struct ReportService {
    source: Arc<dyn ArticleSource>,
}

impl ReportService {
    pub fn new(source: Arc<dyn ArticleSource>) -> Self {
        Self { source }
    }

    /// Fetch a fresh report; nothing is kept between calls
    pub async fn fetch(&self, query: &ArticleQuery) -> Result<ArticleReport, BotError> {
        tracing::info!(
            "Fetching article report for company {} ({})",
            query.company,
            query.date_param().unwrap_or_else(|| "all dates".to_string())
        );
        let articles = self.source.fetch_articles(query).await?;
        Ok(ArticleReport::new(articles))
    }
}

const HEADERS: [&str; 14] = [
    "Descripcion",
    "Existencia",
    "Fecha Comprobante",
    "Cantidad",
    "Costo Ultimo",
    "Total Costo",
    "Precio Lista",
    "Precio",
    "% Descuento",
    "Diferencia",
    "Total",
    "Rentabilidad",
    "% Rentabilidad",
    "Nro Telefono",
];

/// Columns printed left-aligned
const TEXT_COLUMNS: [usize; 3] = [0, 2, 13];

fn row_cells(art: &Article) -> Vec<String> {
    vec![
        art.descripcion.clone(),
        format_quantity(art.existencia),
        art.fec_comprobante.clone(),
        format_quantity(art.cantidad),
        format_amount(art.costo_ultimo),
        format_amount(art.total_costo),
        format_amount(art.precio_lista),
        format_amount(art.precio),
        format!("{}%", format_quantity(art.por_descuento)),
        format_amount(art.diferencia),
        format_amount(art.total),
        format_amount(art.rentabilidad),
        format!("{}%", format_percent(art.rentabilidad_porc)),
        art.nro_telefono.clone().unwrap_or_else(|| "-".to_string()),
    ]
}

fn totals_cells(totals: &ArticleTotals) -> Vec<String> {
    let mut cells = vec![String::new(); HEADERS.len()];
    cells[0] = "TOTALES".to_string();
    cells[5] = format_amount(totals.total_costo);
    cells[9] = format_amount(totals.diferencia);
    cells[10] = format_amount(totals.total);
    cells[11] = format_amount(totals.rentabilidad);
    cells
}

/// Render the report as a text table with a totals row
pub fn render_table(report: &ArticleReport) -> String {
    if report.articles.is_empty() {
        return "No hay datos disponibles".to_string();
    }

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let body: Vec<Vec<String>> = report.articles.iter().map(row_cells).collect();
    let footer = totals_cells(&report.totals);

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in body.iter().chain(std::iter::once(&footer)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |row: &[String]| -> String {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if TEXT_COLUMNS.contains(&i) {
                    format!("{:<width$}", cell, width = widths[i])
                } else {
                    format!("{:>width$}", cell, width = widths[i])
                }
            })
            .collect();
        cells.join(" | ").trim_end().to_string()
    };
    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = Vec::with_capacity(body.len() + 4);
    lines.push(format_row(&header));
    lines.push(separator.clone());
    lines.extend(body.iter().map(|row| format_row(row)));
    lines.push(separator);
    lines.push(format_row(&footer));
    lines.join("\n")
}

/// Group an integer the es-ES way: `.` separators, only from five digits up
fn group_integer(digits: &str) -> String {
    if digits.len() < 5 {
        return digits.to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Fixed-decimal es-ES rendering; `trim` drops trailing fraction zeros
fn format_decimal(value: f64, decimals: usize, trim: bool) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (fixed.as_str(), ""),
    };
    let frac_part = if trim { frac_part.trim_end_matches('0') } else { frac_part };

    let mut out = group_integer(int_part);
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    let is_zero = out.chars().all(|c| c == '0' || c == ',' || c == '.');
    if value.is_sign_negative() && !is_zero {
        out.insert(0, '-');
    }
    out
}

/// Money column: rounded to a whole number
pub fn format_amount(value: f64) -> String {
    format_decimal(value.round(), 0, false)
}

/// Percentage column: always two decimals
pub fn format_percent(value: f64) -> String {
    format_decimal(value, 2, false)
}

/// Plain quantity: up to three decimals
pub fn format_quantity(value: f64) -> String {
    format_decimal(value, 3, true)
}
