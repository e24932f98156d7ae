use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::fields::{lenient_f64, lenient_opt_string, lenient_string};

/// One row of the sales-by-article report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "lenient_string")]
    pub descripcion: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub existencia: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fec_comprobante: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cantidad: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub costo_ultimo: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_costo: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub precio_lista: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub precio: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub por_descuento: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub diferencia: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rentabilidad: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rentabilidad_porc: f64,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub nro_telefono: Option<String>,
}

/// Column totals shown in the report footer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArticleTotals {
    pub total_costo: f64,
    pub diferencia: f64,
    pub total: f64,
    pub rentabilidad: f64,
}

impl ArticleTotals {
    pub fn from_articles(articles: &[Article]) -> Self {
        articles.iter().fold(Self::default(), |mut acc, art| {
            acc.total_costo += art.total_costo;
            acc.diferencia += art.diferencia;
            acc.total += art.total;
            acc.rentabilidad += art.rentabilidad;
            acc
        })
    }
}

/// Filter for the article report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub company: String,
    pub date: Option<NaiveDate>,
}

impl ArticleQuery {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Date in the `dd/mm/yyyy` form the report endpoint expects
    pub fn date_param(&self) -> Option<String> {
        self.date.map(|d| d.format("%d/%m/%Y").to_string())
    }
}
