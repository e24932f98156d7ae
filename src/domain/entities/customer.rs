use serde::{Deserialize, Serialize};

use super::fields::{lenient_f64, lenient_string};

/// Customer record held by the remote directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub nombre: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub telefono: String,
    /// Current discount percentage
    #[serde(default, deserialize_with = "lenient_f64")]
    pub descuento: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub estado: String,
}
