//! Product record model

use serde::{Deserialize, Serialize};

/// One product extracted from a result page
///
/// Every optional field stays `None` when the markup does not carry it;
/// nothing is replaced by a placeholder. Absent fields serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub brand: Option<String>,

    #[serde(rename = "product_name")]
    pub name: Option<String>,

    /// Price exactly as published in the markup
    pub price: Option<String>,

    pub in_stock: bool,

    pub product_id: Option<String>,

    pub product_type: Option<String>,

    /// Image addresses in document order
    #[serde(rename = "images")]
    pub image_urls: Vec<String>,
}
