use serde::{Deserialize, Serialize};

/// Cart line handed over by the POS front end
///
/// The parked order cache only reads `price` and `quantity`; the remaining
/// fields travel along so a retrieved cart can be restored as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product ID
    pub product_id: String,
    /// Product name
    #[serde(default)]
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Quantity
    pub quantity: i32,
    /// Item note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CartItem {
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        quantity: i32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
