//! Shopping cart entities.

use serde::{Deserialize, Serialize};

/// A product as offered to the cart, before a quantity is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartProduct {
    /// Product identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: f64,
    /// Image path or URL.
    pub image: String,
}

impl CartProduct {
    /// Creates a product.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        price: f64,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            image: image.into(),
        }
    }
}

/// A line in the cart. Quantity is always at least 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier, unique within the cart.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: f64,
    /// Image path or URL.
    pub image: String,
    /// Number of units.
    pub quantity: u32,
}

impl CartItem {
    /// Creates a line with quantity 1.
    #[must_use]
    pub fn from_product(product: CartProduct) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            quantity: 1,
        }
    }

    /// Price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}
