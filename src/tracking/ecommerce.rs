use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::utils::error::Error;

/// A single line item in an ecommerce order or cart.
#[derive(Debug, Clone, PartialEq)]
pub struct EcommerceItem {
    pub sku: String,
    pub name: String,
    pub category: Vec<String>,
    pub price: f64,
    pub quantity: u64,
}

impl EcommerceItem {
    /// Builds a line item, validating that all required fields are present.
    pub fn new<S, N>(sku: S, name: N, category: Vec<String>, price: f64, quantity: u64) -> Result<Self, Error>
    where
        S: Into<String>,
        N: Into<String>,
    {
        let sku = sku.into();
        let name = name.into();
        if sku.is_empty() {
            return Err(Error::InvalidParameter("ecommerce item requires a sku".to_string()));
        }
        if name.is_empty() {
            return Err(Error::InvalidParameter("ecommerce item requires a name".to_string()));
        }
        if category.is_empty() {
            return Err(Error::InvalidParameter("ecommerce item requires a category".to_string()));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(Error::InvalidParameter(format!("ecommerce item requires a valid price, {} given", price)));
        }
        if quantity == 0 {
            return Err(Error::InvalidParameter("ecommerce item requires a quantity of at least 1".to_string()));
        }
        Ok(EcommerceItem {
            sku,
            name,
            category,
            price,
            quantity,
        })
    }
}

// The endpoint expects each item as a (sku, name, category, price, quantity)
// tuple inside the ec_items JSON array.
impl Serialize for EcommerceItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(5)?;
        tuple.serialize_element(&self.sku)?;
        tuple.serialize_element(&self.name)?;
        tuple.serialize_element(&self.category)?;
        tuple.serialize_element(&self.price)?;
        tuple.serialize_element(&self.quantity)?;
        tuple.end()
    }
}

/// Monetary totals for an ecommerce order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EcommerceTotals {
    pub grand_total: f64,
    pub sub_total: Option<f64>,
    pub tax: Option<f64>,
    pub shipping: Option<f64>,
    pub discount: Option<f64>,
}

impl EcommerceTotals {
    pub fn new(grand_total: f64) -> Self {
        EcommerceTotals {
            grand_total,
            ..Default::default()
        }
    }

    pub fn sub_total(mut self, sub_total: f64) -> Self {
        self.sub_total = Some(sub_total);
        self
    }

    pub fn tax(mut self, tax: f64) -> Self {
        self.tax = Some(tax);
        self
    }

    pub fn shipping(mut self, shipping: f64) -> Self {
        self.shipping = Some(shipping);
        self
    }

    pub fn discount(mut self, discount: f64) -> Self {
        self.discount = Some(discount);
        self
    }
}

/// Pending ecommerce action, serialized as a goal 0 conversion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EcommerceBlock {
    Order { order_id: String, totals: EcommerceTotals },
    CartUpdate { grand_total: f64 },
}
