use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, DomainResult, Entity, ProductId};

/// A catalog product.
///
/// `price` is a plain number in the shop currency. Negative prices are
/// accepted (discount and credit lines are stored as products); only values
/// the store cannot represent (NaN, infinities) are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: Option<ProductId>,
    name: String,
    price: f64,
    category: String,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: None,
            name: name.into(),
            price: check_price(price)?,
            category: category.into(),
        })
    }

    pub fn with_id(
        id: ProductId,
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> DomainResult<Self> {
        let mut product = Self::new(name, price, category)?;
        product.id = Some(id);
        Ok(product)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn set_price(&mut self, price: f64) -> DomainResult<()> {
        self.price = check_price(price)?;
        Ok(())
    }
}

fn check_price(price: f64) -> DomainResult<f64> {
    if !price.is_finite() {
        return Err(DomainError::validation(
            "price",
            format!("must be a finite number, got {price}"),
        ));
    }
    Ok(price)
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Option<ProductId> {
        self.id
    }

    fn id_slot(&mut self) -> &mut Option<ProductId> {
        &mut self.id
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.id {
            Some(id) => write!(f, "Product {id}: ")?,
            None => f.write_str("Product (new): ")?,
        }
        write!(f, "{} ({}) - {:.2}", self.name, self.category, self.price)
    }
}
