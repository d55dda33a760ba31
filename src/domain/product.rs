/// A catalog entry as listed by the products endpoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub interval: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProductListing {
    pub products: Vec<Product>,
}

impl ProductListing {
    pub fn ids(&self) -> Vec<&str> {
        self.products.iter().map(|p| p.id.as_str()).collect()
    }
}
