use quarry_core::database::MemoryEngine;
use quarry_core::repository::Repository;
use quarry_core::RepositoryConfig;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub category_id: i64,
    pub category_name: Option<String>,
    pub discontinued: bool,
}

quarry_core::impl_entity!(Product, "products" {
    id: i64,
    name: String,
    price: f64,
    stock: i64,
    category_id: i64,
    category_name: Option<String>,
    discontinued: bool,
});

/// Navigation target for `Product::category`
pub struct Category;

pub type ProductRepository = Repository<Product, MemoryEngine<Product>>;

pub const CATEGORIES: [&str; 3] = ["garden", "kitchen", "office"];

/// Deterministic product for a given id
pub fn product(id: i64) -> Product {
    Product {
        id,
        name: format!("product-{id:02}"),
        price: (id * 3 % 7) as f64 + 0.5,
        stock: id % 4,
        category_id: id % 3,
        category_name: None,
        discontinued: id % 5 == 0,
    }
}

pub fn products(ids: impl IntoIterator<Item = i64>) -> Vec<Product> {
    ids.into_iter().map(product).collect()
}

/// Engine seeded with `rows`, with the `category` include registered
pub fn engine_with(rows: Vec<Product>) -> Arc<MemoryEngine<Product>> {
    let engine = Arc::new(MemoryEngine::with_rows(rows));
    engine.register_include("category", |product: &mut Product| {
        let index = usize::try_from(product.category_id).unwrap_or(0) % CATEGORIES.len();
        product.category_name = Some(CATEGORIES[index].to_string());
        Ok(())
    });
    engine
}

/// Repository over products `1..=count`
pub fn repository(count: i64) -> ProductRepository {
    Repository::new(engine_with(products(1..=count)))
}

pub fn repository_with_config(count: i64, config: RepositoryConfig) -> ProductRepository {
    Repository::with_config(engine_with(products(1..=count)), config)
}

pub fn ids(items: &[Product]) -> Vec<i64> {
    items.iter().map(|p| p.id).collect()
}
