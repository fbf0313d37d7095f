use super::fixtures::{product, Product};
use proptest::prelude::*;
use quarry_core::query_builder::field;
use quarry_core::specification::Specification;

/// Distinct product ids in random insertion order
pub fn id_set_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::hash_set(1i64..500, 0..40)
        .prop_map(|ids| ids.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

pub fn products_strategy() -> impl Strategy<Value = Vec<Product>> {
    id_set_strategy().prop_map(|ids| ids.into_iter().map(product).collect())
}

/// Criteria-only specifications over the generated product fields
pub fn criteria_strategy() -> impl Strategy<Value = Specification<Product>> {
    prop_oneof![
        (0i64..4).prop_map(|stock| Specification::new().filter(field::<Product, i64>("stock").gt(stock))),
        (0i64..3).prop_map(|category| {
            Specification::new().filter(field::<Product, i64>("category_id").equals(category))
        }),
        (0.0f64..8.0).prop_map(|price| Specification::new().filter(field::<Product, f64>("price").le(price))),
        any::<bool>().prop_map(|flag| {
            Specification::new().filter(field::<Product, bool>("discontinued").equals(flag))
        }),
        Just(Specification::new()),
    ]
}

pub fn page_size_strategy() -> impl Strategy<Value = u32> {
    1u32..8
}
