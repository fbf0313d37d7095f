//! Bulk Update Integration Tests

mod common;

use common::*;
use quarry_core::query_builder::{field, Selector};
use quarry_core::specification::Specification;
use quarry_core::{ContractError, EngineError, PropertyUpdate, RepositoryError};

fn discontinued() -> Specification<Product> {
    Specification::new().filter(field::<Product, bool>("discontinued").equals(true))
}

#[tokio::test]
async fn test_zero_descriptors_skip_the_engine() {
    let repository = repository(5);

    let affected = repository.update_many(Some(&discontinued()), &[]).await.unwrap();

    assert_eq!(affected, 0);
    assert_eq!(repository.engine().stats().round_trips(), 0);
}

#[tokio::test]
async fn test_constant_update_applies_to_matching_rows_only() {
    let repository = repository(10);
    let updates = [PropertyUpdate::set(field::<Product, i64>("stock"), 0).unwrap()];

    let affected = repository
        .update_many(Some(&discontinued()), &updates)
        .await
        .unwrap();

    assert_eq!(affected, 2);
    assert_eq!(repository.engine().stats().updates(), 1);

    for row in repository.engine().rows() {
        let expected = if row.discontinued { 0 } else { product(row.id).stock };
        assert_eq!(row.stock, expected, "product {}", row.id);
    }
}

#[tokio::test]
async fn test_computed_values_read_the_row_before_update() {
    let repository = repository(3);
    let price = field::<Product, f64>("price");
    let stock = field::<Product, i64>("stock");

    let updates = [
        PropertyUpdate::compute(price.clone(), price.times(Selector::constant(2.0))).unwrap(),
        PropertyUpdate::compute(stock.clone(), stock.plus(Selector::constant(10))).unwrap(),
        // Sees the original stock, not the value assigned above
        PropertyUpdate::compute(
            field::<Product, String>("name"),
            field::<Product, String>("name")
                .concat(Selector::constant("#".to_string()))
                .concat(field::<Product, i64>("stock").convert::<String>()),
        )
        .unwrap(),
    ];

    let affected = repository.update_many(None, &updates).await.unwrap();
    assert_eq!(affected, 3);

    for row in repository.engine().rows() {
        let original = product(row.id);
        assert_eq!(row.price, original.price * 2.0);
        assert_eq!(row.stock, original.stock + 10);
        assert_eq!(row.name, format!("{}#{}", original.name, original.stock));
    }
}

#[tokio::test]
async fn test_later_descriptor_for_same_property_wins() {
    let repository = repository(4);
    let updates = [
        PropertyUpdate::set(field::<Product, Option<String>>("category_name"), Some("a".to_string()))
            .unwrap(),
        PropertyUpdate::set(field::<Product, Option<String>>("category_name"), None).unwrap(),
    ];

    repository.update_many(None, &updates).await.unwrap();
    assert!(repository
        .engine()
        .rows()
        .iter()
        .all(|row| row.category_name.is_none()));
}

#[tokio::test]
async fn test_widened_selector_coerces_to_declared_type() {
    let repository = repository(4);
    let updates = [PropertyUpdate::set(field::<Product, i64>("stock").convert::<f64>(), 7.0).unwrap()];

    repository.update_many(None, &updates).await.unwrap();
    assert!(repository.engine().rows().iter().all(|row| row.stock == 7));
}

#[tokio::test]
async fn test_failed_coercion_leaves_rows_untouched() {
    let repository = repository(4);
    let before = repository.engine().rows();
    let updates = [PropertyUpdate::set(field::<Product, i64>("stock").convert::<f64>(), 2.5).unwrap()];

    let error = repository.update_many(None, &updates).await.unwrap_err();
    assert!(matches!(
        error,
        RepositoryError::Engine(EngineError::Conversion(_))
    ));
    assert_eq!(repository.engine().rows(), before);
}

#[test]
fn test_invalid_property_selectors() {
    let computed = field::<Product, i64>("stock").plus(Selector::constant(1));
    assert!(matches!(
        PropertyUpdate::set(computed, 3),
        Err(ContractError::InvalidPropertySelector { .. })
    ));

    let navigation = Selector::<Product, String>::from_expr(quarry_core::query_builder::Expr::path(&[
        "category", "name",
    ]));
    assert!(matches!(
        PropertyUpdate::set(navigation, "x".to_string()),
        Err(ContractError::InvalidPropertySelector { .. })
    ));

    let double_conversion = field::<Product, i64>("stock").convert::<f64>().convert::<String>();
    assert!(matches!(
        PropertyUpdate::set(double_conversion, "3".to_string()),
        Err(ContractError::InvalidPropertySelector { .. })
    ));
}

#[test]
fn test_descriptor_type_mismatch() {
    let error = PropertyUpdate::set(field::<Product, f64>("stock"), 1.0).unwrap_err();
    assert_eq!(
        error,
        ContractError::DescriptorTypeMismatch {
            property: "stock".to_string(),
            declared: "int".to_string(),
            supplied: "float".to_string(),
        }
    );
}

#[tokio::test]
async fn test_update_inside_rolled_back_transaction() {
    let repository = repository(5);
    let before = repository.engine().rows();
    let updates = [PropertyUpdate::set(field::<Product, bool>("discontinued"), true).unwrap()];

    repository.begin().await.unwrap();
    assert_eq!(repository.update_many(None, &updates).await.unwrap(), 5);
    repository.rollback().await.unwrap();

    assert_eq!(repository.engine().rows(), before);
}
