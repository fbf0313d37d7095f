mod common;

use common::*;
use proptest::prelude::*;
use quarry_core::query_builder::{field, PagingOptions};
use quarry_core::repository::Repository;
use quarry_core::specification::Specification;

fn selected(rows: &[Product], spec: &Specification<Product>) -> Vec<i64> {
    let repository = Repository::new(engine_with(rows.to_vec()));
    tokio_test::block_on(repository.find_many(Some(spec)))
        .map(|items| ids(&items))
        .unwrap()
}

fn sorted_ids(rows: &[Product]) -> Vec<i64> {
    let mut ids = ids(rows);
    ids.sort_unstable();
    ids
}

proptest! {
    /// Property: `a.and(b)` selects exactly the rows both operands select
    #[test]
    fn intersection_law(rows in products_strategy(), a in criteria_strategy(), b in criteria_strategy()) {
        let left = selected(&rows, &a);
        let right = selected(&rows, &b);
        let expected: Vec<i64> = left.iter().copied().filter(|id| right.contains(id)).collect();
        prop_assert_eq!(selected(&rows, &a.and(&b)), expected);
    }

    /// Property: `a.or(b)` selects exactly the rows either operand selects
    #[test]
    fn union_law(rows in products_strategy(), a in criteria_strategy(), b in criteria_strategy()) {
        let left = selected(&rows, &a);
        let right = selected(&rows, &b);
        let expected: Vec<i64> = ids(&rows)
            .into_iter()
            .filter(|id| left.contains(id) || right.contains(id))
            .collect();
        prop_assert_eq!(selected(&rows, &a.or(&b)), expected);
    }

    /// Property: `a.not()` selects exactly the rows `a` does not
    #[test]
    fn complement_law(rows in products_strategy(), a in criteria_strategy()) {
        let matched = selected(&rows, &a);
        let expected: Vec<i64> = ids(&rows)
            .into_iter()
            .filter(|id| !matched.contains(id))
            .collect();
        prop_assert_eq!(selected(&rows, &a.not()), expected);
    }

    /// Property: following keyset cursors visits every row once, in key order
    #[test]
    fn keyset_walk_is_exhaustive(rows in products_strategy(), page_size in page_size_strategy()) {
        let repository = Repository::new(engine_with(rows.clone()));
        let spec = Specification::new().order_by(field::<Product, i64>("id"));

        let mut visited = Vec::new();
        let mut options = PagingOptions::keyset(page_size);
        let mut pages = 0;
        loop {
            let page = tokio_test::block_on(repository.get_paged(&options, Some(&spec))).unwrap();
            pages += 1;
            prop_assert!(page.items.len() <= page_size as usize);
            visited.extend(ids(&page.items));

            match (page.has_next_page, page.last_key_value) {
                (true, Some(cursor)) => {
                    options = PagingOptions::keyset(page_size).after(cursor).with_page_number(pages + 1);
                }
                _ => break,
            }
        }

        prop_assert_eq!(visited, sorted_ids(&rows));
        let expected_pages = rows.len().div_ceil(page_size as usize).max(1);
        prop_assert_eq!(pages as usize, expected_pages);
    }

    /// Property: requesting the same offset page twice yields the same page
    #[test]
    fn offset_pages_are_idempotent(
        rows in products_strategy(),
        page_number in 1u32..6,
        page_size in page_size_strategy(),
    ) {
        let repository = Repository::new(engine_with(rows));
        let spec = Specification::new().order_by_descending(field::<Product, String>("name"));
        let options = PagingOptions::offset(page_number, page_size);

        let first = tokio_test::block_on(repository.get_paged(&options, Some(&spec))).unwrap();
        let second = tokio_test::block_on(repository.get_paged(&options, Some(&spec))).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: consecutive offset pages tile the ordered result
    #[test]
    fn offset_pages_tile_the_result(rows in products_strategy(), page_size in page_size_strategy()) {
        let repository = Repository::new(engine_with(rows.clone()));
        let spec = Specification::new().order_by(field::<Product, i64>("id"));

        let mut collected = Vec::new();
        let mut page_number = 1;
        loop {
            let options = PagingOptions::offset(page_number, page_size);
            let page = tokio_test::block_on(repository.get_paged(&options, Some(&spec))).unwrap();
            prop_assert_eq!(page.total_count, Some(rows.len() as u64));
            collected.extend(ids(&page.items));
            if !page.has_next_page {
                break;
            }
            page_number += 1;
        }

        prop_assert_eq!(collected, sorted_ids(&rows));
    }

    /// Property: shaping the same specification twice yields the same plan
    #[test]
    fn shaping_is_deterministic(a in criteria_strategy(), b in criteria_strategy()) {
        let repository = Repository::new(engine_with(Vec::new()));
        let spec = a.or(&b).include_path("category").order_by(field::<Product, i64>("id"));

        let first = repository.shaped(Some(&spec)).plan().describe();
        let second = repository.shaped(Some(&spec)).plan().describe();
        prop_assert_eq!(first, second);
    }
}
