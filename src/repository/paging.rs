//! Offset and keyset paging.
//!
//! Offset pages cost a count and a fetch. Keyset pages and unpaged reads are a
//! single fetch. Every contract check runs before the first engine call.

use super::Repository;
use crate::database::DataEngine;
use crate::error::{ContractError, EngineError, Result};
use crate::model::{Entity, Value};
use crate::query_builder::{
    CompareOp, Expr, PagedResult, PagingOptions, PagingStrategy, Predicate, QueryShape,
};
use crate::specification::{Order, Specification};
use tracing::{debug, instrument};

impl<T: Entity, E: DataEngine<T>> Repository<T, E> {
    #[instrument(
        skip(self, options, specification),
        fields(table = T::TABLE, strategy = ?options.strategy, page_size = options.page_size)
    )]
    pub async fn get_paged(
        &self,
        options: &PagingOptions,
        specification: Option<&Specification<T>>,
    ) -> Result<PagedResult<T>> {
        options
            .validate(self.config.max_page_size)
            .inspect_err(|error| debug!(error = %error, "Paging request rejected"))?;

        let unconstrained = Specification::UNCONSTRAINED;
        let specification = specification.unwrap_or(&unconstrained);
        let order = specification.order();

        if options.skip_pagination {
            let items = self.shaped(Some(specification)).to_vec().await?;
            let last_key_value = last_key_value(order, &items)?;
            let len = items.len();
            debug!(rows = len, "Unpaged read completed");
            return Ok(PagedResult {
                items,
                total_count: Some(len as u64),
                current_page: 1,
                page_size: u32::try_from(len).unwrap_or(u32::MAX),
                last_key_value,
                has_next_page: false,
            });
        }

        match options.strategy {
            PagingStrategy::Offset => self.offset_page(options, specification).await,
            PagingStrategy::Keyset => self.keyset_page(options, specification).await,
        }
    }

    async fn offset_page(
        &self,
        options: &PagingOptions,
        specification: &Specification<T>,
    ) -> Result<PagedResult<T>> {
        let total = self.shaped(Some(specification)).count().await?;
        let skip = usize::try_from(options.offset_rows()).unwrap_or(usize::MAX);
        let items = self
            .shaped(Some(specification))
            .skip(skip)
            .take(options.page_size as usize)
            .to_vec()
            .await?;

        let has_next_page = u64::from(options.page_number) * u64::from(options.page_size) < total;
        let last_key_value = last_key_value(specification.order(), &items)?;

        debug!(
            page_number = options.page_number,
            total = total,
            rows = items.len(),
            has_next_page = has_next_page,
            "Offset page completed"
        );

        Ok(PagedResult {
            items,
            total_count: Some(total),
            current_page: options.page_number,
            page_size: options.page_size,
            last_key_value,
            has_next_page,
        })
    }

    async fn keyset_page(
        &self,
        options: &PagingOptions,
        specification: &Specification<T>,
    ) -> Result<PagedResult<T>> {
        let order = specification.order();
        let cursor_filter = keyset_filter::<T>(order, options.after_value.as_ref())
            .inspect_err(|error| debug!(error = %error, "Keyset request rejected"))?;

        let mut query = self.shaped(Some(specification));
        if let Some(predicate) = cursor_filter {
            query = query.filter(predicate);
        }

        let page_size = options.page_size as usize;
        let mut items = query.take(page_size.saturating_add(1)).to_vec().await?;
        let has_next_page = items.len() > page_size;
        items.truncate(page_size);

        let last_key_value = last_key_value(order, &items)?;
        let current_page = if options.after_value.is_some() {
            options.page_number
        } else {
            1
        };

        debug!(
            current_page = current_page,
            rows = items.len(),
            has_next_page = has_next_page,
            "Keyset page completed"
        );

        Ok(PagedResult {
            items,
            total_count: None,
            current_page,
            page_size: options.page_size,
            last_key_value,
            has_next_page,
        })
    }
}

/// Predicate selecting rows past the cursor, or `None` on the first page.
///
/// The ordering key must be a non-nullable direct member read, optionally
/// widened once. Null keys never satisfy the cursor comparison, so a nullable
/// key would leave rows unreachable. The cursor is converted to the key's
/// kind before comparison.
fn keyset_filter<T: Entity>(
    order: &Order,
    after_value: Option<&Value>,
) -> std::result::Result<Option<Predicate>, ContractError> {
    let (key, op) = match order {
        Order::Unordered => return Err(ContractError::KeysetRequiresOrdering),
        Order::Ascending(key) => (key, CompareOp::Gt),
        Order::Descending(key) => (key, CompareOp::Lt),
    };

    let access = key
        .member_access()
        .ok_or_else(|| ContractError::UnsupportedKeysetOrdering {
            expression: key.to_string(),
        })?;
    let declared = T::field(access.name).ok_or_else(|| ContractError::UnknownProperty {
        entity: T::TABLE,
        property: access.name.to_string(),
    })?;
    let widening = access
        .converted_to
        .map_or(true, |converted| declared.kind.widens_to(converted));
    if declared.nullable || !widening {
        return Err(ContractError::UnsupportedKeysetOrdering {
            expression: key.to_string(),
        });
    }
    let target = access.converted_to.unwrap_or(declared.kind);

    let Some(after) = after_value else {
        return Ok(None);
    };

    if after.is_null() {
        return Err(ContractError::CursorConversion {
            value: after.to_string(),
            target,
            reason: "cursor value is null".to_string(),
        });
    }

    let cursor = after
        .convert_to(target)
        .map_err(|e| ContractError::CursorConversion {
            value: after.to_string(),
            target,
            reason: e.to_string(),
        })?;

    Ok(Some(Predicate::Compare {
        left: key.clone(),
        op,
        right: Expr::Constant(cursor),
    }))
}

/// Ordering-key value of the last item, when ordered and non-empty
fn last_key_value<T: Entity>(order: &Order, items: &[T]) -> Result<Option<Value>> {
    match (order.key(), items.last()) {
        (Some(key), Some(last)) => Ok(Some(key.evaluate(last).map_err(EngineError::from)?)),
        _ => Ok(None),
    }
}
