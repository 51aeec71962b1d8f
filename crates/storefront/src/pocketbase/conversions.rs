//! Conversions from wire records to domain types.

use pocket_shop_core::{CategoryId, CollectionId, CurrencyCode, Price, Product, ProductId};
use rust_decimal::Decimal;

use super::BackendError;
use super::files::file_url;
use super::types::ProductRecord;

/// What a conversion needs to know beyond the record itself.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    pub api_base: String,
    pub product_collection: String,
    pub currency: CurrencyCode,
}

/// Convert a product record, resolving its image URL.
///
/// # Errors
///
/// Returns `BackendError::InvalidRecord` for negative or non-finite prices.
pub fn convert_product(
    record: ProductRecord,
    ctx: &ConversionContext,
) -> Result<Product, BackendError> {
    let price = convert_price(&record, ctx.currency)?;

    // Files are addressed by collection id when the record carries one.
    let collection = record
        .collection_id
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(&ctx.product_collection);
    let image = record.primary_image().map(str::to_owned);
    let image_url = image
        .as_deref()
        .map(|name| file_url(&ctx.api_base, collection, &record.id, name));

    Ok(Product {
        id: ProductId::new(record.id),
        name: record.name,
        description: record.description,
        price,
        stock: record.stock,
        image,
        image_url,
        category: record
            .category
            .filter(|c| !c.is_empty())
            .map(CategoryId::new),
        collection_id: record
            .collection_id
            .filter(|c| !c.is_empty())
            .map(CollectionId::new),
        collection_name: record.collection_name.filter(|c| !c.is_empty()),
    })
}

/// Convert a list of product records, failing on the first bad one.
///
/// # Errors
///
/// See [`convert_product`].
pub fn convert_products(
    records: Vec<ProductRecord>,
    ctx: &ConversionContext,
) -> Result<Vec<Product>, BackendError> {
    records
        .into_iter()
        .map(|record| convert_product(record, ctx))
        .collect()
}

fn convert_price(record: &ProductRecord, currency: CurrencyCode) -> Result<Price, BackendError> {
    let invalid = |reason: String| BackendError::InvalidRecord {
        id: record.id.clone(),
        reason,
    };

    if !record.price.is_finite() || record.price < 0.0 {
        return Err(invalid(format!("price {} out of range", record.price)));
    }
    let amount = Decimal::try_from(record.price).map_err(|e| invalid(e.to_string()))?;
    Ok(Price::new(amount.round_dp(2), currency))
}
