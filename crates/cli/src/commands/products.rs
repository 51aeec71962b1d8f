//! Catalog browsing commands.
//!
//! # Usage
//!
//! ```bash
//! ps-cli products list
//! ps-cli products show <ID>
//! ps-cli products search --query lamp --category <CATEGORY_ID>
//! ```

use std::io::Write;

use pocket_shop_core::ProductId;
use pocket_shop_storefront::AppState;
use pocket_shop_storefront::pocketbase::SearchParams;

use super::CommandError;
use super::output::{write_product_detail, write_product_table};

/// Print every product in the catalog.
pub async fn list(state: &AppState, out: &mut impl Write) -> Result<(), CommandError> {
    let products = state.client().list_products().await?;
    tracing::info!(count = products.len(), "Listed products");
    write_product_table(out, &products)?;
    Ok(())
}

/// Print one product.
pub async fn show(
    state: &AppState,
    id: &ProductId,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let product = state.client().get_product(id).await?;
    write_product_detail(out, &product)?;
    Ok(())
}

/// Print one page of search results.
pub async fn search(
    state: &AppState,
    params: &SearchParams,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let results = state.client().search_products(params).await?;
    write_product_table(out, &results.items)?;
    writeln!(
        out,
        "page {} of {} ({} match(es))",
        results.current_page, results.total_pages, results.total_items
    )?;
    Ok(())
}
