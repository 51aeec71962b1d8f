//! Plain-text rendering of catalog, cart and order data.

use std::io::{self, Write};

use pocket_shop_core::{Cart, Product};
use pocket_shop_storefront::pocketbase::OrderRecord;
use pocket_shop_storefront::services::OrderConfirmation;

/// One product per line: id, price, name.
pub fn write_product_row(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(
        out,
        "{:<16} {:>10}  {}",
        product.id,
        product.price.display(),
        product.name
    )
}

pub fn write_product_table(out: &mut impl Write, products: &[Product]) -> io::Result<()> {
    if products.is_empty() {
        return writeln!(out, "No products.");
    }
    for product in products {
        write_product_row(out, product)?;
    }
    Ok(())
}

/// Full product details.
pub fn write_product_detail(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(out, "{}", product.name)?;
    writeln!(out, "  id:     {}", product.id)?;
    writeln!(out, "  price:  {}", product.price.display())?;
    let stock = if product.in_stock() {
        product.stock.to_string()
    } else {
        "out of stock".to_string()
    };
    writeln!(out, "  stock:  {stock}")?;
    if let Some(url) = &product.image_url {
        writeln!(out, "  image:  {url}")?;
    }
    if !product.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", product.description)?;
    }
    Ok(())
}

/// Cart lines in order, followed by totals.
pub fn write_cart(out: &mut impl Write, cart: &Cart) -> io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Cart is empty.");
    }
    for line in cart.iter() {
        let total = line
            .line_total()
            .map_or_else(|| "-".to_string(), |price| price.display());
        writeln!(
            out,
            "{:>4} x {:<24} {:>10}",
            line.quantity(),
            line.product().name,
            total
        )?;
    }
    match cart.subtotal() {
        Some(subtotal) => writeln!(
            out,
            "{} item(s), subtotal {}",
            cart.total_quantity(),
            subtotal.display()
        ),
        None => writeln!(
            out,
            "{} item(s), subtotal unavailable",
            cart.total_quantity()
        ),
    }
}

pub fn write_confirmation(
    out: &mut impl Write,
    confirmation: &OrderConfirmation,
) -> io::Result<()> {
    let message = if confirmation.message.is_empty() {
        "Order placed"
    } else {
        confirmation.message.as_str()
    };
    writeln!(
        out,
        "{message} at {} ({} item(s))",
        confirmation.placed_at.format("%Y-%m-%d %H:%M UTC"),
        confirmation.total_quantity
    )
}

pub fn write_orders(out: &mut impl Write, orders: &[OrderRecord]) -> io::Result<()> {
    if orders.is_empty() {
        return writeln!(out, "No orders yet.");
    }
    for order in orders {
        writeln!(
            out,
            "{:<16} {:<10} {:<8} {:>10.2}  {}",
            order.id,
            order.status,
            order.payment_status,
            order.total_amount,
            order.created.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}
