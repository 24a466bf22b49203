//! Plain-text rendering of the list views.

use std::fmt::Write;

use basket_core::models::{Product, ShoppingItem};
use basket_core::ordering::Progress;

fn details(item: &ShoppingItem) -> String {
    let mut out = String::new();
    if let Some(quantity) = &item.quantity {
        let _ = write!(out, " ({})", quantity);
    }
    if let Some(note) = &item.note {
        let _ = write!(out, " - {}", note);
    }
    out
}

pub fn item_line(item: &ShoppingItem) -> String {
    let mark = if item.is_checked { "[x]" } else { "[ ]" };
    let custom = if item.is_custom() { " *" } else { "" };
    format!(
        "{:>5}  {} {}{}{}",
        item.id,
        mark,
        item.display_name(),
        custom,
        details(item)
    )
}

pub fn plain_list(items: &[ShoppingItem]) -> String {
    if items.is_empty() {
        return "The list is empty.\n".to_string();
    }
    items.iter().map(|i| item_line(i) + "\n").collect()
}

pub fn shopping_mode(items: &[ShoppingItem], progress: Progress) -> String {
    let mut out = format!("{}/{} done", progress.checked, progress.total);
    if progress.is_complete() {
        out.push_str(", all done!");
    }
    out.push('\n');

    let mut shown_divider = false;
    for item in items {
        if item.is_checked && !shown_divider && progress.checked < progress.total {
            out.push_str("  -- in the basket --\n");
            shown_divider = true;
        }
        out.push_str(&item_line(item));
        out.push('\n');
    }
    out
}

pub fn catalog(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products yet.\n".to_string();
    }
    products
        .iter()
        .map(|p| format!("{:>5}  {:>3}. {}\n", p.id, p.sort_order, p.name))
        .collect()
}
