//! Record extraction from catalog result pages
//!
//! This module turns a fetched result page into product records. Each
//! product card is an `<article>` element annotated with schema.org
//! microdata; fields that cannot be found stay absent.

use crate::output::ProductRecord;
use scraper::{ElementRef, Html, Selector};

const IN_STOCK: &str = "https://schema.org/InStock";

/// Extracts product records from a page body
///
/// Implementations must be pure functions of their input and must never
/// fail: malformed or unexpected markup yields fewer records or absent
/// fields, not an error.
pub trait RecordExtractor: Send + Sync {
    fn extract(&self, body: &str) -> Vec<ProductRecord>;
}

/// Extractor for the product card markup of the catalog listing pages
#[derive(Debug)]
pub struct ProductCardExtractor {
    card: Selector,
    price: Selector,
    brand_meta: Selector,
    brand_text: Selector,
    name: Selector,
    availability: Selector,
    sku: Selector,
    product_type: Selector,
    image: Selector,
}

impl Default for ProductCardExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductCardExtractor {
    pub fn new() -> Self {
        Self {
            card: Selector::parse("article").expect("card selector"),
            price: Selector::parse(r#"meta[itemprop="price"]"#).expect("price selector"),
            brand_meta: Selector::parse(r#"span[itemprop="brand"] meta[itemprop="name"]"#)
                .expect("brand meta selector"),
            brand_text: Selector::parse("span.Padcv").expect("brand text selector"),
            name: Selector::parse("span.KkVNn").expect("name selector"),
            availability: Selector::parse(r#"meta[itemprop="availability"]"#)
                .expect("availability selector"),
            sku: Selector::parse(r#"meta[itemprop="sku"]"#).expect("sku selector"),
            product_type: Selector::parse("div._7uTPQ").expect("product type selector"),
            image: Selector::parse(r#"source[type="image/jpeg"]"#).expect("image selector"),
        }
    }

    fn extract_card(&self, card: ElementRef<'_>) -> ProductRecord {
        let brand = first_attr(card, &self.brand_meta, "content")
            .or_else(|| first_text(card, &self.brand_text));

        let in_stock = first_attr(card, &self.availability, "content")
            .map(|availability| availability == IN_STOCK)
            .unwrap_or(false);

        let image_urls = card
            .select(&self.image)
            .filter_map(|source| source.value().attr("srcset"))
            .map(str::to_string)
            .collect();

        ProductRecord {
            brand,
            name: first_text(card, &self.name),
            price: first_attr(card, &self.price, "content"),
            in_stock,
            product_id: first_attr(card, &self.sku, "content"),
            product_type: first_text(card, &self.product_type),
            image_urls,
        }
    }
}

impl RecordExtractor for ProductCardExtractor {
    fn extract(&self, body: &str) -> Vec<ProductRecord> {
        let document = Html::parse_document(body);

        document
            .select(&self.card)
            .map(|card| self.extract_card(card))
            .collect()
    }
}

/// Attribute of the first matching descendant, if present and non-empty
fn first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Stripped text of the first matching descendant, if present and non-empty
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(|element| element.text().map(str::trim).collect::<String>())
        .filter(|text| !text.is_empty())
}
