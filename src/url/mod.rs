//! URL handling module for Catalog-Sweep
//!
//! Builds the addresses of individual result pages from a section address.

use url::Url;

/// Builds the address of one result page within a section
///
/// The page number is appended as a query parameter, after any query the
/// section address already carries.
///
/// # Examples
///
/// ```
/// use catalog_sweep::url::page_url;
/// use url::Url;
///
/// let section = Url::parse("https://shop.example.com/makeup").unwrap();
/// let url = page_url(&section, "p", 3);
/// assert_eq!(url.as_str(), "https://shop.example.com/makeup?p=3");
/// ```
pub fn page_url(section: &Url, page_param: &str, page: u32) -> Url {
    let mut url = section.clone();
    url.set_fragment(None);
    url.query_pairs_mut()
        .append_pair(page_param, &page.to_string());
    url
}
