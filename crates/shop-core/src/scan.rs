//! # Tag Scanning
//!
//! Turns the payload of an NFC text record into a product id, and resolves a
//! scanned id into a cart line item.
//!
//! Tags are written as NDEF text records whose text is `ProdID: <id>`. The
//! raw record payload starts with a status byte whose low six bits give the
//! length of the language code that follows:
//!
//! ```text
//! 0x02 'e' 'n' 'P' 'r' 'o' 'd' 'I' 'D' ':' ' ' 'P' '1'
//! ```

use crate::cart::{CartHandle, LineItem};
use crate::catalog::SharedCatalog;
use crate::error::{ShopError, ShopResult};
use tracing::{debug, info, instrument, warn};

const PRODUCT_MARKER: &str = "ProdID: ";

/// What a tag carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagScan {
    /// A product tag
    Product(String),
    /// Readable text that is not a product tag
    Text(String),
    /// No payload
    Empty,
}

impl TagScan {
    /// The product id, or `InvalidTag` for anything else
    pub fn into_product_id(self) -> ShopResult<String> {
        match self {
            TagScan::Product(id) => Ok(id),
            TagScan::Text(text) => Err(ShopError::InvalidTag(format!("not a product tag: {}", text))),
            TagScan::Empty => Err(ShopError::InvalidTag("empty tag".to_string())),
        }
    }
}

/// Parse the payload of the first record on a tag
pub fn parse_tag_payload(payload: &[u8]) -> TagScan {
    let text = match payload.first() {
        None => return TagScan::Empty,
        Some(&status) if status < 0x20 => {
            let lang_len = (status & 0x3F) as usize;
            let start = (1 + lang_len).min(payload.len());
            String::from_utf8_lossy(&payload[start..]).into_owned()
        }
        Some(_) => String::from_utf8_lossy(payload).into_owned(),
    };
    parse_tag_text(&text)
}

/// Parse the decoded text of a tag record
pub fn parse_tag_text(text: &str) -> TagScan {
    let text = text.trim_start_matches('\u{2}');
    // Older tags were read with the language code still attached
    let text = text.strip_prefix("en").filter(|rest| rest.starts_with(PRODUCT_MARKER)).unwrap_or(text);

    if text.trim().is_empty() {
        return TagScan::Empty;
    }

    match text.strip_prefix(PRODUCT_MARKER) {
        Some(id) if !id.trim().is_empty() => TagScan::Product(id.trim().to_string()),
        _ => TagScan::Text(text.to_string()),
    }
}

/// Resolves scanned product ids into cart line items
#[derive(Clone)]
pub struct ScanHandler {
    catalog: SharedCatalog,
}

impl ScanHandler {
    pub fn new(catalog: SharedCatalog) -> Self {
        Self { catalog }
    }

    /// Add one unit of the scanned product to `cart`.
    ///
    /// A product already in the cart is incremented without a catalog lookup.
    /// Otherwise the catalog is consulted and a miss is `ProductNotFound`.
    /// Returns the line item as it stands after the scan.
    #[instrument(skip(self, cart))]
    pub async fn scan(&self, cart: &CartHandle, product_id: &str) -> ShopResult<LineItem> {
        if let Some(item) = cart.increment_existing(product_id) {
            debug!("Scanned {} again, quantity now {}", product_id, item.quantity);
            return Ok(item);
        }

        let product = match self.catalog.lookup(product_id).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                warn!("Product with ID {} not found", product_id);
                return Err(ShopError::ProductNotFound {
                    product_id: product_id.to_string(),
                });
            }
            Err(e) => {
                warn!("Catalog lookup for {} failed: {}", product_id, e);
                return Err(e);
            }
        };

        let item = cart.add_and_get(LineItem::from_product(&product));
        info!("Added {} ({}) to cart", item.id, item.unit_price.display());
        Ok(item)
    }

    /// Parse a raw tag payload and scan the product it names
    pub async fn scan_payload(&self, cart: &CartHandle, payload: &[u8]) -> ShopResult<LineItem> {
        let product_id = parse_tag_payload(payload).into_product_id()?;
        self.scan(cart, &product_id).await
    }
}
