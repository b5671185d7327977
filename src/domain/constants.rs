//! Site characteristics and domain constants
//!
//! Everything here describes the shape of the retailer's product pages.
//! Values that operators may need to tune at runtime are mirrored in
//! `infrastructure::config` and only default to these constants.

/// Product page identity
pub mod site {
    /// Prefix of the path segment carrying the canonical product id (`A-94336414`)
    pub const CANONICAL_ID_PREFIX: &str = "A-";

    /// Product detail page URL pattern (canonical id placeholder: {})
    pub const DETAIL_PAGE_URL_PATTERN: &str = "https://www.target.com/p/-/A-{}";
}

/// Embedded data island contract
pub mod embedded {
    /// Token marking the script node that carries the serialized page data
    pub const SENTINEL_TOKEN: &str = "__TGT_DATA__";

    /// Object holding the preloaded query list inside the decoded data
    pub const PRELOADED_QUERIES_POINTER: &str = "/__PRELOADED_QUERIES__/queries";

    /// Name of the query whose result describes the product detail page
    pub const PDP_QUERY_NAME: &str = "@web/domain-product/get-pdp-v1";

    /// Query parameter holding the canonical id
    pub const CANONICAL_ID_PARAM: &str = "tcin";

    /// Pointer from a query result to the product record
    pub const PRODUCT_POINTER: &str = "/data/product";

    /// Shipping availability statuses that count as purchasable online
    pub const POSITIVE_SHIPPING_STATUSES: [&str; 3] =
        ["IN_STOCK", "LIMITED_STOCK", "PRE_ORDER_SELLABLE"];
}

/// Rendered text phrases
pub mod keywords {
    pub const NEGATIVE_PHRASES: [&str; 5] = [
        "out of stock",
        "sold out",
        "currently unavailable",
        "no longer available",
        "not available",
    ];

    pub const POSITIVE_PHRASES: [&str; 4] = [
        "add to cart",
        "ship it",
        "pick it up",
        "qty 1",
    ];
}

/// Polling defaults
pub mod polling {
    /// Seconds between two full cycles over the product list
    pub const CHECK_INTERVAL_SECONDS: u64 = 300;

    /// Politeness delay between two products of the same cycle
    pub const PRODUCT_DELAY_MS: u64 = 2000;

    /// Upper bound of the random jitter added to the politeness delay
    pub const PRODUCT_DELAY_JITTER_MS: u64 = 500;

    /// Network timeout for one document fetch
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 15;

    /// Aggregate request budget, shared by all concurrent checks
    pub const MAX_REQUESTS_PER_MINUTE: u32 = 12;

    /// Browser-like client identification; the retailer rejects default clients
    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
}

/// Notification defaults
pub mod notify {
    /// Display name used for webhook posts
    pub const WEBHOOK_USERNAME: &str = "Restock Bot";

    /// Legacy environment variable holding the webhook URL
    pub const LEGACY_WEBHOOK_ENV: &str = "DISCORD_WEBHOOK_URL";
}
