//! Product listing, product detail and category counts.
//!
//! List parameters may repeat (`ids=a&ids=b`) or use the bracket form
//! (`ids[]=a&ids[]=b`); both are accepted. `priceRange` bounds are in the
//! major unit (`19.99`), like the prices shoppers see.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use serde::Serialize;
use tracing::instrument;

use modamatch_core::{CategoryId, Price, Product, ProductId};

use crate::db::{PriceRange, ProductQuery, ProductRepository, SortOrder};
use crate::error::ApiError;
use crate::state::AppState;

/// Page size used when `limit` is absent or zero.
pub const ITEMS_PER_PAGE: i64 = 20;
/// Largest page a client may ask for.
pub const MAX_LIMIT: i64 = 100;

/// Query string of the listing and counting routes.
#[derive(Debug, Default, PartialEq, Eq)]
struct ListingParams {
    shop_name: Option<String>,
    ids: Vec<String>,
    category_id: Option<String>,
    price_range: Vec<String>,
    sort_by: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

impl ListingParams {
    fn parse(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(raw) = raw else {
            return params;
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let value = value.into_owned();
            match key.trim_end_matches("[]") {
                "shopName" => params.shop_name = Some(value),
                "ids" => params.ids.push(value),
                "categoryId" => params.category_id = Some(value),
                "priceRange" => params.price_range.push(value),
                "sortBy" => params.sort_by = Some(value),
                "page" => params.page = Some(value),
                "limit" => params.limit = Some(value),
                _ => {}
            }
        }
        params
    }

    fn shop_name(&self) -> Result<String, ApiError> {
        self.shop_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| ApiError::InvalidParameters("Invalid shopName".to_string()))
    }

    /// Bounds in cents, parsed from major-unit values.
    fn price_range(&self) -> Result<PriceRange, ApiError> {
        let bound = |index: usize| {
            self.price_range.get(index).map_or(Ok(0), |value| {
                Price::parse_major(value)
                    .map(Price::cents)
                    .ok_or_else(|| ApiError::InvalidParameters("Invalid priceRange".to_string()))
            })
        };
        Ok(PriceRange {
            min: bound(0)?,
            max: bound(1)?,
        })
    }

    /// Page size and row offset. `limit` is clamped to `0..=MAX_LIMIT`.
    fn paging(&self) -> Result<(i64, i64), ApiError> {
        let limit = self
            .limit
            .as_deref()
            .map_or(Ok(0), |value| parse_number("limit", value))?
            .clamp(0, MAX_LIMIT);
        let per_page = if limit == 0 { ITEMS_PER_PAGE } else { limit };
        let page = self
            .page
            .as_deref()
            .map_or(Ok(0), |value| parse_number("page", value))?
            .max(0);
        Ok((per_page, page.saturating_mul(per_page)))
    }
}

fn parse_number(name: &str, value: &str) -> Result<i64, ApiError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ApiError::InvalidParameters(format!("Invalid {name}")))
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ProductList>, ApiError> {
    let params = ListingParams::parse(raw.as_deref());
    let shop_name = params.shop_name()?;
    let (limit, offset) = params.paging()?;

    let query = ProductQuery {
        shop_name,
        ids: (!params.ids.is_empty())
            .then(|| params.ids.iter().map(ProductId::new).collect()),
        category_id: params.category_id.as_deref().map(CategoryId::new),
        price_range: params.price_range()?,
        sort: SortOrder::from_param(params.sort_by.as_deref()),
        offset,
        limit,
    };

    let products = ProductRepository::new(state.pool()).list(&query).await?;
    Ok(Json(ProductList { products }))
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    ProductRepository::new(state.pool())
        .get_by_id(&ProductId::new(id.as_str()))
        .await?
        .filter(|product| product.enabled)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))
}

/// `GET /api/categories/count`
///
/// One count per requested category, in request order. Without `ids` a
/// single count over the whole shop is returned.
#[instrument(skip(state))]
pub async fn count_by_category(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<i64>>, ApiError> {
    let params = ListingParams::parse(raw.as_deref());
    let shop_name = params.shop_name()?;
    let price_range = params.price_range()?;

    let categories: Vec<Option<CategoryId>> = if params.ids.is_empty() {
        vec![None]
    } else {
        params.ids.iter().map(|id| Some(CategoryId::new(id.as_str()))).collect()
    };

    let products = ProductRepository::new(state.pool());
    let mut counts = Vec::with_capacity(categories.len());
    for category_id in categories {
        let query = ProductQuery {
            shop_name: shop_name.clone(),
            category_id,
            price_range,
            ..ProductQuery::default()
        };
        counts.push(products.count(&query).await?);
    }

    Ok(Json(counts))
}
