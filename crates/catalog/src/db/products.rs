//! Product repository.
//!
//! Queries are built at runtime; listing filters are optional and combined
//! with `QueryBuilder`.

use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use modamatch_core::{
    CategoryId, ClothingType, ContentfulId, ExternalProductId, Platform, Price, Product, ProductId,
    StoreData,
};

use super::RepositoryError;

/// Columns of a product joined with its category's clothing class.
const SELECT_PRODUCT: &str = r"
    SELECT p.id, p.platform, p.shop_name, p.external_id,
           p.title, p.description, p.short_description, p.price,
           p.image_url, p.main_image_url, p.additional_images,
           p.contentful_id, p.category_id, p.store_data, p.enabled,
           COALESCE(c.clothing_type, 4::SMALLINT) AS clothing_type
    FROM catalog.product p
    LEFT JOIN catalog.category c ON c.contentful_id = p.category_id
";

#[derive(FromRow)]
struct ProductRow {
    id: ProductId,
    platform: String,
    shop_name: String,
    external_id: ExternalProductId,
    title: Option<String>,
    description: Option<String>,
    short_description: Option<String>,
    price: Option<i64>,
    image_url: Option<String>,
    main_image_url: Option<String>,
    additional_images: Vec<String>,
    contentful_id: Option<ContentfulId>,
    category_id: Option<CategoryId>,
    store_data: Option<Json<StoreData>>,
    enabled: bool,
    clothing_type: i16,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let platform = row
            .platform
            .parse::<Platform>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            shop_name: row.shop_name,
            platform,
            external_id: row.external_id,
            title: row.title,
            description: row.description,
            short_description: row.short_description,
            price: row.price.map(Price::from_cents),
            image_url: row.image_url,
            main_image_url: row.main_image_url,
            additional_images: row.additional_images,
            contentful_id: row.contentful_id,
            category_id: row.category_id,
            clothing_type: u8::try_from(row.clothing_type)
                .map_or(ClothingType::Unknown, ClothingType::from),
            enabled: row.enabled,
            store_data: row.store_data.map(|Json(data)| data),
        })
    }
}

/// Listing order. Ties are always broken by id so pages are stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    /// Parse the `sortBy` query value; anything but `price-desc` sorts ascending.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        if value == Some("price-desc") {
            Self::PriceDesc
        } else {
            Self::PriceAsc
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::PriceAsc => " ORDER BY p.price ASC, p.id ASC",
            Self::PriceDesc => " ORDER BY p.price DESC, p.id ASC",
        }
    }
}

/// Price bounds in cents. A `max` of zero leaves the range open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

/// Filters for listing and counting enabled products of one shop.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub shop_name: String,
    pub ids: Option<Vec<ProductId>>,
    pub category_id: Option<CategoryId>,
    pub price_range: PriceRange,
    pub sort: SortOrder,
    pub offset: i64,
    pub limit: i64,
}

impl ProductQuery {
    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE p.enabled AND p.shop_name = ")
            .push_bind(self.shop_name.clone());

        if let Some(category_id) = &self.category_id {
            qb.push(" AND p.category_id = ")
                .push_bind(category_id.clone());
        }
        if let Some(ids) = &self.ids {
            let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_owned()).collect();
            qb.push(" AND p.id = ANY(").push_bind(ids).push(")");
        }

        qb.push(" AND p.price >= ").push_bind(self.price_range.min);
        if self.price_range.max > 0 {
            qb.push(" AND p.price <= ").push_bind(self.price_range.max);
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by its catalog id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{SELECT_PRODUCT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get the product a store webhook refers to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_external_id(
        &self,
        platform: Platform,
        shop_name: &str,
        external_id: ExternalProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "{SELECT_PRODUCT} WHERE p.platform = $1 AND p.shop_name = $2 AND p.external_id = $3"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(platform.as_str())
            .bind(shop_name)
            .bind(external_id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get every product linked to a content-store item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_contentful_id(
        &self,
        contentful_id: &ContentfulId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("{SELECT_PRODUCT} WHERE p.contentful_id = $1 ORDER BY p.id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(contentful_id)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// List enabled products matching `query`, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_PRODUCT);
        query.push_filters(&mut qb);
        qb.push(query.sort.order_by());
        qb.push(" LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(self.pool).await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Count enabled products matching `query`. Paging and order are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, query: &ProductQuery) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM catalog.product p");
        query.push_filters(&mut qb);

        let count: i64 = qb.build_query_scalar().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// Insert or update a product, keyed by platform, shop and store id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO catalog.product (
                id, platform, shop_name, external_id,
                title, description, short_description, price,
                image_url, main_image_url, additional_images,
                contentful_id, category_id, store_data, enabled
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (platform, shop_name, external_id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                short_description = EXCLUDED.short_description,
                price = EXCLUDED.price,
                image_url = EXCLUDED.image_url,
                main_image_url = EXCLUDED.main_image_url,
                additional_images = EXCLUDED.additional_images,
                contentful_id = EXCLUDED.contentful_id,
                category_id = EXCLUDED.category_id,
                store_data = EXCLUDED.store_data,
                enabled = EXCLUDED.enabled,
                updated_at = NOW()
            ",
        )
        .bind(&product.id)
        .bind(product.platform.as_str())
        .bind(&product.shop_name)
        .bind(product.external_id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.price.map(Price::cents))
        .bind(&product.image_url)
        .bind(&product.main_image_url)
        .bind(product.additional_images.as_slice())
        .bind(&product.contentful_id)
        .bind(&product.category_id)
        .bind(product.store_data.as_ref().map(Json))
        .bind(product.enabled)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete a product. Deleting a missing product is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM catalog.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
