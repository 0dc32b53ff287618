use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top level of the free games promotions response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeGamesResponse {
    pub data: CatalogData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(rename = "Catalog")]
    pub catalog: Catalog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub search_store: SearchStore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStore {
    #[serde(default)]
    pub elements: Vec<CatalogElement>,
}

/// One storefront offer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogElement {
    pub title: String,
    #[serde(rename = "id")]
    pub store_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url_slug: Option<String>,
    #[serde(default)]
    pub product_slug: Option<String>,
    #[serde(default)]
    pub key_images: Vec<KeyImage>,
    #[serde(default)]
    pub catalog_ns: Option<CatalogNamespace>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub promotions: Option<Promotions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyImage {
    #[serde(rename = "type")]
    pub image_type: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogNamespace {
    #[serde(default)]
    pub mappings: Option<Vec<PageMapping>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMapping {
    pub page_slug: String,
    pub page_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub total_price: TotalPrice,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalPrice {
    pub discount_price: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotions {
    #[serde(default)]
    pub promotional_offers: Vec<PromotionGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionGroup {
    #[serde(default)]
    pub promotional_offers: Vec<PromotionWindow>,
}

/// A single promotional window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl PromotionWindow {
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }
}

impl CatalogElement {
    /// Offers without a price block are not treated as free
    pub fn is_free(&self) -> bool {
        self.price
            .as_ref()
            .map(|p| p.total_price.discount_price <= 0)
            .unwrap_or(false)
    }

    /// The promotional window that contains `now`, if any
    pub fn active_window(&self, now: DateTime<Utc>) -> Option<PromotionWindow> {
        self.promotions
            .as_ref()?
            .promotional_offers
            .iter()
            .flat_map(|group| group.promotional_offers.iter())
            .find(|window| window.contains(now))
            .copied()
    }

    fn catalog_slug(&self, page_type: &str) -> Option<&str> {
        self.catalog_ns
            .as_ref()?
            .mappings
            .as_ref()?
            .iter()
            .find(|m| m.page_type == page_type && !m.page_slug.is_empty())
            .map(|m| m.page_slug.as_str())
    }

    /// Product page slug: "productHome" mapping, then product slug, then url slug,
    /// cut at the first '/'
    pub fn product_slug(&self) -> String {
        let slug = self
            .catalog_slug("productHome")
            .or_else(|| self.product_slug.as_deref().filter(|s| !s.is_empty()))
            .or(self.url_slug.as_deref())
            .unwrap_or_default();

        match slug.find('/') {
            Some(index) => slug[..index].to_string(),
            None => slug.to_string(),
        }
    }

    /// "Thumbnail" image if present, else the last "OfferImageWide", else empty
    pub fn thumbnail(&self) -> String {
        let mut url: &str = "";
        for image in &self.key_images {
            match image.image_type.to_lowercase().as_str() {
                "thumbnail" => return image.url.clone(),
                "offerimagewide" => url = image.url.as_str(),
                _ => {}
            }
        }
        url.to_string()
    }
}
