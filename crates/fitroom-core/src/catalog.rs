//! Product catalog: admin-managed clothing for sale, held in memory.
//!
//! Filtering mirrors the shop view (category, price band, free-text query over name
//! and description); [`Catalog::search`] is the admin variant that also matches the
//! category name.

use crate::error::{StudioError, StudioResult};
use crate::ids::IdGenerator;
use crate::models::ImageRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogCategory {
    Tops,
    Bottoms,
    Dresses,
    Outerwear,
    Shoes,
    Accessories,
}

impl CatalogCategory {
    pub const ALL: [CatalogCategory; 6] = [
        Self::Tops,
        Self::Bottoms,
        Self::Dresses,
        Self::Outerwear,
        Self::Shoes,
        Self::Accessories,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Tops => "Tops",
            Self::Bottoms => "Bottoms",
            Self::Dresses => "Dresses",
            Self::Outerwear => "Outerwear",
            Self::Shoes => "Shoes",
            Self::Accessories => "Accessories",
        }
    }
}

impl fmt::Display for CatalogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CatalogCategory {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| StudioError::validation(format!("unknown catalog category '{}'", wanted)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: CatalogCategory,
    #[serde(rename = "imageUrl")]
    pub image: ImageRef,
    pub price: f64,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// Admin form contents before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCatalogItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: CatalogCategory,
    #[serde(rename = "imageUrl")]
    pub image: ImageRef,
    pub price: f64,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// Name and description are required; price must be a finite, non-negative number.
fn validate_fields(name: &str, description: &str, price: f64) -> StudioResult<()> {
    if name.trim().is_empty() {
        return Err(StudioError::validation("catalog item name is required"));
    }
    if description.trim().is_empty() {
        return Err(StudioError::validation("catalog item description is required"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(StudioError::validation(format!(
            "price must be a non-negative number, got {}",
            price
        )));
    }
    Ok(())
}

/// Price bands offered by the shop filter. A zero price (unpriced item) only
/// shows under [`PriceBand::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBand {
    #[default]
    All,
    /// Above 0 and under 50.
    Low,
    /// 50 up to (not including) 100.
    Medium,
    /// 100 and above.
    High,
}

impl PriceBand {
    pub fn contains(&self, price: f64) -> bool {
        match self {
            Self::All => true,
            Self::Low => price > 0.0 && price < 50.0,
            Self::Medium => (50.0..100.0).contains(&price),
            Self::High => price >= 100.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    /// `None` shows every category.
    pub category: Option<CatalogCategory>,
    pub price: PriceBand,
    pub query: Option<String>,
}

impl CatalogFilter {
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if self.category.is_some_and(|c| c != item.category) {
            return false;
        }
        if !self.price.contains(item.price) {
            return false;
        }
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                item.name.to_lowercase().contains(&q) || item.description.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }
}

/// Ordered in-memory catalog.
pub struct Catalog {
    items: RwLock<Vec<CatalogItem>>,
    ids: Arc<dyn IdGenerator>,
}

impl Catalog {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self::with_items(ids, Vec::new())
    }

    pub fn with_items(ids: Arc<dyn IdGenerator>, items: Vec<CatalogItem>) -> Self {
        Self { items: RwLock::new(items), ids }
    }

    pub fn list(&self) -> Vec<CatalogItem> {
        self.items.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn get(&self, id: &str) -> Option<CatalogItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }

    pub fn add(&self, draft: NewCatalogItem) -> StudioResult<CatalogItem> {
        validate_fields(&draft.name, &draft.description, draft.price)?;
        let item = CatalogItem {
            id: self.ids.next_id(),
            name: draft.name,
            description: draft.description,
            category: draft.category,
            image: draft.image,
            price: draft.price,
            colors: draft.colors,
            sizes: draft.sizes,
        };
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item.clone());
        tracing::info!(target: "fitroom::catalog", id = %item.id, name = %item.name, "catalog item added");
        Ok(item)
    }

    /// Replaces the item with the same id, keeping its position.
    pub fn update(&self, item: CatalogItem) -> StudioResult<()> {
        validate_fields(&item.name, &item.description, item.price)?;
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let slot = items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| StudioError::NotFound(format!("catalog item '{}'", item.id)))?;
        *slot = item;
        Ok(())
    }

    /// Returns whether an item was removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let before = items.len();
        items.retain(|i| i.id != id);
        before != items.len()
    }

    pub fn filter(&self, filter: &CatalogFilter) -> Vec<CatalogItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect()
    }

    /// Admin search: case-insensitive match on name, description or category.
    pub fn search(&self, query: &str) -> Vec<CatalogItem> {
        let q = query.trim().to_lowercase();
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        if q.is_empty() {
            return items.clone();
        }
        items
            .iter()
            .filter(|i| {
                i.name.to_lowercase().contains(&q)
                    || i.description.to_lowercase().contains(&q)
                    || i.category.label().to_lowercase().contains(&q)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::UuidGenerator;

    fn draft(name: &str, description: &str, category: CatalogCategory, price: f64) -> NewCatalogItem {
        NewCatalogItem {
            name: name.into(),
            description: description.into(),
            category,
            image: ImageRef::from(format!("https://img/{}", name)),
            price,
            colors: vec!["#000000".into()],
            sizes: vec!["M".into()],
        }
    }

    fn seeded() -> Catalog {
        let catalog = Catalog::new(Arc::new(UuidGenerator));
        catalog.add(draft("Classic White T-Shirt", "Essential cotton t-shirt", CatalogCategory::Tops, 29.99)).unwrap();
        catalog.add(draft("Dark Wash Slim Jeans", "Slim-fit stretch denim", CatalogCategory::Bottoms, 59.99)).unwrap();
        catalog.add(draft("Tailored Blazer", "Structured blazer", CatalogCategory::Outerwear, 129.99)).unwrap();
        catalog.add(draft("Knit Sweater", "Warm cotton knit", CatalogCategory::Tops, 100.0)).unwrap();
        catalog
    }

    #[test]
    fn filters_combine() {
        let catalog = seeded();
        let tops = catalog.filter(&CatalogFilter {
            category: Some(CatalogCategory::Tops),
            ..Default::default()
        });
        assert_eq!(tops.len(), 2);

        let pricey_tops = catalog.filter(&CatalogFilter {
            category: Some(CatalogCategory::Tops),
            price: PriceBand::High,
            query: None,
        });
        assert_eq!(pricey_tops.len(), 1);
        assert_eq!(pricey_tops[0].name, "Knit Sweater");

        let cotton = catalog.filter(&CatalogFilter {
            query: Some("  COTTON ".into()),
            ..Default::default()
        });
        assert_eq!(cotton.len(), 2);

        let medium = catalog.filter(&CatalogFilter { price: PriceBand::Medium, ..Default::default() });
        assert_eq!(medium.len(), 1);
        assert_eq!(medium[0].category, CatalogCategory::Bottoms);
    }

    #[test]
    fn admin_search_matches_category() {
        let catalog = seeded();
        assert_eq!(catalog.search("outerwear").len(), 1);
        // The shop filter does not look at the category name.
        let via_filter = catalog.filter(&CatalogFilter {
            query: Some("outerwear".into()),
            ..Default::default()
        });
        assert!(via_filter.is_empty());
        assert_eq!(catalog.search("").len(), 4);
    }

    #[test]
    fn update_and_remove() {
        let catalog = seeded();
        let mut jeans = catalog.list()[1].clone();
        jeans.price = 45.0;
        catalog.update(jeans.clone()).unwrap();
        assert_eq!(catalog.get(&jeans.id).unwrap().price, 45.0);
        assert_eq!(catalog.list()[1].id, jeans.id);

        assert!(catalog.remove(&jeans.id));
        assert!(!catalog.remove(&jeans.id));
        assert!(matches!(catalog.update(jeans), Err(StudioError::NotFound(_))));
    }

    #[test]
    fn rejects_negative_price_and_blank_fields() {
        let catalog = Catalog::new(Arc::new(UuidGenerator));
        assert!(catalog.add(draft("Hat", "Wool hat", CatalogCategory::Accessories, -1.0)).is_err());
        assert!(catalog.add(draft("  ", "Wool hat", CatalogCategory::Accessories, 10.0)).is_err());
        let err = catalog
            .add(draft("Hat", "   ", CatalogCategory::Accessories, 10.0))
            .unwrap_err();
        assert!(matches!(err, StudioError::Validation(msg) if msg.contains("description")));
        assert!(catalog.list().is_empty());
        assert_eq!("shoes".parse::<CatalogCategory>().unwrap(), CatalogCategory::Shoes);
    }

    #[test]
    fn update_requires_description() {
        let catalog = seeded();
        let mut tee = catalog.list()[0].clone();
        tee.description.clear();
        assert!(matches!(catalog.update(tee), Err(StudioError::Validation(_))));
        assert_eq!(catalog.list()[0].description, "Essential cotton t-shirt");
    }

    #[test]
    fn zero_price_only_shows_under_all() {
        let catalog = seeded();
        let freebie = catalog
            .add(draft("Sample Socks", "Promotional socks", CatalogCategory::Accessories, 0.0))
            .unwrap();

        for band in [PriceBand::Low, PriceBand::Medium, PriceBand::High] {
            let hits = catalog.filter(&CatalogFilter { price: band, ..Default::default() });
            assert!(hits.iter().all(|i| i.id != freebie.id), "{:?} should skip a zero price", band);
        }
        let all = catalog.filter(&CatalogFilter::default());
        assert!(all.iter().any(|i| i.id == freebie.id));

        let low = catalog.filter(&CatalogFilter { price: PriceBand::Low, ..Default::default() });
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Classic White T-Shirt");
    }
}
