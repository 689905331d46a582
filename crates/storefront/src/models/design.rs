//! Saved design domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use model2design_core::{BrandId, DesignId, Owner, ProductId};

/// Designs shown per page of a design listing.
pub const DESIGNS_PER_PAGE: u32 = 9;

/// Rendered preview images of a design, one per side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Thumbnails {
    pub front: Option<String>,
    pub back: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl Thumbnails {
    /// Overwrite the sides `newer` provides, keeping the rest.
    pub fn apply(&mut self, newer: Self) {
        if newer.front.is_some() {
            self.front = newer.front;
        }
        if newer.back.is_some() {
            self.back = newer.back;
        }
        if newer.left.is_some() {
            self.left = newer.left;
        }
        if newer.right.is_some() {
            self.right = newer.right;
        }
    }
}

/// A saved product design.
#[derive(Debug, Clone, Serialize)]
pub struct Design {
    pub id: DesignId,
    #[serde(skip)]
    pub owner: Owner,
    pub brand_id: BrandId,
    pub name: String,
    pub product_id: ProductId,
    /// Editor layout, opaque to the server.
    pub data: Value,
    pub thumbnails: Thumbnails,
    pub public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a design.
#[derive(Debug, Clone)]
pub struct NewDesign {
    pub owner: Owner,
    pub brand_id: BrandId,
    pub name: String,
    pub product_id: ProductId,
    pub data: Value,
    pub thumbnails: Thumbnails,
    pub public: bool,
}

/// Fields replaced when an owner re-saves a design.
///
/// Thumbnails are merged with [`Thumbnails::apply`].
#[derive(Debug, Clone)]
pub struct DesignUpdate {
    pub brand_id: BrandId,
    pub name: String,
    pub product_id: ProductId,
    pub data: Value,
    pub thumbnails: Thumbnails,
    pub public: bool,
}

/// Sort order of a design listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignOrder {
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    CreatedDesc,
    CreatedAsc,
    NameAsc,
    NameDesc,
}

impl DesignOrder {
    /// Parse an `order` query value; anything unknown sorts by most recently updated.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "updated_asc" => Self::UpdatedAsc,
            "created_desc" => Self::CreatedDesc,
            "created_asc" => Self::CreatedAsc,
            "name_asc" => Self::NameAsc,
            "name_desc" => Self::NameDesc,
            _ => Self::UpdatedDesc,
        }
    }

    #[must_use]
    pub const fn sql(&self) -> &'static str {
        match self {
            Self::UpdatedDesc => "updated_at DESC, id DESC",
            Self::UpdatedAsc => "updated_at ASC, id ASC",
            Self::CreatedDesc => "created_at DESC, id DESC",
            Self::CreatedAsc => "created_at ASC, id ASC",
            Self::NameAsc => "name ASC, id ASC",
            Self::NameDesc => "name DESC, id DESC",
        }
    }

    /// Sort designs in place the same way [`DesignOrder::sql`] orders rows.
    pub fn sort(&self, designs: &mut [Design]) {
        match self {
            Self::UpdatedDesc => designs.sort_by(|a, b| (b.updated_at, b.id).cmp(&(a.updated_at, a.id))),
            Self::UpdatedAsc => designs.sort_by(|a, b| (a.updated_at, a.id).cmp(&(b.updated_at, b.id))),
            Self::CreatedDesc => designs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id))),
            Self::CreatedAsc => designs.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id))),
            Self::NameAsc => designs.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id))),
            Self::NameDesc => designs.sort_by(|a, b| (&b.name, b.id).cmp(&(&a.name, a.id))),
        }
    }
}

/// Filters for listing an owner's designs within a brand.
#[derive(Debug, Clone, Default)]
pub struct DesignListQuery {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    pub order: DesignOrder,
    /// 1-based.
    pub page: u32,
}

impl DesignListQuery {
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * i64::from(DESIGNS_PER_PAGE)
    }

    /// The requested page when it exists, otherwise the first page.
    #[must_use]
    pub fn page_within(&self, total_matching: i64) -> u32 {
        if self.page >= 1 && self.page <= total_pages(total_matching) {
            self.page
        } else {
            1
        }
    }

    /// Whether `name` passes the search filter.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.search.as_deref().is_none_or(|needle| {
            name.to_lowercase().contains(&needle.to_lowercase())
        })
    }
}

/// Summary counts for an owner's designs in one brand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DesignStats {
    pub total_designs: i64,
    /// Created in the last seven days.
    pub recent_designs: i64,
    pub products_designed: i64,
}

/// One page of a design listing.
#[derive(Debug, Clone, Serialize)]
pub struct DesignPage {
    pub designs: Vec<Design>,
    pub page: u32,
    pub total_pages: u32,
    /// Number of designs matching the search.
    pub total_matching: i64,
}

impl DesignPage {
    #[must_use]
    pub fn new(designs: Vec<Design>, page: u32, total_matching: i64) -> Self {
        Self {
            designs,
            page,
            total_pages: total_pages(total_matching),
            total_matching,
        }
    }
}

/// Number of pages needed for `total_matching` designs, at least one.
#[must_use]
pub fn total_pages(total_matching: i64) -> u32 {
    let per_page = i64::from(DESIGNS_PER_PAGE);
    let pages = (total_matching.max(0) + per_page - 1) / per_page;
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Remove embedded decal textures from an editor payload.
///
/// Decals carry their image inline as `texture`; only the image URL is kept.
pub fn strip_decal_textures(data: &mut Value) {
    let Some(layers) = data.get_mut("layers").and_then(Value::as_object_mut) else {
        return;
    };
    for layer in layers.values_mut() {
        let Some(decals) = layer.get_mut("decals").and_then(Value::as_array_mut) else {
            continue;
        };
        for decal in decals {
            if let Some(decal) = decal.as_object_mut() {
                decal.remove("texture");
            }
        }
    }
}

/// The name to give a copy of `original`, avoiding names in `taken`.
///
/// `Logo` becomes `Logo (Copy)`, then `Logo (Copy 2)`, `Logo (Copy 3)`...
#[must_use]
pub fn copy_name(original: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let first = format!("{original} (Copy)");
    if !is_taken(&first) {
        return first;
    }
    (2_u32..)
        .map(|n| format!("{original} (Copy {n})"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(first)
}

/// A free name for a migrated guest design, `Logo (2)`, `Logo (3)`...
#[must_use]
pub fn dedupe_name(name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(name) {
        return name.to_string();
    }
    (2_u32..)
        .map(|n| format!("{name} ({n})"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_strip_decal_textures() {
        let mut data = json!({
            "layers": {
                "Front": {"decals": [{"url": "/a.png", "texture": "data:..."}, "odd"]},
                "Back": {"color": "#fff"}
            },
            "version": 2
        });
        strip_decal_textures(&mut data);
        assert_eq!(data["layers"]["Front"]["decals"][0], json!({"url": "/a.png"}));
        assert_eq!(data["layers"]["Front"]["decals"][1], json!("odd"));
        assert_eq!(data["version"], json!(2));

        let mut flat = json!([1, 2]);
        strip_decal_textures(&mut flat);
        assert_eq!(flat, json!([1, 2]));
    }

    #[test]
    fn test_thumbnails_apply_keeps_missing_sides() {
        let mut thumbs = Thumbnails {
            front: Some("/f1.png".into()),
            back: Some("/b1.png".into()),
            ..Thumbnails::default()
        };
        thumbs.apply(Thumbnails {
            front: Some("/f2.png".into()),
            ..Thumbnails::default()
        });
        assert_eq!(thumbs.front.as_deref(), Some("/f2.png"));
        assert_eq!(thumbs.back.as_deref(), Some("/b1.png"));
        assert_eq!(thumbs.left, None);
    }

    #[test]
    fn test_order_parsing_defaults() {
        assert_eq!(DesignOrder::parse_lenient("name_desc"), DesignOrder::NameDesc);
        assert_eq!(DesignOrder::parse_lenient("random"), DesignOrder::UpdatedDesc);
    }

    #[test]
    fn test_copy_and_dedupe_names() {
        let taken = ["Logo (Copy)", "Logo (Copy 2)", "Logo", "Logo (2)"];
        assert_eq!(copy_name("Logo", |n| taken.contains(&n)), "Logo (Copy 3)");
        assert_eq!(copy_name("Crest", |n| taken.contains(&n)), "Crest (Copy)");
        assert_eq!(dedupe_name("Logo", |n| taken.contains(&n)), "Logo (3)");
        assert_eq!(dedupe_name("Crest", |n| taken.contains(&n)), "Crest");
    }

    #[test]
    fn test_page_math() {
        let query = DesignListQuery {
            page: 3,
            ..DesignListQuery::default()
        };
        assert_eq!(query.offset(), 18);
        assert_eq!(DesignListQuery::default().offset(), 0);

        assert_eq!(total_pages(19), 3);
        assert_eq!(total_pages(0), 1);
        assert_eq!(query.page_within(19), 3);
        assert_eq!(query.page_within(9), 1);
        assert_eq!(DesignListQuery::default().page_within(4), 1);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let query = DesignListQuery {
            search: Some("HOOD".into()),
            ..DesignListQuery::default()
        };
        assert!(query.matches("Team hoodie"));
        assert!(!query.matches("Cap"));
    }
}
