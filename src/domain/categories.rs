//! Categories and the swap-based ordering rules applied to them.
//!
//! The collection is ordered by `display_order` ascending. Values need not be
//! contiguous or zero-based; only their relative order matters. Reordering
//! exchanges the order keys of two adjacent entries instead of renumbering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: CategoryColor,
    pub display_order: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Badge colour picked for a category in the admin panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryColor {
    #[default]
    Blue,
    Emerald,
    Purple,
    Amber,
    Rose,
    Cyan,
    Pink,
    Indigo,
}

impl CategoryColor {
    pub const ALL: [CategoryColor; 8] = [
        CategoryColor::Blue,
        CategoryColor::Emerald,
        CategoryColor::Purple,
        CategoryColor::Amber,
        CategoryColor::Rose,
        CategoryColor::Cyan,
        CategoryColor::Pink,
        CategoryColor::Indigo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryColor::Blue => "blue",
            CategoryColor::Emerald => "emerald",
            CategoryColor::Purple => "purple",
            CategoryColor::Amber => "amber",
            CategoryColor::Rose => "rose",
            CategoryColor::Cyan => "cyan",
            CategoryColor::Pink => "pink",
            CategoryColor::Indigo => "indigo",
        }
    }

    /// Utility classes used by the public listing badges.
    pub fn classes(self) -> ColorClasses {
        ColorClasses::for_family(self.as_str())
    }
}

impl fmt::Display for CategoryColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryColor {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CategoryColor::ALL
            .into_iter()
            .find(|color| color.as_str() == value)
            .ok_or_else(|| DomainError::validation(format!("unknown category color `{value}`")))
    }
}

/// Badge palette for a category colour family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorClasses {
    pub bg: String,
    pub text: String,
    pub border: String,
    pub hover: String,
}

impl ColorClasses {
    fn for_family(family: &str) -> Self {
        Self {
            bg: format!("bg-{family}-50"),
            text: format!("text-{family}-700"),
            border: format!("border-{family}-200"),
            hover: format!("hover:border-{family}-500 hover:bg-{family}-100"),
        }
    }

    /// Palette for posts whose category no longer resolves to a stored colour.
    pub fn neutral() -> Self {
        Self::for_family("gray")
    }
}

/// Resolve a (possibly stale) stored colour name to its palette.
pub fn classes_for(color: Option<&str>) -> ColorClasses {
    color
        .and_then(|value| value.parse::<CategoryColor>().ok())
        .map(CategoryColor::classes)
        .unwrap_or_else(ColorClasses::neutral)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// One row's order-key change within a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAssignment {
    pub id: Uuid,
    pub from: i32,
    pub to: i32,
}

/// The two writes that together exchange adjacent order keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPlan {
    pub moved: OrderAssignment,
    pub displaced: OrderAssignment,
}

/// Sort ascending by `display_order`.
///
/// Equal order keys only arise from external edits; they are broken by
/// `created_at` and then `id` so the sequence is at least deterministic.
pub fn sort_categories(categories: &mut [CategoryRecord]) {
    categories.sort_by(|lhs, rhs| {
        lhs.display_order
            .cmp(&rhs.display_order)
            .then_with(|| lhs.created_at.cmp(&rhs.created_at))
            .then_with(|| lhs.id.cmp(&rhs.id))
    });
}

/// Order key for a newly created category: current maximum plus one, or 1.
pub fn next_display_order(categories: &[CategoryRecord]) -> i32 {
    categories
        .iter()
        .map(|category| category.display_order)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Plan the swap that moves the entry at `index` one step in `direction`.
///
/// `categories` must already be sorted. Moving the first entry up or the last
/// entry down is a no-op and yields `Ok(None)`.
pub fn plan_swap(
    categories: &[CategoryRecord],
    index: usize,
    direction: MoveDirection,
) -> Result<Option<SwapPlan>, DomainError> {
    if index >= categories.len() {
        return Err(DomainError::validation(format!(
            "category index {index} is out of range for {} entries",
            categories.len()
        )));
    }

    let neighbour = match direction {
        MoveDirection::Up if index == 0 => return Ok(None),
        MoveDirection::Up => index - 1,
        MoveDirection::Down if index + 1 == categories.len() => return Ok(None),
        MoveDirection::Down => index + 1,
    };

    let current = &categories[index];
    let other = &categories[neighbour];

    // Exchanging equal keys would write nothing and leave the order as is.
    if current.display_order == other.display_order {
        return Err(DomainError::invariant(format!(
            "categories `{}` and `{}` share display_order {}",
            current.name, other.name, current.display_order
        )));
    }

    Ok(Some(SwapPlan {
        moved: OrderAssignment {
            id: current.id,
            from: current.display_order,
            to: other.display_order,
        },
        displaced: OrderAssignment {
            id: other.id,
            from: other.display_order,
            to: current.display_order,
        },
    }))
}

/// Apply a swap plan to an in-memory list and re-sort it.
pub fn apply_swap(categories: &mut [CategoryRecord], plan: &SwapPlan) {
    for category in categories.iter_mut() {
        if category.id == plan.moved.id {
            category.display_order = plan.moved.to;
        } else if category.id == plan.displaced.id {
            category.display_order = plan.displaced.to;
        }
    }
    sort_categories(categories);
}
