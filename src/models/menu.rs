use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{Hierarchy, ServiceError, ServiceResult};

/// Sentinel menu type id meaning "every menu"
pub const ALL_MENU_TYPES: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: i64,
    pub menu_type_id: i64,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub menu_id: i64,
    pub parent_id: Option<i64>,
    pub menu_item_type_id: i64,
    pub entity_id: Option<i64>,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub url: Option<String>,
    pub position: i32,
    pub is_active: bool,
}

/// Unsaved menu item
#[derive(Debug, Clone, PartialEq)]
pub struct NewMenuItem {
    pub parent_id: Option<i64>,
    pub menu_item_type_id: i64,
    pub entity_id: Option<i64>,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub url: Option<String>,
    pub position: i32,
    pub is_active: bool,
}

/// Item as submitted on create and update
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub menu_item_type_id: i64,
    #[serde(default)]
    pub entity_id: Option<i64>,
    pub title_en: String,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuRequest {
    pub name: String,
    pub code: String,
    pub menu_type_id: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub items: Vec<MenuItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuRequest {
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub items: Vec<MenuItemInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemResponse {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub menu_item_type_id: i64,
    pub entity_id: Option<i64>,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub url: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub menu_type_id: i64,
    pub is_active: bool,
    pub items: Vec<MenuItemResponse>,
}

/// A single menu for a concrete type, every menu for the wildcard type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MenuLookup {
    Single(MenuResponse),
    All(Vec<MenuResponse>),
}

/// `{id}` body returned after creating a menu or banner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: i64,
}

/// Item writes to apply to one menu in a single transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuItemChanges {
    pub deleted: Vec<i64>,
    pub updated: Vec<MenuItem>,
    pub inserted: Vec<NewMenuItem>,
}

impl From<MenuItem> for MenuItemResponse {
    fn from(item: MenuItem) -> Self {
        Self {
            id: item.id,
            parent_id: item.parent_id,
            menu_item_type_id: item.menu_item_type_id,
            entity_id: item.entity_id,
            title_en: item.title_en,
            title_ar: item.title_ar,
            url: item.url,
            position: item.position,
        }
    }
}

impl MenuResponse {
    /// Assemble the public view with active items ordered by position
    pub fn build(menu: Menu, items: Vec<MenuItem>) -> Self {
        let mut items: Vec<MenuItem> = items.into_iter().filter(|i| i.is_active).collect();
        items.sort_by_key(|i| (i.position, i.id));

        Self {
            id: menu.id,
            name: menu.name,
            code: menu.code,
            menu_type_id: menu.menu_type_id,
            is_active: menu.is_active,
            items: items.into_iter().map(MenuItemResponse::from).collect(),
        }
    }
}

impl NewMenuItem {
    fn from_input(input: MenuItemInput) -> Self {
        Self {
            parent_id: input.parent_id,
            menu_item_type_id: input.menu_item_type_id,
            entity_id: input.entity_id,
            title_en: input.title_en,
            title_ar: input.title_ar,
            url: input.url,
            position: input.position,
            is_active: input.is_active,
        }
    }
}

/// Work out the item writes for a menu and check parent links.
///
/// `existing` holds the items currently stored for the menu. Inputs flagged
/// deleted remove their item, inputs with an id overwrite it and inputs
/// without one are inserted. Ids that do not belong to this menu are ignored.
/// Every parent must be a surviving item of the same menu and the resulting
/// links must stay acyclic.
pub fn plan_menu_item_changes(
    menu_id: i64,
    existing: &[MenuItem],
    inputs: Vec<MenuItemInput>,
) -> ServiceResult<MenuItemChanges> {
    let existing_by_id: HashMap<i64, &MenuItem> = existing.iter().map(|i| (i.id, i)).collect();
    let mut changes = MenuItemChanges::default();

    for input in inputs {
        match input.id {
            Some(id) if input.is_deleted => {
                if existing_by_id.contains_key(&id) {
                    changes.deleted.push(id);
                }
            }
            Some(id) => {
                if existing_by_id.contains_key(&id) {
                    changes.updated.push(MenuItem {
                        id,
                        menu_id,
                        parent_id: input.parent_id,
                        menu_item_type_id: input.menu_item_type_id,
                        entity_id: input.entity_id,
                        title_en: input.title_en,
                        title_ar: input.title_ar,
                        url: input.url,
                        position: input.position,
                        is_active: input.is_active,
                    });
                }
            }
            None if input.is_deleted => {}
            None => changes.inserted.push(NewMenuItem::from_input(input)),
        }
    }

    let deleted: HashSet<i64> = changes.deleted.iter().copied().collect();
    let updated: HashMap<i64, Option<i64>> =
        changes.updated.iter().map(|i| (i.id, i.parent_id)).collect();

    // Final parent links of every stored item that survives the change set
    let surviving: Vec<(i64, Option<i64>)> = existing
        .iter()
        .filter(|i| !deleted.contains(&i.id))
        .map(|i| (i.id, updated.get(&i.id).copied().unwrap_or(i.parent_id)))
        .collect();
    let hierarchy = Hierarchy::from_links(surviving.iter().copied());

    for (id, parent_id) in &surviving {
        if let Some(parent_id) = parent_id {
            if parent_id == id {
                return Err(ServiceError::InvalidMenuItemParent {
                    parent_id: *parent_id,
                    reason: "a menu item cannot be its own parent".to_string(),
                });
            }
            if !hierarchy.contains(*parent_id) {
                return Err(ServiceError::InvalidMenuItemParent {
                    parent_id: *parent_id,
                    reason: format!("parent does not exist in menu {}", menu_id),
                });
            }
        }
    }

    for item in &changes.inserted {
        if let Some(parent_id) = item.parent_id {
            if !hierarchy.contains(parent_id) {
                return Err(ServiceError::InvalidMenuItemParent {
                    parent_id,
                    reason: format!("parent does not exist in menu {}", menu_id),
                });
            }
        }
    }

    if let Some(id) = hierarchy.find_cycle() {
        return Err(ServiceError::InvalidMenuItemParent {
            parent_id: hierarchy.parent_of(id).unwrap_or(id),
            reason: "menu item parents form a cycle".to_string(),
        });
    }

    Ok(changes)
}
