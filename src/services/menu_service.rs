use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    plan_menu_item_changes, CreateMenuRequest, IdResponse, Menu, MenuItem, MenuLookup,
    MenuResponse, ServiceError, ServiceResult, UpdateMenuRequest, Validate, ALL_MENU_TYPES,
};
use crate::repositories::MenuRepository;

/// Navigation menus and their nested items
pub struct MenuService {
    repository: Arc<dyn MenuRepository>,
}

impl MenuService {
    pub fn new(repository: Arc<dyn MenuRepository>) -> Self {
        Self { repository }
    }

    /// The first active menu of a type, or every active menu for the wildcard type
    #[instrument(skip(self))]
    pub async fn get_by_type(&self, menu_type_id: i64) -> ServiceResult<MenuLookup> {
        crate::info_with_trace!("Getting menus by type");

        if menu_type_id == ALL_MENU_TYPES {
            let menus = self.repository.find_active().await?;
            if menus.is_empty() {
                return Err(ServiceError::not_found("Menu", menu_type_id));
            }

            let ids: Vec<i64> = menus.iter().map(|m| m.id).collect();
            let mut items_by_menu: HashMap<i64, Vec<MenuItem>> = HashMap::new();
            for item in self.repository.find_items(&ids).await? {
                items_by_menu.entry(item.menu_id).or_default().push(item);
            }

            let responses = menus
                .into_iter()
                .map(|menu| {
                    let items = items_by_menu.remove(&menu.id).unwrap_or_default();
                    MenuResponse::build(menu, items)
                })
                .collect();
            return Ok(MenuLookup::All(responses));
        }

        let menu = self
            .repository
            .find_active_by_type(menu_type_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Menu", menu_type_id))?;
        let items = self.repository.find_items(&[menu.id]).await?;

        Ok(MenuLookup::Single(MenuResponse::build(menu, items)))
    }

    #[instrument(skip(self, request), fields(code = %request.code, menu_type_id = request.menu_type_id))]
    pub async fn create_menu(&self, request: CreateMenuRequest) -> ServiceResult<IdResponse> {
        crate::info_with_trace!("Creating menu");

        request.validate()?;

        // Nothing is stored for a new menu, so any parent reference is rejected here
        let changes = plan_menu_item_changes(0, &[], request.items)?;

        let now = Utc::now();
        let menu = Menu {
            id: 0,
            menu_type_id: request.menu_type_id,
            code: request.code.trim().to_string(),
            name: request.name.trim().to_string(),
            is_active: request.is_active,
            created_on: now,
            modified_on: now,
        };

        let created = self.repository.create(menu, changes.inserted).await?;
        crate::info_with_trace!(menu_id = created.id, "Menu created");
        Ok(IdResponse { id: created.id })
    }

    #[instrument(skip(self, request), fields(menu_id = id))]
    pub async fn update_menu(&self, id: i64, request: UpdateMenuRequest) -> ServiceResult<IdResponse> {
        crate::info_with_trace!("Updating menu");

        request.validate()?;

        let mut menu = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Menu", id))?;

        let existing = self.repository.find_items(&[id]).await?;
        let changes = plan_menu_item_changes(id, &existing, request.items)?;
        crate::info_with_trace!(
            deleted = changes.deleted.len(),
            updated = changes.updated.len(),
            inserted = changes.inserted.len(),
            "Applying menu item changes"
        );

        menu.name = request.name.trim().to_string();
        menu.is_active = request.is_active;
        menu.modified_on = Utc::now();

        self.repository.update(menu, changes).await?;
        Ok(IdResponse { id })
    }
}
