#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

use storefront_rs::auth::{hash_password, JwtManager};
use storefront_rs::handlers::RequestLimits;
use storefront_rs::models::{
    Address, AddressForm, AddressType, Banner, BannerCode, Cart, CartItem, CartItemRecord,
    Category, Checkout, Country, District, Menu, MenuItem, MenuItemChanges, NewMenuItem,
    NewOrder, NewUser, Order, OrderItem, PaymentProvider, PriceRange, Product, ProductAttribute,
    ProductCategory, ProductListItem, ProductQuery, ProductSummary, ProductTag, RepositoryError,
    RepositoryResult, Role, ShippingData, StateOrProvince, TagMapping, User, UserAddress,
    WishList, WishListItem, COD_PROVIDER_ID,
};
use storefront_rs::observability::BusinessTracingMiddleware;
use storefront_rs::repositories::{
    AddressRepository, BannerRepository, CartRepository, CategoryRepository, CheckoutRepository,
    MenuRepository, OrderRepository, PaymentProviderRepository, ProductRepository, TagRepository,
    UserRepository, WishListRepository,
};
use storefront_rs::services::{
    AccountService, AccountSettings, BannerService, CartService, CategoryService,
    CheckoutService, LoggingEmailSender, MenuService, OrderService, PaymentService, TagService,
    WishListService,
};
use storefront_rs::{create_app, AppServices, Metrics};

pub const ADMIN_ID: i64 = 1;
pub const CUSTOMER_ID: i64 = 2;
pub const OTHER_CUSTOMER_ID: i64 = 3;
pub const PASSWORD: &str = "Sup3r-Secret";

pub const ROOT_CATEGORY_ID: i64 = 10;
pub const CHILD_CATEGORY_ID: i64 = 11;
/// Two categories whose parents point at each other
pub const LOOPING_CATEGORY_IDS: (i64, i64) = (20, 21);

pub const LAMP_ID: i64 = 100;
pub const DESK_ID: i64 = 101;
pub const HIDDEN_PRODUCT_ID: i64 = 102;

#[derive(Default)]
struct StoreState {
    next_id: i64,
    categories: Vec<Category>,
    product_categories: Vec<ProductCategory>,
    products: Vec<Product>,
    attributes: Vec<(i64, ProductAttribute)>,
    banners: Vec<Banner>,
    menus: Vec<Menu>,
    menu_items: Vec<MenuItem>,
    tags: Vec<ProductTag>,
    tag_mappings: Vec<TagMapping>,
    cart_items: Vec<CartItemRecord>,
    wishlists: Vec<WishList>,
    wishlist_items: Vec<(i64, i64, i32)>,
    checkouts: HashMap<Uuid, Checkout>,
    orders: Vec<Order>,
    providers: Vec<PaymentProvider>,
    users: Vec<User>,
    addresses: Vec<UserAddress>,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn product(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// Every repository trait backed by one mutex-guarded state
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

fn category(id: i64, parent_id: Option<i64>, slug: &str) -> Category {
    let now = Utc::now();
    Category {
        id,
        name: slug.replace('-', " "),
        slug: slug.to_string(),
        description: None,
        meta_title: None,
        meta_keywords: None,
        meta_description: None,
        display_order: id as i32,
        parent_id,
        include_in_menu: true,
        is_published: true,
        is_deleted: false,
        thumbnail_image_url: None,
        created_on: now,
        latest_updated_on: now,
    }
}

fn product(id: i64, name: &str, price: Decimal, stock: i32, is_published: bool) -> Product {
    Product {
        id,
        name: name.to_string(),
        slug: name.to_lowercase().replace(' ', "-"),
        description: Some(format!("{} for the home office", name)),
        short_description: None,
        price,
        old_price: None,
        stock_quantity: stock,
        display_order: id as i32,
        is_published,
        is_visible_individually: true,
        is_deleted: false,
        thumbnail_image_url: Some(format!("{}.jpg", id)),
    }
}

fn user(id: i64, email: &str, full_name: &str, roles: Vec<Role>) -> User {
    User {
        id,
        user_guid: Uuid::new_v4(),
        email: email.to_string(),
        full_name: full_name.to_string(),
        password_hash: hash_password(PASSWORD).unwrap(),
        culture: Some("en-US".to_string()),
        roles,
        default_shipping_address_id: None,
        default_billing_address_id: None,
        refresh_token: None,
        password_reset_token: None,
        password_reset_expires: None,
        created_on: Utc::now(),
    }
}

pub fn address_form(contact_name: &str) -> AddressForm {
    AddressForm {
        contact_name: contact_name.to_string(),
        phone: "555-0100".to_string(),
        address_line1: "1 Market Street".to_string(),
        address_line2: None,
        city: Some("Springfield".to_string()),
        zip_code: Some("12345".to_string()),
        district_id: Some(7),
        state_or_province_id: 5,
        country_id: "US".to_string(),
    }
}

impl InMemoryStore {
    /// A small catalog with an admin, two customers and cash on delivery enabled
    pub fn seeded() -> Self {
        let mut state = StoreState {
            next_id: 1000,
            ..StoreState::default()
        };

        state.categories = vec![
            category(ROOT_CATEGORY_ID, None, "furniture"),
            category(CHILD_CATEGORY_ID, Some(ROOT_CATEGORY_ID), "desks"),
            category(LOOPING_CATEGORY_IDS.0, Some(LOOPING_CATEGORY_IDS.1), "broken-a"),
            category(LOOPING_CATEGORY_IDS.1, Some(LOOPING_CATEGORY_IDS.0), "broken-b"),
        ];
        state.products = vec![
            product(LAMP_ID, "Desk Lamp", dec!(20), 50, true),
            product(DESK_ID, "Standing Desk", dec!(400), 2, true),
            product(HIDDEN_PRODUCT_ID, "Prototype Chair", dec!(90), 10, false),
        ];
        state.product_categories = vec![
            ProductCategory {
                id: 1,
                product_id: LAMP_ID,
                category_id: ROOT_CATEGORY_ID,
                is_featured_product: false,
                display_order: 1,
            },
            ProductCategory {
                id: 2,
                product_id: DESK_ID,
                category_id: CHILD_CATEGORY_ID,
                is_featured_product: true,
                display_order: 2,
            },
        ];
        state.attributes = vec![
            (
                LAMP_ID,
                ProductAttribute {
                    name: "Color".to_string(),
                    value: "Black".to_string(),
                },
            ),
            (
                DESK_ID,
                ProductAttribute {
                    name: "Color".to_string(),
                    value: "Oak".to_string(),
                },
            ),
        ];
        state.users = vec![
            user(ADMIN_ID, "admin@example.com", "Ada Admin", vec![Role::Admin]),
            user(CUSTOMER_ID, "shopper@example.com", "Sam Shopper", vec![Role::Customer]),
            user(OTHER_CUSTOMER_ID, "other@example.com", "Olu Other", vec![Role::Customer]),
        ];
        state.addresses = vec![UserAddress {
            id: 500,
            user_id: CUSTOMER_ID,
            address_type: AddressType::Shipping,
            address: Address {
                id: 600,
                contact_name: "Sam Shopper".to_string(),
                phone: "555-0100".to_string(),
                address_line1: "1 Market Street".to_string(),
                address_line2: None,
                city: Some("Springfield".to_string()),
                zip_code: Some("12345".to_string()),
                district_id: Some(7),
                state_or_province_id: 5,
                country_id: "US".to_string(),
            },
        }];
        state.providers = vec![PaymentProvider {
            id: COD_PROVIDER_ID.to_string(),
            name: "Cash On Delivery".to_string(),
            is_enabled: true,
            landing_view_component_name: "CoDLanding".to_string(),
            additional_settings: Some(json!({
                "MinOrderValue": 10,
                "MaxOrderValue": 500,
                "PaymentFee": 2,
            })),
        }];

        Self {
            state: Mutex::new(state),
        }
    }

    pub fn cart_lines(&self, customer_id: i64) -> Vec<CartItemRecord> {
        let state = self.state.lock().unwrap();
        state
            .cart_items
            .iter()
            .filter(|item| item.customer_id == customer_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_all(&self) -> RepositoryResult<Vec<Category>> {
        let state = self.state.lock().unwrap();
        let mut categories: Vec<Category> = state
            .categories
            .iter()
            .filter(|c| !c.is_deleted)
            .cloned()
            .collect();
        categories.sort_by_key(|c| c.display_order);
        Ok(categories)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .find(|c| c.id == id && !c.is_deleted)
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> RepositoryResult<Option<Category>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .find(|c| c.slug == slug && !c.is_deleted)
            .cloned())
    }

    async fn find_children(&self, parent_id: i64) -> RepositoryResult<Vec<Category>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .filter(|c| c.parent_id == Some(parent_id) && !c.is_deleted)
            .cloned()
            .collect())
    }

    async fn find_parent_links(&self) -> RepositoryResult<Vec<(i64, Option<i64>)>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .filter(|c| !c.is_deleted)
            .map(|c| (c.id, c.parent_id))
            .collect())
    }

    async fn create(&self, mut category: Category) -> RepositoryResult<Category> {
        let mut state = self.state.lock().unwrap();
        if state.categories.iter().any(|c| c.slug == category.slug) {
            return Err(RepositoryError::ConstraintViolation {
                message: format!("Slug {} is already used", category.slug),
            });
        }
        category.id = state.next_id();
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn update(&self, category: Category) -> RepositoryResult<Category> {
        let mut state = self.state.lock().unwrap();
        let slot = state
            .categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = category.clone();
        Ok(category)
    }

    async fn soft_delete(&self, id: i64) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(category) = state.categories.iter_mut().find(|c| c.id == id) {
            category.is_deleted = true;
        }
        Ok(())
    }

    async fn find_banners(&self, _category_id: i64) -> RepositoryResult<Vec<Banner>> {
        Ok(Vec::new())
    }

    async fn find_product_category(&self, id: i64) -> RepositoryResult<Option<ProductCategory>> {
        let state = self.state.lock().unwrap();
        Ok(state.product_categories.iter().find(|l| l.id == id).cloned())
    }

    async fn update_product_category(&self, link: ProductCategory) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.product_categories.iter_mut().find(|l| l.id == link.id) {
            *slot = link;
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let state = self.state.lock().unwrap();
        Ok(state.product(id).cloned())
    }

    async fn find_listing(
        &self,
        query: &ProductQuery,
    ) -> RepositoryResult<(Vec<ProductListItem>, i64)> {
        let state = self.state.lock().unwrap();
        let matching: Vec<ProductListItem> = state
            .products
            .iter()
            .filter(|p| p.is_available() && p.is_visible_individually)
            .filter(|p| query.matches_price(p.price))
            .filter(|p| {
                state.product_categories.iter().any(|link| {
                    link.product_id == p.id && query.category_ids.contains(&link.category_id)
                })
            })
            .map(|p| {
                let attributes: Vec<ProductAttribute> = state
                    .attributes
                    .iter()
                    .filter(|(product_id, _)| *product_id == p.id)
                    .map(|(_, attr)| attr.clone())
                    .collect();
                ProductListItem {
                    id: p.id,
                    name: p.name.clone(),
                    description: p.description.clone(),
                    slug: p.slug.clone(),
                    price: p.price,
                    old_price: p.old_price,
                    stock_quantity: p.stock_quantity,
                    thumbnail_image_url: p.thumbnail_image_url.clone(),
                    media_urls: Vec::new(),
                    attributes,
                }
            })
            .filter(|item| query.matches_attributes(&item.attributes))
            .collect();

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_attribute_values(
        &self,
        category_ids: &[i64],
    ) -> RepositoryResult<Vec<ProductAttribute>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .attributes
            .iter()
            .filter(|(product_id, _)| {
                state.product_categories.iter().any(|link| {
                    link.product_id == *product_id && category_ids.contains(&link.category_id)
                })
            })
            .map(|(_, attr)| attr.clone())
            .collect())
    }

    async fn find_price_range(&self, category_ids: &[i64]) -> RepositoryResult<PriceRange> {
        let state = self.state.lock().unwrap();
        let prices: Vec<Decimal> = state
            .products
            .iter()
            .filter(|p| p.is_available())
            .filter(|p| {
                state
                    .product_categories
                    .iter()
                    .any(|link| link.product_id == p.id && category_ids.contains(&link.category_id))
            })
            .map(|p| p.price)
            .collect();

        Ok(PriceRange {
            min: prices.iter().copied().min().unwrap_or(Decimal::ZERO),
            max: prices.iter().copied().max().unwrap_or(Decimal::ZERO),
        })
    }

    async fn find_by_tag(&self, tag_id: i64) -> RepositoryResult<Vec<ProductSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tag_mappings
            .iter()
            .filter(|m| m.product_tag_id == tag_id)
            .filter_map(|m| state.product(m.product_id))
            .map(ProductSummary::from)
            .collect())
    }
}

#[async_trait]
impl BannerRepository for InMemoryStore {
    async fn find_page_type(&self, code: &str) -> RepositoryResult<Option<BannerCode>> {
        Ok((code == "Home").then(|| BannerCode {
            id: 1,
            code: code.to_string(),
            name: "Home page".to_string(),
        }))
    }

    async fn find_banner_type(&self, code: &str) -> RepositoryResult<Option<BannerCode>> {
        Ok((code == "Slider").then(|| BannerCode {
            id: 1,
            code: code.to_string(),
            name: "Slider".to_string(),
        }))
    }

    async fn find_by_types(
        &self,
        page_type_id: i64,
        banner_type_id: i64,
    ) -> RepositoryResult<Vec<Banner>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .banners
            .iter()
            .filter(|b| b.page_type_id == page_type_id && b.banner_type_id == banner_type_id)
            .cloned()
            .collect())
    }

    async fn create(&self, mut banner: Banner) -> RepositoryResult<Banner> {
        let mut state = self.state.lock().unwrap();
        banner.id = state.next_id();
        state.banners.push(banner.clone());
        Ok(banner)
    }
}

#[async_trait]
impl MenuRepository for InMemoryStore {
    async fn find_active(&self) -> RepositoryResult<Vec<Menu>> {
        let state = self.state.lock().unwrap();
        Ok(state.menus.iter().filter(|m| m.is_active).cloned().collect())
    }

    async fn find_active_by_type(&self, menu_type_id: i64) -> RepositoryResult<Option<Menu>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .menus
            .iter()
            .find(|m| m.is_active && m.menu_type_id == menu_type_id)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Menu>> {
        let state = self.state.lock().unwrap();
        Ok(state.menus.iter().find(|m| m.id == id).cloned())
    }

    async fn find_items(&self, menu_ids: &[i64]) -> RepositoryResult<Vec<MenuItem>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .menu_items
            .iter()
            .filter(|item| menu_ids.contains(&item.menu_id))
            .cloned()
            .collect())
    }

    async fn create(&self, mut menu: Menu, items: Vec<NewMenuItem>) -> RepositoryResult<Menu> {
        let mut state = self.state.lock().unwrap();
        menu.id = state.next_id();
        for item in items {
            let id = state.next_id();
            state.menu_items.push(MenuItem {
                id,
                menu_id: menu.id,
                parent_id: item.parent_id,
                menu_item_type_id: item.menu_item_type_id,
                entity_id: item.entity_id,
                title_en: item.title_en,
                title_ar: item.title_ar,
                url: item.url,
                position: item.position,
                is_active: item.is_active,
            });
        }
        state.menus.push(menu.clone());
        Ok(menu)
    }

    async fn update(&self, menu: Menu, changes: MenuItemChanges) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(slot) = state.menus.iter_mut().find(|m| m.id == menu.id) {
            *slot = menu.clone();
        }
        state
            .menu_items
            .retain(|item| !changes.deleted.contains(&item.id));
        for updated in changes.updated {
            if let Some(slot) = state.menu_items.iter_mut().find(|i| i.id == updated.id) {
                *slot = updated;
            }
        }
        for item in changes.inserted {
            let id = state.next_id();
            state.menu_items.push(MenuItem {
                id,
                menu_id: menu.id,
                parent_id: item.parent_id,
                menu_item_type_id: item.menu_item_type_id,
                entity_id: item.entity_id,
                title_en: item.title_en,
                title_ar: item.title_ar,
                url: item.url,
                position: item.position,
                is_active: item.is_active,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ProductTag>> {
        let state = self.state.lock().unwrap();
        Ok(state.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn create(&self, mut tag: ProductTag) -> RepositoryResult<ProductTag> {
        let mut state = self.state.lock().unwrap();
        tag.id = state.next_id();
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.tags.len();
        state.tags.retain(|t| t.id != id);
        state.tag_mappings.retain(|m| m.product_tag_id != id);
        Ok(state.tags.len() < before)
    }

    async fn mapping_exists(&self, mapping: TagMapping) -> RepositoryResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.tag_mappings.contains(&mapping))
    }

    async fn add_mapping(&self, mapping: TagMapping) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.tag_mappings.contains(&mapping) {
            return Err(RepositoryError::ConstraintViolation {
                message: "Duplicate tag mapping".to_string(),
            });
        }
        state.tag_mappings.push(mapping);
        Ok(())
    }

    async fn remove_mapping(&self, mapping: TagMapping) -> RepositoryResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.tag_mappings.len();
        state.tag_mappings.retain(|m| *m != mapping);
        Ok(state.tag_mappings.len() < before)
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn find_cart(&self, customer_id: i64) -> RepositoryResult<Cart> {
        let state = self.state.lock().unwrap();
        let items = state
            .cart_items
            .iter()
            .filter(|item| item.customer_id == customer_id)
            .filter_map(|item| {
                state.product(item.product_id).map(|product| CartItem {
                    id: item.id,
                    product_id: product.id,
                    product_name: product.name.clone(),
                    product_image: product.thumbnail_image_url.clone(),
                    unit_price: product.price,
                    quantity: item.quantity,
                    is_available: product.is_available(),
                    created_on: item.created_on,
                })
            })
            .collect();

        Ok(Cart { customer_id, items })
    }

    async fn find_item(
        &self,
        customer_id: i64,
        item_id: i64,
    ) -> RepositoryResult<Option<CartItemRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .cart_items
            .iter()
            .find(|item| item.id == item_id && item.customer_id == customer_id)
            .cloned())
    }

    async fn add_item(
        &self,
        customer_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> RepositoryResult<CartItemRecord> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();

        if let Some(existing) = state
            .cart_items
            .iter_mut()
            .find(|item| item.customer_id == customer_id && item.product_id == product_id)
        {
            existing.quantity += quantity;
            existing.latest_updated_on = now;
            return Ok(existing.clone());
        }

        let record = CartItemRecord {
            id: state.next_id(),
            customer_id,
            product_id,
            quantity,
            created_on: now,
            latest_updated_on: now,
        };
        state.cart_items.push(record.clone());
        Ok(record)
    }

    async fn update_quantity(&self, item_id: i64, quantity: i32) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(item) = state.cart_items.iter_mut().find(|item| item.id == item_id) {
            item.quantity = quantity;
        }
        Ok(())
    }

    async fn remove_item(&self, customer_id: i64, item_id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.cart_items.len();
        state
            .cart_items
            .retain(|item| !(item.id == item_id && item.customer_id == customer_id));
        Ok(state.cart_items.len() < before)
    }

    async fn clear(&self, customer_id: i64) -> RepositoryResult<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.cart_items.len();
        state.cart_items.retain(|item| item.customer_id != customer_id);
        Ok((before - state.cart_items.len()) as u64)
    }
}

#[async_trait]
impl WishListRepository for InMemoryStore {
    async fn find_by_user(&self, user_id: i64) -> RepositoryResult<Option<WishList>> {
        let state = self.state.lock().unwrap();
        Ok(state.wishlists.iter().find(|w| w.user_id == user_id).cloned())
    }

    async fn create(&self, user_id: i64) -> RepositoryResult<WishList> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let wishlist = WishList {
            id: state.next_id(),
            user_id,
            created_on: now,
            latest_updated_on: now,
        };
        state.wishlists.push(wishlist.clone());
        Ok(wishlist)
    }

    async fn find_items(&self, wish_list_id: i64) -> RepositoryResult<Vec<WishListItem>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .wishlist_items
            .iter()
            .filter(|(wl, _, _)| *wl == wish_list_id)
            .filter_map(|(wl, product_id, quantity)| {
                state.product(*product_id).map(|product| WishListItem {
                    id: product.id,
                    wish_list_id: *wl,
                    product_id: product.id,
                    product_name: product.name.clone(),
                    price: product.price,
                    old_price: product.old_price,
                    product_image: product.thumbnail_image_url.clone(),
                    quantity: *quantity,
                    created_on: Utc::now(),
                })
            })
            .collect())
    }

    async fn contains(&self, wish_list_id: i64, product_id: i64) -> RepositoryResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .wishlist_items
            .iter()
            .any(|(wl, p, _)| *wl == wish_list_id && *p == product_id))
    }

    async fn add_item(
        &self,
        wish_list_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        state.wishlist_items.push((wish_list_id, product_id, quantity));
        Ok(())
    }

    async fn remove_item(&self, wish_list_id: i64, product_id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.wishlist_items.len();
        state
            .wishlist_items
            .retain(|(wl, p, _)| !(*wl == wish_list_id && *p == product_id));
        Ok(state.wishlist_items.len() < before)
    }
}

#[async_trait]
impl CheckoutRepository for InMemoryStore {
    async fn create(&self, checkout: &Checkout) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        state.checkouts.insert(checkout.id, checkout.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Checkout>> {
        let state = self.state.lock().unwrap();
        Ok(state.checkouts.get(&id).cloned())
    }

    async fn save_shipping(&self, id: Uuid, shipping_data: &ShippingData) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        let checkout = state.checkouts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        checkout.shipping_method = Some(shipping_data.shipping_method.clone());
        checkout.shipping_data = Some(shipping_data.clone());
        Ok(())
    }

    async fn update_prices(
        &self,
        id: Uuid,
        shipping_amount: Decimal,
        tax_amount: Decimal,
    ) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        let checkout = state.checkouts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        checkout.shipping_amount = Some(shipping_amount);
        checkout.tax_amount = Some(tax_amount);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create_from_checkout(&self, order: NewOrder) -> RepositoryResult<Order> {
        let mut state = self.state.lock().unwrap();

        let completed = state
            .checkouts
            .get(&order.checkout_id)
            .map_or(true, |c| c.is_completed);
        if completed {
            return Err(RepositoryError::ConstraintViolation {
                message: format!("Checkout {} is already completed", order.checkout_id),
            });
        }
        for item in &order.items {
            let in_stock = state
                .product(item.product_id)
                .map_or(false, |p| p.has_stock_for(item.quantity));
            if !in_stock {
                return Err(RepositoryError::ConstraintViolation {
                    message: format!("Insufficient stock for product {}", item.product_id),
                });
            }
        }

        for item in &order.items {
            if let Some(product) = state.products.iter_mut().find(|p| p.id == item.product_id) {
                product.stock_quantity -= item.quantity;
            }
        }
        if let Some(checkout) = state.checkouts.get_mut(&order.checkout_id) {
            checkout.is_completed = true;
        }
        state
            .cart_items
            .retain(|item| item.customer_id != order.customer_id);

        let id = state.next_id();
        let items = order
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| OrderItem {
                id: id * 100 + index as i64,
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                product_price: item.product_price,
                quantity: item.quantity,
                discount_amount: Decimal::ZERO,
                tax_amount: item.tax_amount,
                tax_percent: item.tax_percent,
            })
            .collect();

        let created = Order {
            id,
            customer_id: order.customer_id,
            checkout_id: Some(order.checkout_id),
            status: order.status,
            shipping_address: Some(order.shipping_address),
            billing_address: Some(order.billing_address),
            shipping_method: Some(order.shipping_method),
            payment_method: order.payment_method,
            payment_fee_amount: order.payment_fee_amount,
            sub_total: order.sub_total,
            discount_amount: order.discount_amount,
            tax_amount: order.tax_amount,
            shipping_fee_amount: order.shipping_fee_amount,
            order_total: order.order_total,
            coupon_code: order.coupon_code,
            order_note: order.order_note,
            created_on: Utc::now(),
            items,
        };
        state.orders.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Order>> {
        let state = self.state.lock().unwrap();
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_customer(&self, customer_id: i64) -> RepositoryResult<Vec<Order>> {
        let state = self.state.lock().unwrap();
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_on.cmp(&a.created_on));
        Ok(orders)
    }
}

#[async_trait]
impl PaymentProviderRepository for InMemoryStore {
    async fn find_enabled(&self) -> RepositoryResult<Vec<PaymentProvider>> {
        let state = self.state.lock().unwrap();
        Ok(state.providers.iter().filter(|p| p.is_enabled).cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<PaymentProvider>> {
        let state = self.state.lock().unwrap();
        Ok(state.providers.iter().find(|p| p.id == id).cloned())
    }

    async fn set_enabled(&self, id: &str, is_enabled: bool) -> RepositoryResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state.providers.iter_mut().find(|p| p.id == id) {
            Some(provider) => {
                provider.is_enabled = is_enabled;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> RepositoryResult<User> {
        let mut state = self.state.lock().unwrap();
        if state
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(RepositoryError::ConstraintViolation {
                message: "Email already registered".to_string(),
            });
        }

        let created = User {
            id: state.next_id(),
            user_guid: Uuid::new_v4(),
            email: new_user.email,
            full_name: new_user.full_name,
            password_hash: new_user.password_hash,
            culture: new_user.culture,
            roles: new_user.roles,
            default_shipping_address_id: None,
            default_billing_address_id: None,
            refresh_token: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_on: Utc::now(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn update_refresh_token(&self, id: i64, token: Option<String>) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.refresh_token = token;
        }
        Ok(())
    }

    async fn set_password_reset(
        &self,
        id: i64,
        token: &str,
        expires: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.password_reset_token = Some(token.to_string());
            user.password_reset_expires = Some(expires);
        }
        Ok(())
    }

    async fn reset_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
            user.password_reset_token = None;
            user.password_reset_expires = None;
        }
        Ok(())
    }

    async fn update_full_name(&self, id: i64, full_name: &str) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.full_name = full_name.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl AddressRepository for InMemoryStore {
    async fn find_user_addresses(
        &self,
        user_id: i64,
        address_type: AddressType,
    ) -> RepositoryResult<Vec<UserAddress>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .addresses
            .iter()
            .filter(|a| a.user_id == user_id && a.address_type == address_type)
            .cloned()
            .collect())
    }

    async fn find_user_address(
        &self,
        user_id: i64,
        user_address_id: i64,
    ) -> RepositoryResult<Option<UserAddress>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .addresses
            .iter()
            .find(|a| a.id == user_address_id && a.user_id == user_id)
            .cloned())
    }

    async fn add_user_address(
        &self,
        user_id: i64,
        address_type: AddressType,
        form: &AddressForm,
    ) -> RepositoryResult<UserAddress> {
        let mut state = self.state.lock().unwrap();
        let address_id = state.next_id();
        let id = state.next_id();
        let created = UserAddress {
            id,
            user_id,
            address_type,
            address: Address {
                id: address_id,
                contact_name: form.contact_name.clone(),
                phone: form.phone.clone(),
                address_line1: form.address_line1.clone(),
                address_line2: form.address_line2.clone(),
                city: form.city.clone(),
                zip_code: form.zip_code.clone(),
                district_id: form.district_id,
                state_or_province_id: form.state_or_province_id,
                country_id: form.country_id.clone(),
            },
        };
        state.addresses.push(created.clone());
        Ok(created)
    }

    async fn update_address(&self, address_id: i64, form: &AddressForm) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user_address) = state
            .addresses
            .iter_mut()
            .find(|a| a.address.id == address_id)
        {
            user_address.address.contact_name = form.contact_name.clone();
            user_address.address.phone = form.phone.clone();
            user_address.address.address_line1 = form.address_line1.clone();
        }
        Ok(())
    }

    async fn set_default_address(
        &self,
        user_id: i64,
        address_type: AddressType,
        user_address_id: i64,
    ) -> RepositoryResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            match address_type {
                AddressType::Shipping => user.default_shipping_address_id = Some(user_address_id),
                AddressType::Billing => user.default_billing_address_id = Some(user_address_id),
            }
        }
        Ok(())
    }

    async fn find_shipping_countries(&self) -> RepositoryResult<Vec<Country>> {
        Ok(vec![Country {
            id: "US".to_string(),
            name: "United States".to_string(),
            is_shipping_enabled: true,
        }])
    }

    async fn find_states(&self, country_id: &str) -> RepositoryResult<Vec<StateOrProvince>> {
        Ok(vec![StateOrProvince {
            id: 5,
            country_id: country_id.to_string(),
            name: "Oregon".to_string(),
        }])
    }

    async fn find_districts(&self, state_or_province_id: i64) -> RepositoryResult<Vec<District>> {
        Ok(vec![District {
            id: 7,
            state_or_province_id,
            name: "Multnomah".to_string(),
        }])
    }
}

/// A running server on an ephemeral port backed by [`InMemoryStore`]
pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub store: Arc<InMemoryStore>,
    pub jwt: Arc<JwtManager>,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::seeded());
        let jwt = Arc::new(JwtManager::new(
            "integration-test-signing-key-0123456789".to_string(),
            "storefront-rs".to_string(),
            "storefront-clients".to_string(),
            3600,
        ));
        let metrics = Arc::new(Metrics::new().unwrap());
        let tracer = Arc::new(BusinessTracingMiddleware::new(metrics.clone()));
        let pricing = storefront_rs::models::PricingRules {
            tax_percent: dec!(10),
            flat_shipping_fee: dec!(5),
            free_shipping_threshold: None,
        };

        let services = AppServices {
            category: Arc::new(CategoryService::new(
                store.clone(),
                store.clone(),
                tracer.clone(),
            )),
            banner: Arc::new(BannerService::new(store.clone())),
            menu: Arc::new(MenuService::new(store.clone())),
            tag: Arc::new(TagService::new(store.clone(), store.clone())),
            cart: Arc::new(CartService::new(store.clone(), store.clone(), tracer.clone())),
            wishlist: Arc::new(WishListService::new(store.clone(), store.clone())),
            checkout: Arc::new(CheckoutService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                pricing,
                tracer.clone(),
            )),
            payment: Arc::new(PaymentService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                pricing,
                tracer,
            )),
            order: Arc::new(OrderService::new(store.clone())),
            account: Arc::new(AccountService::new(
                store.clone(),
                store.clone(),
                jwt.clone(),
                Arc::new(LoggingEmailSender),
                AccountSettings {
                    password_reset_lifetime: chrono::Duration::hours(1),
                    frontend_url: "https://shop.example.com/".to_string(),
                    default_culture: "en-US".to_string(),
                },
            )),
        };

        let app = create_app(
            services,
            jwt.clone(),
            metrics,
            None,
            RequestLimits::default(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{}", addr),
            store,
            jwt,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer token for one of the seeded users
    pub async fn token_for(&self, user_id: i64) -> String {
        let user = UserRepository::find_by_id(self.store.as_ref(), user_id)
            .await
            .unwrap()
            .unwrap();
        self.jwt.generate_token(&user).unwrap()
    }
}
