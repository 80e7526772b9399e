use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{
    group_attribute_values, live_banners, Category, CategoryDetail, CategoryForm,
    CategoryListItem, CategoryPageResponse, Hierarchy, ProductListingParams,
    ProductListingResponse, ServiceError, ServiceResult, UpdateProductCategoryRequest, Validate,
};
use crate::observability::BusinessTracingMiddleware;
use crate::repositories::{CategoryRepository, ProductRepository};

/// Category tree maintenance and the storefront category pages
pub struct CategoryService {
    category_repository: Arc<dyn CategoryRepository>,
    product_repository: Arc<dyn ProductRepository>,
    tracer: Arc<BusinessTracingMiddleware>,
}

impl CategoryService {
    pub fn new(
        category_repository: Arc<dyn CategoryRepository>,
        product_repository: Arc<dyn ProductRepository>,
        tracer: Arc<BusinessTracingMiddleware>,
    ) -> Self {
        Self {
            category_repository,
            product_repository,
            tracer,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> ServiceResult<Vec<CategoryListItem>> {
        crate::info_with_trace!("Listing categories");

        let categories = self.category_repository.find_all().await?;
        Ok(categories.iter().map(CategoryListItem::from).collect())
    }

    #[instrument(skip(self), fields(category_id = id))]
    pub async fn get_category(&self, id: i64) -> ServiceResult<CategoryDetail> {
        let category = self.find_existing(id).await?;
        Ok(CategoryDetail::from(category))
    }

    /// Category page: the category, its published children and live banners
    #[instrument(skip(self))]
    pub async fn get_category_by_slug(&self, slug: Option<&str>) -> ServiceResult<CategoryPageResponse> {
        let slug = slug.map(str::trim).unwrap_or("");
        if slug.is_empty() {
            return Err(ServiceError::validation("Slug is required"));
        }

        self.tracer
            .trace_catalog_operation("category_by_slug", async {
                let category = self
                    .category_repository
                    .find_by_slug(slug)
                    .await?
                    .filter(|c| !c.is_deleted)
                    .ok_or_else(|| ServiceError::not_found("Category", slug))?;

                let children = self
                    .category_repository
                    .find_children(category.id)
                    .await?
                    .iter()
                    .filter(|child| child.is_visible())
                    .map(CategoryListItem::from)
                    .collect();

                let banners = self.category_repository.find_banners(category.id).await?;

                Ok(CategoryPageResponse {
                    banners: live_banners(banners, Utc::now()),
                    category: CategoryDetail::from(category),
                    children,
                })
            })
            .await
    }

    #[instrument(skip(self, form), fields(slug = %form.slug, parent_id = ?form.parent_id))]
    pub async fn create_category(&self, form: CategoryForm) -> ServiceResult<CategoryDetail> {
        crate::info_with_trace!("Creating category");

        form.validate()?;

        self.tracer
            .trace_catalog_operation("create_category", async {
                // The new category has no id yet, so only its parent chain can loop
                self.check_parent(0, form.parent_id).await?;

                let created = self.category_repository.create(Category::new(form)).await?;
                crate::info_with_trace!(category_id = created.id, "Category created");
                Ok(CategoryDetail::from(created))
            })
            .await
    }

    #[instrument(skip(self, form), fields(category_id = id, parent_id = ?form.parent_id))]
    pub async fn update_category(&self, id: i64, form: CategoryForm) -> ServiceResult<CategoryDetail> {
        crate::info_with_trace!("Updating category");

        form.validate()?;

        self.tracer
            .trace_catalog_operation("update_category", async {
                let mut category = self.find_existing(id).await?;
                self.check_parent(id, form.parent_id).await?;

                category.apply(form);
                let updated = self.category_repository.update(category).await?;
                Ok(CategoryDetail::from(updated))
            })
            .await
    }

    #[instrument(skip(self), fields(category_id = id))]
    pub async fn delete_category(&self, id: i64) -> ServiceResult<()> {
        crate::info_with_trace!("Deleting category");

        self.tracer
            .trace_catalog_operation("delete_category", async {
                self.find_existing(id).await?;

                let children = self.category_repository.find_children(id).await?;
                if children.iter().any(|child| !child.is_deleted) {
                    crate::warn_with_trace!(
                        child_count = children.len(),
                        "Refusing to delete category with children"
                    );
                    return Err(ServiceError::CategoryHasChildren { id });
                }

                self.category_repository.soft_delete(id).await?;
                Ok(())
            })
            .await
    }

    /// The category id followed by the ids of every category beneath it
    #[instrument(skip(self), fields(category_id = id))]
    pub async fn category_and_children_ids(&self, id: i64) -> ServiceResult<Vec<i64>> {
        let links = self.category_repository.find_parent_links().await?;
        Ok(Hierarchy::from_links(links).self_and_descendants(id))
    }

    /// Paged product listing for a category and everything beneath it
    #[instrument(skip(self, params), fields(category_id = id))]
    pub async fn list_products(
        &self,
        id: i64,
        params: ProductListingParams,
    ) -> ServiceResult<ProductListingResponse> {
        crate::info_with_trace!("Listing category products");

        self.tracer
            .trace_catalog_operation("list_products", async {
                self.find_existing(id).await?;

                let scope = self.category_and_children_ids(id).await?;
                let query = params.into_query(scope.clone())?;

                let (items, total_items) = self.product_repository.find_listing(&query).await?;
                let attributes = self.product_repository.find_attribute_values(&scope).await?;
                let price_range = self.product_repository.find_price_range(&scope).await?;

                Ok(ProductListingResponse {
                    page: query.page,
                    page_size: query.page_size,
                    total_items,
                    items,
                    available_filters: group_attribute_values(attributes),
                    price_range,
                })
            })
            .await
    }

    #[instrument(skip(self, request), fields(product_category_id = id))]
    pub async fn update_product_category(
        &self,
        id: i64,
        request: UpdateProductCategoryRequest,
    ) -> ServiceResult<()> {
        let mut link = self
            .category_repository
            .find_product_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("ProductCategory", id))?;

        link.is_featured_product = request.is_featured_product;
        link.display_order = request.display_order;

        self.category_repository.update_product_category(link).await?;
        Ok(())
    }

    async fn find_existing(&self, id: i64) -> ServiceResult<Category> {
        self.category_repository
            .find_by_id(id)
            .await?
            .filter(|c| !c.is_deleted)
            .ok_or(ServiceError::CategoryNotFound { id })
    }

    /// Reject a parent that is missing or would make the category its own ancestor
    async fn check_parent(&self, category_id: i64, parent_id: Option<i64>) -> ServiceResult<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };

        let cyclic = ServiceError::CyclicCategoryParent {
            category_id,
            parent_id,
        };
        if parent_id == category_id {
            return Err(cyclic);
        }

        let hierarchy = Hierarchy::from_links(self.category_repository.find_parent_links().await?);
        if !hierarchy.contains(parent_id) {
            return Err(ServiceError::validation(format!(
                "Parent category {} does not exist",
                parent_id
            )));
        }

        if hierarchy.creates_cycle(category_id, parent_id)
            || hierarchy.has_looping_ancestry(parent_id)
        {
            crate::warn_with_trace!(category_id, parent_id, "Circular category nesting rejected");
            return Err(cyclic);
        }

        Ok(())
    }
}
