use thiserror::Error;
use uuid::Uuid;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Category not found: {id}")]
    CategoryNotFound { id: i64 },

    #[error("Product not found: {id}")]
    ProductNotFound { id: i64 },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("Cart item not found: item_id={item_id}, customer_id={customer_id}")]
    CartItemNotFound { item_id: i64, customer_id: i64 },

    #[error("Checkout not found: {id}")]
    CheckoutNotFound { id: Uuid },

    #[error("Category {category_id} cannot use {parent_id} as parent: circular nesting")]
    CyclicCategoryParent { category_id: i64, parent_id: i64 },

    #[error("Invalid menu item parent {parent_id}: {reason}")]
    InvalidMenuItemParent { parent_id: i64, reason: String },

    #[error("Category {id} has child categories and cannot be deleted")]
    CategoryHasChildren { id: i64 },

    #[error("Cart is empty for customer: {customer_id}")]
    EmptyCart { customer_id: i64 },

    #[error("{message}")]
    PaymentNotEligible { message: String },

    #[error("Invalid login attempt")]
    InvalidCredentials,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Insufficient stock for product {product_id}: requested={requested}, available={available}")]
    InsufficientStock {
        product_id: i64,
        requested: i32,
        available: i32,
    },

    #[error("Product unavailable: {product_id}")]
    ProductUnavailable { product_id: i64 },

    #[error("Checkout already completed: {id}")]
    CheckoutCompleted { id: Uuid },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("External service error: {service}: {message}")]
    ExternalService { service: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ServiceError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::ValidationError {
            message: message.into(),
        }
    }
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("Item not found")]
    NotFound,

    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Stored data is corrupted: {message}")]
    DataCorruption { message: String },

    #[error("Invalid query parameters: {message}")]
    InvalidQuery { message: String },

    #[error("Transaction failed: {message}")]
    TransactionFailed { message: String },

    #[error("Timeout occurred during operation")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::PoolTimedOut => RepositoryError::Timeout,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                RepositoryError::ConnectionFailed
            }
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation() =>
            {
                RepositoryError::ConstraintViolation {
                    message: db_err.message().to_string(),
                }
            }
            sqlx::Error::ColumnDecode { index, source } => RepositoryError::DataCorruption {
                message: format!("column {}: {}", index, source),
            },
            other => RepositoryError::Database {
                message: other.to_string(),
            },
        }
    }
}

/// Validation errors for input data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Invalid field value: {field}={value}, reason={reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field too long: {field}, max_length={max_length}, actual_length={actual_length}")]
    TooLong {
        field: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("Field too short: {field}, min_length={min_length}, actual_length={actual_length}")]
    TooShort {
        field: String,
        min_length: usize,
        actual_length: usize,
    },

    #[error("Invalid format: {field}, expected={expected}")]
    InvalidFormat { field: String, expected: String },

    #[error("Value out of range: {field}, min={min}, max={max}, value={value}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
        value: String,
    },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
