#![forbid(unsafe_code)]

pub mod app_services;
pub mod assessment;
pub mod auth;
pub mod catalog_service;
pub mod error;
pub mod news_service;
pub mod save_registry;

pub use catalog_core::Clock;

pub use app_services::AppServices;
pub use assessment::{AssessmentService, ProgressEntry, QuizSession, QuizState, SessionError};
pub use auth::AuthContext;
pub use catalog_service::CatalogService;
pub use error::{ErrorKind, ServiceError};
pub use news_service::{
    NewsApiClient, NewsConfig, NewsError, NewsPage, NewsQuery, NewsService, NewsSortKey,
    NewsSource,
};
pub use save_registry::SaveRegistry;
