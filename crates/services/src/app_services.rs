use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::assessment::AssessmentService;
use crate::catalog_service::CatalogService;
use crate::news_service::NewsService;
use crate::save_registry::SaveRegistry;

/// Assembles app-facing services over one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    catalog: CatalogService,
    saves: SaveRegistry,
    assessment: AssessmentService,
    news: NewsService,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, news: NewsService) -> Self {
        let saves = SaveRegistry::new(
            clock,
            Arc::clone(&storage.saved),
            Arc::clone(&storage.items),
        );
        let catalog = CatalogService::new(
            Arc::clone(&storage.items),
            Arc::clone(&storage.articles),
            saves.clone(),
        );
        let assessment = AssessmentService::new(
            clock,
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.statistics),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.articles),
        );
        Self {
            catalog,
            saves,
            assessment,
            news,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    #[must_use]
    pub fn saves(&self) -> &SaveRegistry {
        &self.saves
    }

    #[must_use]
    pub fn assessment(&self) -> &AssessmentService {
        &self.assessment
    }

    #[must_use]
    pub fn news(&self) -> &NewsService {
        &self.news
    }
}
