pub mod error;
pub mod handlers;
pub mod static_files;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::infra::cache::WorkbookCache;
use crate::infra::fs::files::default_workbook;
use crate::infra::fs::images::ImageLocator;
use crate::infra::workbook::repo::WorkbookRepo;
use crate::platform::config::Settings;
use crate::usecase::ports::repo::ReportRepository;
use crate::usecase::services::file_service::FileService;
use crate::usecase::services::lookup_service::LookupService;
use crate::usecase::services::report_service::ReportService;
use crate::usecase::services::sales_service::SalesService;

const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

pub struct AppState {
    pub excel_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub workbooks: Arc<WorkbookRepo>,
    pub reports: ReportService,
    pub lookups: LookupService,
    pub sales: SalesService,
    pub files: FileService,
    pub images: ImageLocator,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn from_settings(settings: &Settings) -> Self {
        let cache = Arc::new(
            WorkbookCache::new(settings.excel_dir.clone()).with_disk_cache(&settings.cache_dir),
        );
        let workbooks = Arc::new(WorkbookRepo::new(Arc::clone(&cache)));
        let repo: Arc<dyn ReportRepository> = workbooks.clone();
        let default_file = default_workbook(&settings.excel_dir);
        log::info!("default workbook: {default_file}");

        Self {
            excel_dir: settings.excel_dir.clone(),
            static_dir: Some(settings.static_dir.clone()),
            workbooks,
            reports: ReportService::new(Arc::clone(&repo)),
            lookups: LookupService::new(repo),
            sales: SalesService::new(settings.data_dir.clone()),
            files: FileService::new(cache, default_file),
            images: ImageLocator::new(
                settings.design_dir.clone(),
                settings.folder_mapping.clone(),
            ),
        }
    }

    /// The `filename` query parameter, or the default workbook.
    pub fn workbook(&self, filename: Option<String>) -> String {
        filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.files.default_workbook().to_string())
    }
}

fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/files", get(handlers::list_files))
        .route("/customers", get(handlers::customers))
        .route("/priority-customers", get(handlers::priority_customers))
        .route("/interviewers", get(handlers::interviewers_by_code))
        .route("/interviewers/:customer_cd", get(handlers::interviewers))
        .route("/designs/:customer_cd", get(handlers::designs))
        .route(
            "/reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route(
            "/reports/:management_number",
            get(handlers::get_report)
                .post(handlers::update_report)
                .delete(handlers::delete_report),
        )
        .route("/reports/:management_number/reply", patch(handlers::patch_reply))
        .route(
            "/reports/:management_number/comment",
            patch(handlers::patch_comment),
        )
        .route(
            "/reports/:management_number/approval",
            patch(handlers::patch_approval),
        )
        .route("/upload", post(handlers::upload_workbook))
        .route("/images/list", get(handlers::list_images))
        .route("/images/content", get(handlers::image_content))
        .route("/images/search", get(handlers::search_images))
        .route("/sales/upload", post(handlers::upload_sales))
        .route("/sales/all", get(handlers::all_sales))
        .route("/sales/:customer_code", get(handlers::customer_sales))
        .fallback(static_files::not_found)
}

/// API routes live only under `/api`, so front-end pages such as `/reports`
/// reach the static fallback. Unknown `/api` paths stay JSON 404s.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .fallback(static_files::spa_fallback)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
