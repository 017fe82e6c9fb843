use axum::extract::{Multipart, Path, Query, Request, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::entities::lookup::{ImageResults, PriorityCustomer};
use crate::domain::entities::report::{
    ApprovalPatch, CommentPatch, Record, ReplyPatch, ReportInput,
};
use crate::domain::entities::sales::SalesSummary;
use crate::platform::blocking::run_blocking;
use crate::platform::http::error::ApiError;
use crate::platform::http::static_files::serve_file;
use crate::platform::http::SharedState;
use crate::usecase::ports::repo::StoreError;
use crate::usecase::services::file_service::FileListing;
use crate::usecase::services::lookup_service::DeliveryFilter;
use crate::usecase::services::sales_service::CustomerSales;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InterviewerQuery {
    pub customer_code: String,
    pub filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub filename: Option<String>,
    /// Accepted for compatibility; the delivery name alone decides the filter.
    pub customer_name: Option<String>,
    pub delivery_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageListQuery {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct ImagePathQuery {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageSearchQuery {
    pub query: String,
    pub filename: Option<String>,
}

/// First multipart field named `file`: its client file name and bytes.
async fn read_file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), StoreError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| StoreError::Validation(format!("invalid multipart body: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| StoreError::Validation(format!("failed to read upload: {err}")))?;
        return Ok((name, bytes.to_vec()));
    }
    Err(StoreError::Validation("missing 'file' field".to_string()))
}

pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "message": "Daily Report API is running",
        "excel_dir": state.excel_dir.display().to_string(),
    }))
}

pub async fn list_files(State(state): State<SharedState>) -> ApiResult<FileListing> {
    let listing = run_blocking(move || state.files.list_files()).await?;
    Ok(Json(listing))
}

pub async fn customers(
    State(state): State<SharedState>,
    Query(query): Query<FileQuery>,
) -> ApiResult<Vec<Record>> {
    let file = state.workbook(query.filename);
    let records = run_blocking(move || state.reports.customers(&file)).await?;
    Ok(Json(records))
}

pub async fn priority_customers(
    State(state): State<SharedState>,
    Query(query): Query<FileQuery>,
) -> ApiResult<Vec<PriorityCustomer>> {
    let file = state.workbook(query.filename);
    let customers = run_blocking(move || state.lookups.priority_customers(&file)).await?;
    Ok(Json(customers))
}

pub async fn interviewers_by_code(
    State(state): State<SharedState>,
    Query(query): Query<InterviewerQuery>,
) -> ApiResult<Vec<String>> {
    let file = state.workbook(query.filename);
    let names = run_blocking(move || {
        state
            .lookups
            .interviewers(&file, &query.customer_code, &DeliveryFilter::Any)
    })
    .await?;
    Ok(Json(names))
}

pub async fn interviewers(
    State(state): State<SharedState>,
    Path(customer_cd): Path<String>,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<Value> {
    log::debug!(
        "interviewers for {customer_cd} (customer_name={:?}, delivery_name={:?})",
        query.customer_name,
        query.delivery_name
    );
    let file = state.workbook(query.filename);
    let delivery = DeliveryFilter::from_query(query.delivery_name.as_deref());
    let code = customer_cd.clone();
    let names =
        run_blocking(move || state.lookups.interviewers(&file, &code, &delivery)).await?;
    Ok(Json(json!({ "customer_cd": customer_cd, "interviewers": names })))
}

pub async fn designs(
    State(state): State<SharedState>,
    Path(customer_cd): Path<String>,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<Value> {
    let file = state.workbook(query.filename);
    let code = customer_cd.clone();
    let designs = run_blocking(move || {
        state
            .lookups
            .designs(&file, &code, query.delivery_name.as_deref())
    })
    .await?;
    Ok(Json(json!({ "customer_cd": customer_cd, "designs": designs })))
}

pub async fn list_reports(
    State(state): State<SharedState>,
    Query(query): Query<FileQuery>,
) -> ApiResult<Vec<Record>> {
    let file = state.workbook(query.filename);
    let records = run_blocking(move || state.reports.list_reports(&file)).await?;
    Ok(Json(records))
}

pub async fn get_report(
    State(state): State<SharedState>,
    Path(management_number): Path<i64>,
    Query(query): Query<FileQuery>,
) -> ApiResult<Record> {
    let file = state.workbook(query.filename);
    let record =
        run_blocking(move || state.reports.get_report(&file, management_number)).await?;
    Ok(Json(record))
}

pub async fn create_report(
    State(state): State<SharedState>,
    Query(query): Query<FileQuery>,
    Json(input): Json<ReportInput>,
) -> ApiResult<Value> {
    let file = state.workbook(query.filename);
    let file_path = state.excel_dir.join(&file).display().to_string();
    let number = run_blocking(move || state.reports.create_report(&file, &input)).await?;
    Ok(Json(json!({
        "message": "Report added successfully",
        "management_number": number,
        "file_path": file_path,
    })))
}

pub async fn update_report(
    State(state): State<SharedState>,
    Path(management_number): Path<i64>,
    Query(query): Query<FileQuery>,
    Json(input): Json<ReportInput>,
) -> ApiResult<Value> {
    let file = state.workbook(query.filename);
    run_blocking(move || state.reports.update_report(&file, management_number, &input)).await?;
    Ok(Json(json!({
        "message": "Report updated successfully",
        "management_number": management_number,
    })))
}

fn patched(management_number: i64) -> Json<Value> {
    Json(json!({ "success": true, "management_number": management_number }))
}

pub async fn patch_reply(
    State(state): State<SharedState>,
    Path(management_number): Path<i64>,
    Query(query): Query<FileQuery>,
    Json(patch): Json<ReplyPatch>,
) -> ApiResult<Value> {
    let file = state.workbook(query.filename);
    run_blocking(move || state.reports.patch_reply(&file, management_number, patch)).await?;
    Ok(patched(management_number))
}

pub async fn patch_comment(
    State(state): State<SharedState>,
    Path(management_number): Path<i64>,
    Query(query): Query<FileQuery>,
    Json(patch): Json<CommentPatch>,
) -> ApiResult<Value> {
    let file = state.workbook(query.filename);
    run_blocking(move || state.reports.patch_comment(&file, management_number, patch)).await?;
    Ok(patched(management_number))
}

pub async fn patch_approval(
    State(state): State<SharedState>,
    Path(management_number): Path<i64>,
    Query(query): Query<FileQuery>,
    Json(patch): Json<ApprovalPatch>,
) -> ApiResult<Value> {
    let file = state.workbook(query.filename);
    run_blocking(move || state.reports.patch_approval(&file, management_number, patch)).await?;
    Ok(patched(management_number))
}

pub async fn delete_report(
    State(state): State<SharedState>,
    Path(management_number): Path<i64>,
    Query(query): Query<FileQuery>,
) -> ApiResult<Value> {
    let file = state.workbook(query.filename);
    run_blocking(move || state.reports.delete_report(&file, management_number)).await?;
    Ok(Json(json!({
        "message": "Report deleted successfully",
        "management_number": management_number,
    })))
}

pub async fn upload_workbook(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let (name, bytes) = read_file_field(multipart).await?;
    let file_name = name.clone();
    let path = run_blocking(move || state.files.upload_workbook(&file_name, &bytes)).await?;
    Ok(Json(json!({
        "message": "File uploaded successfully",
        "filename": name,
        "path": path.display().to_string(),
    })))
}

pub async fn list_images(
    State(state): State<SharedState>,
    Query(query): Query<ImageListQuery>,
) -> ApiResult<ImageResults> {
    let results = run_blocking(move || Ok(state.images.list(&query.filename))).await?;
    Ok(Json(results))
}

pub async fn image_content(
    State(state): State<SharedState>,
    Query(query): Query<ImagePathQuery>,
    req: Request,
) -> Result<Response, ApiError> {
    let path = run_blocking(move || state.images.resolve(&query.path)).await?;
    Ok(serve_file(path, req).await)
}

pub async fn search_images(
    State(state): State<SharedState>,
    Query(query): Query<ImageSearchQuery>,
) -> ApiResult<ImageResults> {
    let results = run_blocking(move || {
        Ok(state
            .images
            .search(&query.query, query.filename.as_deref()))
    })
    .await?;
    Ok(Json(results))
}

pub async fn upload_sales(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> ApiResult<Value> {
    let (name, bytes) = read_file_field(multipart).await?;
    log::info!("receiving sales csv: {name}");
    run_blocking(move || state.sales.upload(&bytes)).await?;
    Ok(Json(json!({
        "message": "Sales data uploaded and processed successfully."
    })))
}

pub async fn all_sales(State(state): State<SharedState>) -> Json<Vec<SalesSummary>> {
    Json(state.sales.all())
}

pub async fn customer_sales(
    State(state): State<SharedState>,
    Path(customer_code): Path<String>,
) -> Json<CustomerSales> {
    Json(state.sales.for_customer(&customer_code))
}
