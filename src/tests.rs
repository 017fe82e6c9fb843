use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{json, Map, Value};

use crate::domain::entities::report::{ApprovalPatch, CommentPatch, ReportInput};
use crate::domain::schema::{
    sheet_header_labels, ReportField, ReportSchema, CUSTOMER_SHEET, REPORT_SHEET,
};
use crate::domain::text::HeaderKind;
use crate::infra::cache::WorkbookCache;
use crate::infra::sqlite::schema::init_db;
use crate::infra::workbook::repo::{project_records, WorkbookRepo};
use crate::usecase::ports::repo::{ReportRepository, StoreError};
use crate::usecase::services::lookup_service::{DeliveryFilter, LookupService};
use crate::usecase::services::report_service::ReportService;

const WORKBOOK: &str = "本社001.xlsx";

/// Fresh per-test directory under the system temp dir.
pub(crate) fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("daily-report-{prefix}-{nanos}"))
}

/// One data row of the report sheet: management number plus the fields to fill.
struct Row {
    number: i64,
    fields: Vec<(ReportField, &'static str)>,
}

fn row(number: i64, fields: &[(ReportField, &'static str)]) -> Row {
    Row {
        number,
        fields: fields.to_vec(),
    }
}

fn write_workbook(path: &Path, header: &[&str], rows: &[Row]) {
    let schema = ReportSchema::standard();
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    {
        let ws = book
            .new_sheet(REPORT_SHEET)
            .expect("should add report sheet");
        for (idx, label) in header.iter().enumerate() {
            ws.get_cell_mut((idx as u32 + 1, 1)).set_value_string(*label);
        }
        for (idx, data) in rows.iter().enumerate() {
            let line = idx as u32 + 2;
            ws.get_cell_mut((1, line))
                .set_value_number(data.number as f64);
            for (field, value) in &data.fields {
                let col = schema.column(*field);
                match value.parse::<f64>() {
                    Ok(number) if field.is_code() => {
                        ws.get_cell_mut((col, line)).set_value_number(number);
                    }
                    _ => {
                        ws.get_cell_mut((col, line)).set_value_string(*value);
                    }
                }
            }
        }
    }
    {
        let ws = book
            .new_sheet(CUSTOMER_SHEET)
            .expect("should add customer sheet");
        let header = [
            "得意先CD", "得意先名", "住所", "電話", "FAX", "業種", "ランク", "重点顧客", "担当者",
        ];
        for (idx, label) in header.iter().enumerate() {
            ws.get_cell_mut((idx as u32 + 1, 1)).set_value_string(*label);
        }
        let customers: [(f64, &str, &str, &str); 3] = [
            (43006.0, "朝日商店", "重点", "山田"),
            (43007.0, "夕日商店", "", "佐藤"),
            (43008.0, "月見堂", "重点顧客", "鈴木"),
        ];
        for (idx, (code, name, mark, staff)) in customers.iter().enumerate() {
            let line = idx as u32 + 2;
            ws.get_cell_mut((1, line)).set_value_number(*code);
            ws.get_cell_mut((2, line)).set_value_string(*name);
            if !mark.is_empty() {
                ws.get_cell_mut((8, line)).set_value_string(*mark);
            }
            ws.get_cell_mut((9, line)).set_value_string(*staff);
        }
    }
    umya_spreadsheet::writer::xlsx::write(&book, path).expect("should write fixture workbook");
}

/// Puts a label without management number on the row after the last report,
/// like the totals rows some sheets keep below the data.
fn add_label_row(path: &Path, label: &str) {
    let mut book = umya_spreadsheet::reader::xlsx::read(path).expect("should read fixture workbook");
    let ws = book
        .get_sheet_by_name_mut(REPORT_SHEET)
        .expect("report sheet should exist");
    let row = ws.get_highest_row() + 1;
    ws.get_cell_mut((1, row)).set_value_string(label);
    ws.get_cell_mut((ReportField::Discussion.column(), row))
        .set_value_string(format!("{label}メモ"));
    umya_spreadsheet::writer::xlsx::write(&book, path).expect("should write fixture workbook");
}

fn standard_workbook(dir: &Path, name: &str, rows: &[Row]) -> PathBuf {
    fs::create_dir_all(dir).expect("should create temp dir");
    let path = dir.join(name);
    write_workbook(&path, &sheet_header_labels(), rows);
    path
}

fn repo_for(dir: &Path) -> Arc<WorkbookRepo> {
    Arc::new(WorkbookRepo::new(Arc::new(WorkbookCache::new(dir))))
}

fn numbers(repo: &WorkbookRepo) -> Vec<i64> {
    repo.list_reports(WORKBOOK)
        .expect("list should succeed")
        .iter()
        .filter_map(|record| record.get("管理番号").and_then(Value::as_i64))
        .collect()
}

fn text_of<'a>(record: &'a Map<String, Value>, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or_default()
}

#[test]
fn init_db_creates_cache_tables() {
    let temp_dir = unique_test_dir("init-db");
    let db_path = temp_dir.join("nested").join("cache.sqlite");

    let result = init_db(&db_path);

    assert!(result.is_ok(), "init_db should succeed: {result:?}");

    let conn = rusqlite::Connection::open(&db_path).expect("should open sqlite db");
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('cached_sheet','cached_column','cached_cell')",
            [],
            |row| row.get(0),
        )
        .expect("table count query should succeed");

    assert_eq!(table_count, 3, "cache tables should exist");
    assert!(init_db(&db_path).is_ok(), "init_db should be idempotent");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn create_assigns_next_number_and_round_trips_multiline_text() {
    let dir = unique_test_dir("create");
    standard_workbook(
        &dir,
        WORKBOOK,
        &[
            row(3, &[(ReportField::Discussion, "三")]),
            row(7, &[(ReportField::Discussion, "七")]),
            row(5, &[(ReportField::Discussion, "五")]),
        ],
    );
    let repo = repo_for(&dir);
    let input = ReportInput {
        date: "2025-04-01".to_string(),
        customer_code: "43006".to_string(),
        visit_target: "朝日商店".to_string(),
        customer_target: "月100万".to_string(),
        interviewee: "田中".to_string(),
        discussion: "一行目\n二行目".to_string(),
        ..ReportInput::default()
    };

    let number = repo
        .create_report(WORKBOOK, &input)
        .expect("create should succeed");

    assert_eq!(number, 8);
    assert_eq!(numbers(&repo), vec![3, 7, 8, 5]);
    let record = repo.get_report(WORKBOOK, 8).expect("report should exist");
    assert_eq!(text_of(&record, "商談内容"), "一行目\n二行目");
    assert_eq!(text_of(&record, "得意先CD"), "43006");
    assert_eq!(text_of(&record, "訪問先名"), "朝日商店");
    assert_eq!(text_of(&record, "得意先目標"), "月100万");
    assert_eq!(text_of(&record, "面談者"), "田中");
    assert_eq!(record["上長"], Value::Null);
    assert!(
        dir.join("backup").is_dir(),
        "a backup should be written next to the workbook"
    );

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn create_on_sheet_without_reports_starts_at_one() {
    let dir = unique_test_dir("create-empty");
    standard_workbook(&dir, WORKBOOK, &[]);
    let repo = repo_for(&dir);

    let number = repo
        .create_report(WORKBOOK, &ReportInput::default())
        .expect("create should succeed");

    assert_eq!(number, 1);
    assert_eq!(numbers(&repo), vec![1]);

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn create_keeps_a_totals_row_below_the_reports() {
    let dir = unique_test_dir("create-totals");
    let path = standard_workbook(
        &dir,
        WORKBOOK,
        &[
            row(1, &[(ReportField::Discussion, "一")]),
            row(2, &[(ReportField::Discussion, "二")]),
        ],
    );
    add_label_row(&path, "合計");
    let repo = repo_for(&dir);
    let input = ReportInput {
        discussion: "三".to_string(),
        ..ReportInput::default()
    };

    let number = repo
        .create_report(WORKBOOK, &input)
        .expect("create should succeed");

    assert_eq!(number, 3);
    assert_eq!(numbers(&repo), vec![1, 2, 3]);
    let created = repo.get_report(WORKBOOK, 3).expect("report should exist");
    assert_eq!(text_of(&created, "商談内容"), "三");

    let book = umya_spreadsheet::reader::xlsx::read(&path).expect("should read workbook");
    let ws = book
        .get_sheet_by_name(REPORT_SHEET)
        .expect("report sheet should exist");
    assert_eq!(ws.get_value((1, 4)), "3");
    assert_eq!(ws.get_value((1, 5)), "合計");
    assert_eq!(ws.get_value((ReportField::Discussion.column(), 5)), "合計メモ");

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn update_checks_snapshot_of_watched_fields() {
    let dir = unique_test_dir("conflict");
    standard_workbook(
        &dir,
        WORKBOOK,
        &[row(
            1,
            &[
                (ReportField::Discussion, "商談A"),
                (ReportField::ManagerComment, "確認しました"),
            ],
        )],
    );
    let repo = repo_for(&dir);
    let snapshot = json!({
        "上長コメント": "確認しました",
        "コメント返信欄": null,
        "商談内容": "商談A"
    });
    let update = |discussion: &str| ReportInput {
        discussion: discussion.to_string(),
        manager_comment: "確認しました".to_string(),
        original_values: snapshot.as_object().cloned(),
        ..ReportInput::default()
    };

    repo.update_report(WORKBOOK, 1, &update("商談B"))
        .expect("update with a fresh snapshot should succeed");
    let stale = repo.update_report(WORKBOOK, 1, &update("商談C"));

    match stale {
        Err(StoreError::Conflict(fields)) => assert_eq!(fields, vec!["商談内容".to_string()]),
        other => panic!("stale snapshot should conflict, got {other:?}"),
    }
    let record = repo.get_report(WORKBOOK, 1).expect("report should exist");
    assert_eq!(text_of(&record, "商談内容"), "商談B");

    let unchecked = ReportInput {
        discussion: "商談D".to_string(),
        ..ReportInput::default()
    };
    repo.update_report(WORKBOOK, 1, &unchecked)
        .expect("update without snapshot should skip the check");
    let record = repo.get_report(WORKBOOK, 1).expect("report should exist");
    assert_eq!(text_of(&record, "商談内容"), "商談D");

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn delete_removes_only_the_requested_report() {
    let dir = unique_test_dir("delete");
    standard_workbook(
        &dir,
        WORKBOOK,
        &[
            row(1, &[(ReportField::Discussion, "一")]),
            row(2, &[(ReportField::Discussion, "二")]),
            row(3, &[(ReportField::Discussion, "三")]),
        ],
    );
    let repo = repo_for(&dir);

    repo.delete_report(WORKBOOK, 2).expect("delete should succeed");

    assert_eq!(numbers(&repo), vec![1, 3]);
    let third = repo.get_report(WORKBOOK, 3).expect("report 3 should remain");
    assert_eq!(text_of(&third, "商談内容"), "三");
    assert!(matches!(
        repo.get_report(WORKBOOK, 2),
        Err(StoreError::ReportNotFound(2))
    ));
    assert!(matches!(
        repo.delete_report(WORKBOOK, 2),
        Err(StoreError::ReportNotFound(2))
    ));

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn patches_touch_only_their_columns() {
    let dir = unique_test_dir("patch");
    standard_workbook(
        &dir,
        WORKBOOK,
        &[row(
            1,
            &[
                (ReportField::Discussion, "商談"),
                (ReportField::ManagerComment, "要確認"),
            ],
        )],
    );
    let repo = repo_for(&dir);
    let service = ReportService::new(repo.clone());

    service
        .patch_approval(
            WORKBOOK,
            1,
            ApprovalPatch {
                manager: Some("済".to_string()),
                ..ApprovalPatch::default()
            },
        )
        .expect("approval patch should succeed");
    service
        .patch_comment(
            WORKBOOK,
            1,
            CommentPatch {
                manager_comment: None,
                comment_reply: Some("対応します".to_string()),
            },
        )
        .expect("comment patch should succeed");

    let record = repo.get_report(WORKBOOK, 1).expect("report should exist");
    assert_eq!(text_of(&record, "上長"), "済");
    assert_eq!(text_of(&record, "コメント返信欄"), "対応します");
    assert_eq!(text_of(&record, "上長コメント"), "要確認");
    assert_eq!(text_of(&record, "商談内容"), "商談");
    assert_eq!(record["山澄常務"], Value::Null);

    let missing = service.patch_comment(WORKBOOK, 9, CommentPatch::default());
    assert!(matches!(missing, Err(StoreError::ReportNotFound(9))));

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn write_is_refused_when_header_layout_moved() {
    let dir = unique_test_dir("schema");
    fs::create_dir_all(&dir).expect("should create temp dir");
    let mut header = sheet_header_labels();
    header[22] = "備考";
    let path = dir.join(WORKBOOK);
    write_workbook(&path, &header, &[row(1, &[])]);
    let before = fs::read(&path).expect("should read workbook");
    let repo = repo_for(&dir);

    let result = repo.create_report(WORKBOOK, &ReportInput::default());

    match result {
        Err(StoreError::Schema(err)) => {
            assert_eq!(err.mismatches.len(), 1);
            assert_eq!(err.mismatches[0].column, 23);
            assert_eq!(err.mismatches[0].expected, "上長コメント");
        }
        other => panic!("layout mismatch should be a schema error, got {other:?}"),
    }
    assert!(matches!(
        repo.validate_schema(WORKBOOK),
        Err(StoreError::Schema(_))
    ));
    assert_eq!(fs::read(&path).expect("should read workbook"), before);

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn write_is_refused_on_sheet_without_customer_target_column() {
    let dir = unique_test_dir("schema-target");
    fs::create_dir_all(&dir).expect("should create temp dir");
    let mut header = sheet_header_labels();
    header.remove(10);
    let path = dir.join(WORKBOOK);
    write_workbook(&path, &header, &[row(1, &[])]);
    let before = fs::read(&path).expect("should read workbook");
    let repo = repo_for(&dir);

    let result = repo.create_report(WORKBOOK, &ReportInput::default());

    match result {
        Err(StoreError::Schema(err)) => {
            assert_eq!(err.mismatches[0].column, 11);
            assert_eq!(err.mismatches[0].expected, "得意先目標");
        }
        other => panic!("missing column should be a schema error, got {other:?}"),
    }
    assert_eq!(fs::read(&path).expect("should read workbook"), before);

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn missing_workbook_and_sheet_are_not_found() {
    let dir = unique_test_dir("missing");
    standard_workbook(&dir, WORKBOOK, &[]);
    let repo = repo_for(&dir);

    assert!(matches!(
        repo.list_reports("存在しない.xlsm"),
        Err(StoreError::FileNotFound(_))
    ));
    assert!(matches!(
        repo.sheet_table(WORKBOOK, "売上"),
        Err(StoreError::SheetNotFound(_))
    ));
    assert!(matches!(
        repo.list_reports("../secret.xlsm"),
        Err(StoreError::Validation(_))
    ));

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn cache_reuses_parse_until_file_changes() {
    let dir = unique_test_dir("cache");
    let path = standard_workbook(&dir, WORKBOOK, &[row(1, &[])]);
    let cache = WorkbookCache::new(&dir);

    let first = cache
        .get_table(WORKBOOK, REPORT_SHEET)
        .expect("first read should succeed");
    let second = cache
        .get_table(WORKBOOK, REPORT_SHEET)
        .expect("second read should succeed");

    assert_eq!(cache.parse_count(), 1);
    assert!(Arc::ptr_eq(&first, &second));

    let later = SystemTime::now() + Duration::from_secs(10);
    fs::File::options()
        .write(true)
        .open(&path)
        .and_then(|file| file.set_modified(later))
        .expect("should touch workbook");
    cache
        .get_table(WORKBOOK, REPORT_SHEET)
        .expect("read after touch should succeed");

    assert_eq!(cache.parse_count(), 2);

    cache.invalidate(WORKBOOK, REPORT_SHEET);
    cache
        .get_table(WORKBOOK, REPORT_SHEET)
        .expect("read after invalidate should succeed");
    assert_eq!(cache.parse_count(), 3);

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn disk_cache_survives_a_new_cache_instance() {
    let dir = unique_test_dir("disk-cache");
    let excel_dir = dir.join("excel");
    let cache_dir = dir.join("cache");
    standard_workbook(
        &excel_dir,
        WORKBOOK,
        &[row(1, &[(ReportField::Discussion, "一行目\n二行目")])],
    );

    let warm = WorkbookCache::new(&excel_dir).with_disk_cache(&cache_dir);
    let parsed = warm
        .get_table(WORKBOOK, REPORT_SHEET)
        .expect("first read should succeed");
    assert_eq!(warm.parse_count(), 1);

    let restarted = WorkbookCache::new(&excel_dir).with_disk_cache(&cache_dir);
    let restored = restarted
        .get_table(WORKBOOK, REPORT_SHEET)
        .expect("read from disk cache should succeed");

    assert_eq!(restarted.parse_count(), 0);
    assert_eq!(
        project_records(&restored, HeaderKind::Report),
        project_records(&parsed, HeaderKind::Report)
    );

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

fn lookup_fixture(dir: &Path) -> LookupService {
    standard_workbook(
        dir,
        WORKBOOK,
        &[
            row(
                1,
                &[
                    (ReportField::CustomerCode, "43006"),
                    (ReportField::Interviewee, "田中"),
                    (ReportField::DesignRequestNo, "D-1"),
                    (ReportField::DesignName, "春パッケージ"),
                    (ReportField::DesignProgress, "ラフ提出"),
                ],
            ),
            row(
                2,
                &[
                    (ReportField::CustomerCode, "43006"),
                    (ReportField::DeliveryName, "大阪工場"),
                    (ReportField::Interviewee, "高橋"),
                    (ReportField::DesignRequestNo, "D-2"),
                    (ReportField::DesignProgress, "出稿"),
                ],
            ),
            row(
                3,
                &[
                    (ReportField::CustomerCode, "43006"),
                    (ReportField::Interviewee, "-"),
                    (ReportField::DesignRequestNo, "D-1"),
                    (ReportField::DesignName, "春パッケージ改"),
                    (ReportField::DesignProgress, "校正中"),
                ],
            ),
            row(
                4,
                &[
                    (ReportField::CustomerCode, "43007"),
                    (ReportField::Interviewee, "伊藤"),
                ],
            ),
        ],
    );
    LookupService::new(repo_for(dir))
}

#[test]
fn interviewers_match_equivalent_codes_and_delivery_filter() {
    let dir = unique_test_dir("interviewers");
    let lookups = lookup_fixture(&dir);

    let any = lookups
        .interviewers(WORKBOOK, "43006.0", &DeliveryFilter::Any)
        .expect("lookup should succeed");
    let main = lookups
        .interviewers(WORKBOOK, " 43006 ", &DeliveryFilter::from_query(None))
        .expect("lookup should succeed");
    let plant = lookups
        .interviewers(
            WORKBOOK,
            "43006",
            &DeliveryFilter::from_query(Some("大阪工場")),
        )
        .expect("lookup should succeed");

    assert_eq!(any, vec!["田中".to_string(), "高橋".to_string()]);
    assert_eq!(main, vec!["田中".to_string()]);
    assert_eq!(plant, vec!["高橋".to_string()]);

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn designs_keep_latest_row_and_skip_closed_requests() {
    let dir = unique_test_dir("designs");
    let lookups = lookup_fixture(&dir);

    let designs = lookups
        .designs(WORKBOOK, "43006", None)
        .expect("lookup should succeed");

    assert_eq!(designs.len(), 1);
    assert_eq!(designs[0].request_no, Value::String("D-1".to_string()));
    assert_eq!(designs[0].name, "春パッケージ改");
    assert_eq!(designs[0].progress, "校正中");

    let plant = lookups
        .designs(WORKBOOK, "43006", Some("大阪工場"))
        .expect("lookup should succeed");
    assert!(plant.is_empty(), "closed request should be hidden");

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

#[test]
fn priority_customers_come_from_customer_sheet() {
    let dir = unique_test_dir("priority");
    let lookups = lookup_fixture(&dir);

    let customers = lookups
        .priority_customers(WORKBOOK)
        .expect("lookup should succeed");

    let summary: Vec<(&str, &str, &str)> = customers
        .iter()
        .map(|c| (c.code.as_str(), c.name.as_str(), c.staff.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![("43006", "朝日商店", "山田"), ("43008", "月見堂", "鈴木")]
    );

    fs::remove_dir_all(&dir).expect("should cleanup temp dir");
}

mod http {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    use crate::platform::config::{AppConfig, Settings};
    use crate::platform::http::{router, AppState};

    const DEFAULT_WORKBOOK: &str = "report_test.xlsm";

    fn app(dir: &Path) -> Router {
        let excel_dir = dir.join("excel");
        standard_workbook(
            &excel_dir,
            DEFAULT_WORKBOOK,
            &[
                row(1, &[(ReportField::Discussion, "初回訪問")]),
                row(2, &[(ReportField::Discussion, "再訪問")]),
            ],
        );
        let settings = Settings {
            excel_dir,
            design_dir: dir.join("design"),
            static_dir: dir.join("static"),
            data_dir: dir.join("data"),
            cache_dir: dir.join("cache"),
            ..AppConfig::default().resolve(dir)
        };
        router(Arc::new(AppState::from_settings(&settings)))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("request should complete");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request should build")
    }

    fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build")
    }

    fn cleanup(dir: &Path) {
        // backups run on the blocking pool and may still be writing
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn api_routes_answer_only_under_api_prefix() {
        let dir = unique_test_dir("http-health");
        let app = app(&dir);

        let (status, body) = send(&app, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Daily Report API is running");

        let (status, body) = send(&app, get("/api/files")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default"], DEFAULT_WORKBOOK);
        assert_eq!(body["files"][0]["name"], DEFAULT_WORKBOOK);

        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Not Found" }));

        let (status, body) = send(&app, get("/no/such/page")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Not Found" }));

        cleanup(&dir);
    }

    #[tokio::test]
    async fn front_end_pages_are_not_shadowed_by_api_paths() {
        let dir = unique_test_dir("http-pages");
        let static_dir = dir.join("static");
        fs::create_dir_all(&static_dir).expect("should create static dir");
        fs::write(static_dir.join("index.html"), "<p>home</p>").expect("should write index");
        fs::write(static_dir.join("reports.html"), "<p>reports page</p>")
            .expect("should write page");
        let app = app(&dir);

        for (uri, expected) in [
            ("/reports", "<p>reports page</p>"),
            ("/customers", "<p>home</p>"),
            ("/files", "<p>home</p>"),
        ] {
            let response = app
                .clone()
                .oneshot(get(uri))
                .await
                .expect("request should complete");
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body should be readable");
            assert_eq!(String::from_utf8_lossy(&bytes), expected, "{uri}");
        }

        let (status, body) = send(&app, get("/api/reports")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_array(), "api path should still return records");

        let (status, body) = send(&app, get("/api/no-such-endpoint")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Not Found" }));

        cleanup(&dir);
    }

    #[tokio::test]
    async fn report_lifecycle_over_http() {
        let dir = unique_test_dir("http-reports");
        let app = app(&dir);

        let (status, body) = send(
            &app,
            with_json(
                "POST",
                "/api/reports",
                json!({ "日付": "2025-04-01", "得意先CD": 43006, "商談内容": "見積提出" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Report added successfully");
        assert_eq!(body["management_number"], 3);

        let (status, body) = send(&app, get("/api/reports/3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["商談内容"], "見積提出");
        assert_eq!(body["得意先CD"], "43006");

        let (status, body) = send(
            &app,
            with_json("PATCH", "/api/reports/3/reply", json!({ "コメント返信欄": "了解です" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "management_number": 3 }));

        let (status, body) = send(
            &app,
            with_json(
                "POST",
                "/api/reports/1",
                json!({
                    "商談内容": "上書き",
                    "original_values": { "商談内容": "別の内容", "上長コメント": "", "コメント返信欄": "" }
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let detail = body["detail"].as_str().unwrap_or_default();
        assert!(detail.contains("商談内容"), "detail should name the field: {detail}");

        let (status, _) = send(&app, get("/api/reports/99")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/reports/2")
            .body(Body::empty())
            .expect("request should build");
        let (status, body) = send(&app, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Report deleted successfully");

        let (status, body) = send(&app, get("/api/reports")).await;
        assert_eq!(status, StatusCode::OK);
        let remaining: Vec<i64> = body
            .as_array()
            .expect("reports should be a list")
            .iter()
            .filter_map(|record| record["管理番号"].as_i64())
            .collect();
        assert_eq!(remaining, vec![1, 3]);

        cleanup(&dir);
    }

    #[tokio::test]
    async fn unknown_workbook_is_a_json_404() {
        let dir = unique_test_dir("http-missing");
        let app = app(&dir);

        let (status, body) = send(&app, get("/api/reports?filename=missing.xlsm")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Excel file 'missing.xlsm' not found");

        cleanup(&dir);
    }
}
