use crate::domain::text::{canonical_header, HeaderKind};

pub const REPORT_SHEET: &str = "営業日報";
pub const CUSTOMER_SHEET: &str = "得意先_List";

/// Row 1 is the header; report data starts on row 2.
pub const FIRST_DATA_ROW: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportField {
    ManagementNumber,
    Date,
    Action,
    Area,
    CustomerCode,
    DeliveryCode,
    VisitTarget,
    DeliveryName,
    PriorityCustomer,
    Rank,
    CustomerTarget,
    Interviewee,
    StayTime,
    DesignProposal,
    DesignType,
    DesignName,
    DesignProgress,
    DesignRequestNo,
    Discussion,
    Proposal,
    NextPlan,
    CompetitorInfo,
    ManagerComment,
    CommentReply,
    Manager,
    DirectorYamasumi,
    DirectorOkamoto,
    DeputyNakano,
    ReadCheck,
}

impl ReportField {
    /// Canonical record key, equal to the cleaned sheet header.
    pub fn key(self) -> &'static str {
        match self {
            ReportField::ManagementNumber => "管理番号",
            ReportField::Date => "日付",
            ReportField::Action => "行動内容",
            ReportField::Area => "エリア",
            ReportField::CustomerCode => "得意先CD",
            ReportField::DeliveryCode => "直送先CD",
            ReportField::VisitTarget => "訪問先名",
            ReportField::DeliveryName => "直送先名",
            ReportField::PriorityCustomer => "重点顧客",
            ReportField::Rank => "ランク",
            ReportField::CustomerTarget => "得意先目標",
            ReportField::Interviewee => "面談者",
            ReportField::StayTime => "滞在時間",
            ReportField::DesignProposal => "デザイン提案有無",
            ReportField::DesignType => "デザイン種別",
            ReportField::DesignName => "デザイン名",
            ReportField::DesignProgress => "デザイン進捗状況",
            ReportField::DesignRequestNo => "デザイン依頼No.",
            ReportField::Discussion => "商談内容",
            ReportField::Proposal => "提案物",
            ReportField::NextPlan => "次回プラン",
            ReportField::CompetitorInfo => "競合他社情報",
            ReportField::ManagerComment => "上長コメント",
            ReportField::CommentReply => "コメント返信欄",
            ReportField::Manager => "上長",
            ReportField::DirectorYamasumi => "山澄常務",
            ReportField::DirectorOkamoto => "岡本常務",
            ReportField::DeputyNakano => "中野次長",
            ReportField::ReadCheck => "既読チェック",
        }
    }

    /// 1-based worksheet column in the report sheet.
    pub fn column(self) -> u32 {
        match self {
            ReportField::ManagementNumber => 1,
            ReportField::Date => 2,
            ReportField::Action => 3,
            ReportField::Area => 4,
            ReportField::CustomerCode => 5,
            ReportField::DeliveryCode => 6,
            ReportField::VisitTarget => 7,
            ReportField::DeliveryName => 8,
            ReportField::PriorityCustomer => 9,
            ReportField::Rank => 10,
            ReportField::CustomerTarget => 11,
            ReportField::Interviewee => 12,
            ReportField::StayTime => 13,
            ReportField::DesignProposal => 14,
            ReportField::DesignType => 15,
            ReportField::DesignName => 16,
            ReportField::DesignProgress => 17,
            ReportField::DesignRequestNo => 18,
            ReportField::Discussion => 19,
            ReportField::Proposal => 20,
            ReportField::NextPlan => 21,
            ReportField::CompetitorInfo => 22,
            ReportField::ManagerComment => 23,
            ReportField::CommentReply => 24,
            ReportField::Manager => 25,
            ReportField::DirectorYamasumi => 26,
            ReportField::DirectorOkamoto => 27,
            ReportField::DeputyNakano => 28,
            ReportField::ReadCheck => 29,
        }
    }

    pub fn is_code(self) -> bool {
        matches!(
            self,
            ReportField::CustomerCode | ReportField::DeliveryCode
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub field: ReportField,
    /// 1-based worksheet column.
    pub column: u32,
}

const STANDARD_LAYOUT: [ReportField; 29] = [
    ReportField::ManagementNumber,
    ReportField::Date,
    ReportField::Action,
    ReportField::Area,
    ReportField::CustomerCode,
    ReportField::DeliveryCode,
    ReportField::VisitTarget,
    ReportField::DeliveryName,
    ReportField::PriorityCustomer,
    ReportField::Rank,
    ReportField::CustomerTarget,
    ReportField::Interviewee,
    ReportField::StayTime,
    ReportField::DesignProposal,
    ReportField::DesignType,
    ReportField::DesignName,
    ReportField::DesignProgress,
    ReportField::DesignRequestNo,
    ReportField::Discussion,
    ReportField::Proposal,
    ReportField::NextPlan,
    ReportField::CompetitorInfo,
    ReportField::ManagerComment,
    ReportField::CommentReply,
    ReportField::Manager,
    ReportField::DirectorYamasumi,
    ReportField::DirectorOkamoto,
    ReportField::DeputyNakano,
    ReportField::ReadCheck,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMismatch {
    pub column: u32,
    pub expected: &'static str,
    pub found: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("report sheet header does not match the column layout: {}", describe_mismatches(.mismatches))]
pub struct SchemaError {
    pub mismatches: Vec<HeaderMismatch>,
}

fn describe_mismatches(mismatches: &[HeaderMismatch]) -> String {
    mismatches
        .iter()
        .map(|m| {
            format!(
                "column {} expected '{}' found '{}'",
                m.column, m.expected, m.found
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Ordered mapping from report fields to fixed worksheet columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSchema {
    columns: Vec<ColumnSpec>,
}

impl ReportSchema {
    pub fn standard() -> Self {
        let columns = STANDARD_LAYOUT
            .iter()
            .map(|field| ColumnSpec {
                field: *field,
                column: field.column(),
            })
            .collect();
        Self { columns }
    }

    pub fn column(&self, field: ReportField) -> u32 {
        field.column()
    }

    pub fn width(&self) -> u32 {
        self.columns.iter().map(|spec| spec.column).max().unwrap_or(0)
    }

    /// `header[i]` is the raw text of column `i + 1`.
    pub fn validate(&self, header: &[String]) -> Result<(), SchemaError> {
        let mismatches: Vec<HeaderMismatch> = self
            .columns
            .iter()
            .filter_map(|spec| {
                let raw = header
                    .get(spec.column as usize - 1)
                    .map(String::as_str)
                    .unwrap_or("");
                let found = canonical_header(raw, HeaderKind::Report);
                (found != spec.field.key()).then(|| HeaderMismatch {
                    column: spec.column,
                    expected: spec.field.key(),
                    found,
                })
            })
            .collect();

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(SchemaError { mismatches })
        }
    }
}

/// Raw header labels as they appear in the production workbook.
#[cfg(test)]
pub fn sheet_header_labels() -> Vec<&'static str> {
    STANDARD_LAYOUT
        .iter()
        .map(|field| match field {
            ReportField::CustomerCode => "得意先CD.",
            ReportField::DeliveryCode => "直送先CD.",
            ReportField::VisitTarget => "訪問先名\n得意先名",
            ReportField::StayTime => "滞在\n時間",
            ReportField::ManagerComment => "コメント",
            other => other.key(),
        })
        .collect()
}
