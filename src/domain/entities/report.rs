use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::domain::schema::ReportField;

/// A report row projected to JSON, keyed by canonical column names.
pub type Record = Map<String, Value>;

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

/// Accepts strings, numbers and booleans; `null` stays `None`.
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Body of create and full-update requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportInput {
    #[serde(rename = "日付", deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(rename = "行動内容", deserialize_with = "lenient_string")]
    pub action: String,
    #[serde(rename = "エリア", deserialize_with = "lenient_string")]
    pub area: String,
    #[serde(rename = "得意先CD", deserialize_with = "lenient_string")]
    pub customer_code: String,
    #[serde(rename = "直送先CD", deserialize_with = "lenient_string")]
    pub delivery_code: String,
    #[serde(rename = "訪問先名", deserialize_with = "lenient_string")]
    pub visit_target: String,
    #[serde(rename = "直送先名", deserialize_with = "lenient_string")]
    pub delivery_name: String,
    #[serde(rename = "重点顧客", deserialize_with = "lenient_string")]
    pub priority_customer: String,
    #[serde(rename = "ランク", deserialize_with = "lenient_string")]
    pub rank: String,
    #[serde(rename = "得意先目標", deserialize_with = "lenient_string")]
    pub customer_target: String,
    #[serde(rename = "面談者", deserialize_with = "lenient_string")]
    pub interviewee: String,
    #[serde(rename = "滞在時間", deserialize_with = "lenient_string")]
    pub stay_time: String,
    #[serde(rename = "商談内容", deserialize_with = "lenient_string")]
    pub discussion: String,
    #[serde(rename = "提案物", deserialize_with = "lenient_string")]
    pub proposal: String,
    #[serde(rename = "次回プラン", deserialize_with = "lenient_string")]
    pub next_plan: String,
    #[serde(rename = "競合他社情報", deserialize_with = "lenient_string")]
    pub competitor_info: String,
    #[serde(rename = "デザイン提案有無", deserialize_with = "lenient_string")]
    pub design_proposal: String,
    #[serde(rename = "デザイン種別", deserialize_with = "lenient_string")]
    pub design_type: String,
    #[serde(rename = "デザイン名", deserialize_with = "lenient_string")]
    pub design_name: String,
    #[serde(rename = "デザイン進捗状況", deserialize_with = "lenient_string")]
    pub design_progress: String,
    #[serde(
        rename = "デザイン依頼No.",
        alias = "デザイン依頼No",
        deserialize_with = "lenient_string"
    )]
    pub design_request_no: String,
    #[serde(rename = "上長コメント", deserialize_with = "lenient_string")]
    pub manager_comment: String,
    #[serde(rename = "コメント返信欄", deserialize_with = "lenient_string")]
    pub comment_reply: String,
    /// Last-seen values of the watched text fields, for the optimistic lock.
    pub original_values: Option<Map<String, Value>>,
}

impl ReportInput {
    /// Content columns 2..=24, in sheet order. Management number and the
    /// approval columns are never written from this input.
    pub fn field_values(&self) -> Vec<(ReportField, &str)> {
        vec![
            (ReportField::Date, self.date.as_str()),
            (ReportField::Action, self.action.as_str()),
            (ReportField::Area, self.area.as_str()),
            (ReportField::CustomerCode, self.customer_code.as_str()),
            (ReportField::DeliveryCode, self.delivery_code.as_str()),
            (ReportField::VisitTarget, self.visit_target.as_str()),
            (ReportField::DeliveryName, self.delivery_name.as_str()),
            (ReportField::PriorityCustomer, self.priority_customer.as_str()),
            (ReportField::Rank, self.rank.as_str()),
            (ReportField::CustomerTarget, self.customer_target.as_str()),
            (ReportField::Interviewee, self.interviewee.as_str()),
            (ReportField::StayTime, self.stay_time.as_str()),
            (ReportField::DesignProposal, self.design_proposal.as_str()),
            (ReportField::DesignType, self.design_type.as_str()),
            (ReportField::DesignName, self.design_name.as_str()),
            (ReportField::DesignProgress, self.design_progress.as_str()),
            (ReportField::DesignRequestNo, self.design_request_no.as_str()),
            (ReportField::Discussion, self.discussion.as_str()),
            (ReportField::Proposal, self.proposal.as_str()),
            (ReportField::NextPlan, self.next_plan.as_str()),
            (ReportField::CompetitorInfo, self.competitor_info.as_str()),
            (ReportField::ManagerComment, self.manager_comment.as_str()),
            (ReportField::CommentReply, self.comment_reply.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentPatch {
    #[serde(rename = "上長コメント", deserialize_with = "lenient_opt_string")]
    pub manager_comment: Option<String>,
    #[serde(rename = "コメント返信欄", deserialize_with = "lenient_opt_string")]
    pub comment_reply: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyPatch {
    #[serde(rename = "コメント返信欄", deserialize_with = "lenient_string")]
    pub comment_reply: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApprovalPatch {
    #[serde(rename = "上長", deserialize_with = "lenient_opt_string")]
    pub manager: Option<String>,
    #[serde(rename = "山澄常務", deserialize_with = "lenient_opt_string")]
    pub director_yamasumi: Option<String>,
    #[serde(rename = "岡本常務", deserialize_with = "lenient_opt_string")]
    pub director_okamoto: Option<String>,
    #[serde(rename = "中野次長", deserialize_with = "lenient_opt_string")]
    pub deputy_nakano: Option<String>,
    #[serde(rename = "既読チェック", deserialize_with = "lenient_opt_string")]
    pub read_check: Option<String>,
}

/// A partial write: only the listed columns of one row are touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    pub values: Vec<(ReportField, String)>,
}

impl From<CommentPatch> for FieldPatch {
    fn from(patch: CommentPatch) -> Self {
        let values = [
            (ReportField::ManagerComment, patch.manager_comment),
            (ReportField::CommentReply, patch.comment_reply),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect();
        FieldPatch { values }
    }
}

impl From<ReplyPatch> for FieldPatch {
    fn from(patch: ReplyPatch) -> Self {
        FieldPatch {
            values: vec![(ReportField::CommentReply, patch.comment_reply)],
        }
    }
}

impl From<ApprovalPatch> for FieldPatch {
    fn from(patch: ApprovalPatch) -> Self {
        let values = [
            (ReportField::Manager, patch.manager),
            (ReportField::DirectorYamasumi, patch.director_yamasumi),
            (ReportField::DirectorOkamoto, patch.director_okamoto),
            (ReportField::DeputyNakano, patch.deputy_nakano),
            (ReportField::ReadCheck, patch.read_check),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect();
        FieldPatch { values }
    }
}
