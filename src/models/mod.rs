use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Accepts strings, numbers and booleans for text fields; the backend is not
/// consistent about column types (e.g. `years_xp`, `project_cost`).
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
        .collect())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// One row of the community directory as returned by `/search`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email_other: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_job: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_company: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub linkedin_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub resume: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub years_xp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub years_sustainability_xp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub linkedin_skills: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key_competencies: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key_sectors: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub executive_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gender_identity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub race_ethnicity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lgbtqia: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,
}

impl SearchResult {
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or_default();
        let last = self.last_name.as_deref().unwrap_or_default();
        let name = format!("{first} {last}");
        let name = name.trim();
        if name.is_empty() {
            "Unknown Name".to_string()
        } else {
            name.to_string()
        }
    }

    pub fn location(&self) -> String {
        let parts: Vec<&str> = [self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            "Location not specified".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// The five checkbox groups of the search form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterSet {
    #[serde(rename = "source_filters")]
    pub source: Vec<String>,
    #[serde(rename = "experience_filters")]
    pub experience: Vec<String>,
    #[serde(rename = "sustainability_experience_filters")]
    pub sustainability_experience: Vec<String>,
    #[serde(rename = "competencies_filters")]
    pub competencies: Vec<String>,
    #[serde(rename = "sectors_filters")]
    pub sectors: Vec<String>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
            && self.experience.is_empty()
            && self.sustainability_experience.is_empty()
            && self.competencies.is_empty()
            && self.sectors.is_empty()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchRequest {
    pub keyword: String,
    #[serde(flatten)]
    pub filters: FilterSet,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub keyword: String,
}

impl SearchResponse {
    pub fn count(&self) -> usize {
        self.count.unwrap_or(self.results.len())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SiteStats {
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub records_with_linkedins: u64,
    #[serde(default)]
    pub records_with_resumes: u64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Document {
    pub id: i64,
    #[serde(default)]
    pub rfp_id: Option<i64>,
    #[serde(default)]
    pub document_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text_preview: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
}

impl Document {
    /// Upper-cased text after the last dot; the whole name when there is none.
    pub fn extension_label(&self) -> String {
        self.document_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_uppercase()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RfpRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub project_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub organization_group: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub project_focus: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub opf_gap_size: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub opf_gaps: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub project_cost: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub posting_contact: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub deliverables: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub potential_experts: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub specific_staffing_needs: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_fit_assessment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_competitive_position: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_key_strengths: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_gaps_challenges: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_resource_requirements: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_risk_assessment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_recommendations: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ai_analysis_date: Option<String>,
    /// Filled in by the client after `/api/documents/:id`; never sent back.
    #[serde(default, skip_serializing)]
    pub documents: Option<Vec<Document>>,
}

impl RfpRecord {
    pub fn name(&self) -> &str {
        self.project_name.as_deref().unwrap_or_default()
    }

    pub fn has_analysis(&self) -> bool {
        non_empty(&self.ai_fit_assessment).is_some()
    }

    pub fn document_count(&self) -> usize {
        self.documents.as_ref().map(Vec::len).unwrap_or(0)
    }
}

/// Body of `PUT /api/rfp-update/:id`; mirrors the edit form, so every value
/// is a plain string and empty means "cleared".
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RfpForm {
    pub project_name: String,
    pub organization_group: String,
    pub link: String,
    pub country: String,
    pub region: String,
    pub project_focus: String,
    pub industry: String,
    pub opf_gap_size: String,
    pub due_date: String,
    pub project_cost: String,
    pub currency: String,
    pub posting_contact: String,
    pub opf_gaps: String,
    pub deliverables: String,
    pub potential_experts: String,
    pub specific_staffing_needs: String,
}

impl RfpForm {
    pub const FIELDS: [&'static str; 16] = [
        "project_name",
        "organization_group",
        "link",
        "country",
        "region",
        "project_focus",
        "industry",
        "opf_gap_size",
        "due_date",
        "project_cost",
        "currency",
        "posting_contact",
        "opf_gaps",
        "deliverables",
        "potential_experts",
        "specific_staffing_needs",
    ];

    pub fn from_record(rfp: &RfpRecord) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            project_name: text(&rfp.project_name),
            organization_group: text(&rfp.organization_group),
            link: text(&rfp.link),
            country: text(&rfp.country),
            region: text(&rfp.region),
            project_focus: text(&rfp.project_focus),
            industry: text(&rfp.industry),
            opf_gap_size: text(&rfp.opf_gap_size),
            due_date: rfp
                .due_date
                .as_deref()
                .and_then(|d| d.split('T').next())
                .unwrap_or_default()
                .to_string(),
            project_cost: text(&rfp.project_cost),
            currency: text(&rfp.currency),
            posting_contact: text(&rfp.posting_contact),
            opf_gaps: text(&rfp.opf_gaps),
            deliverables: text(&rfp.deliverables),
            potential_experts: text(&rfp.potential_experts),
            specific_staffing_needs: text(&rfp.specific_staffing_needs),
        }
    }

    /// Sets one field by its form name. Returns false for unknown names.
    pub fn set(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            "project_name" => &mut self.project_name,
            "organization_group" => &mut self.organization_group,
            "link" => &mut self.link,
            "country" => &mut self.country,
            "region" => &mut self.region,
            "project_focus" => &mut self.project_focus,
            "industry" => &mut self.industry,
            "opf_gap_size" => &mut self.opf_gap_size,
            "due_date" => &mut self.due_date,
            "project_cost" => &mut self.project_cost,
            "currency" => &mut self.currency,
            "posting_contact" => &mut self.posting_contact,
            "opf_gaps" => &mut self.opf_gaps,
            "deliverables" => &mut self.deliverables,
            "potential_experts" => &mut self.potential_experts,
            "specific_staffing_needs" => &mut self.specific_staffing_needs,
            _ => return false,
        };
        *slot = value;
        true
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NewRfp {
    pub project_name: String,
    pub link: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AiAnalysis {
    #[serde(default, deserialize_with = "lenient_string")]
    pub fit_assessment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub competitive_position: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key_strengths: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gaps_challenges: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub resource_requirements: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub risk_assessment: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recommendations: Option<String>,
    #[serde(default)]
    pub extracted_metadata: Map<String, Value>,
}

impl AiAnalysis {
    /// Rebuilds the analysis panel content from the fields persisted on the record.
    pub fn from_record(rfp: &RfpRecord) -> Self {
        Self {
            fit_assessment: rfp.ai_fit_assessment.clone(),
            competitive_position: rfp.ai_competitive_position.clone(),
            key_strengths: rfp.ai_key_strengths.clone(),
            gaps_challenges: rfp.ai_gaps_challenges.clone(),
            resource_requirements: rfp.ai_resource_requirements.clone(),
            risk_assessment: rfp.ai_risk_assessment.clone(),
            recommendations: rfp.ai_recommendations.clone(),
            extracted_metadata: Map::new(),
        }
    }

    /// Metadata keys the analysis actually filled, in server order.
    pub fn populated_metadata_fields(&self) -> Vec<&str> {
        self.extracted_metadata
            .iter()
            .filter(|(_, v)| is_populated(v))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "null",
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RankedMember {
    #[serde(default, deserialize_with = "lenient_string")]
    pub member_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub relevance_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub key_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub explanation: Option<String>,
}

impl RankedMember {
    pub const DEFAULT_SCORE: f64 = 5.0;

    /// Score on the 0-10 scale. Missing, zero or NaN scores rank mid-table.
    pub fn score(&self) -> f64 {
        self.relevance_score
            .filter(|s| *s != 0.0 && !s.is_nan())
            .unwrap_or(Self::DEFAULT_SCORE)
            .clamp(0.0, 10.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MemberMatching {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub members: Vec<RankedMember>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TenderSource {
    Australian,
    Giz,
    Undp,
}

impl TenderSource {
    pub const ALL: [TenderSource; 3] = [Self::Australian, Self::Giz, Self::Undp];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "aus" | "au" | "australian" | "australia" => Some(Self::Australian),
            "giz" => Some(Self::Giz),
            "undp" => Some(Self::Undp),
            other => Self::ALL
                .into_iter()
                .find(|s| s.label().to_lowercase() == other),
        }
    }

    /// Value stored in `tenders.source` and sent as the `source` query param.
    pub fn label(self) -> &'static str {
        match self {
            Self::Australian => "Australian Government Tenders",
            Self::Giz => "GIZ (German Development Agency)",
            Self::Undp => "UNDP (United Nations Development Programme)",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Self::Australian => "Australian",
            Self::Giz => "GIZ",
            Self::Undp => "UNDP",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Australian => "aus",
            Self::Giz => "giz",
            Self::Undp => "undp",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TenderFilter {
    #[default]
    All,
    Processed,
    Unprocessed,
}

impl TenderFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "all" | "" => Some(Self::All),
            "processed" => Some(Self::Processed),
            "unprocessed" => Some(Self::Unprocessed),
            _ => None,
        }
    }

    pub fn processed_param(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Processed => Some("true"),
            Self::Unprocessed => Some("false"),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Tender {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub organization: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub closing_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
    #[serde(default)]
    pub processed: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ActivityEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct TenderStats {
    #[serde(default)]
    pub total_tenders: u64,
    #[serde(default)]
    pub total_unprocessed: u64,
    #[serde(default)]
    pub recent_activity: Vec<ActivityEntry>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct KnowledgeBaseInit {
    #[serde(default)]
    pub already_initialized: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct KnowledgeBaseStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub document_count: u64,
}

impl KnowledgeBaseStatus {
    pub fn is_initialized(&self) -> bool {
        self.status.as_deref() == Some("initialized")
    }
}

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A file picked for upload, read fully into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = guess_mime(&name).to_string();
        Self { name, mime, bytes }
    }

    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

pub fn guess_mime(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => MIME_PDF,
        "doc" => MIME_DOC,
        "docx" => MIME_DOCX,
        "txt" | "text" => "text/plain",
        "htm" | "html" => "text/html",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}
