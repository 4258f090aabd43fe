use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Search form state handed to a fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFetcherProps {
	/// 1-based page number. Zero is treated as the first page.
	pub page: u32,
	pub query: Option<String>,
	pub status: BTreeSet<String>,
	pub funding_instrument: BTreeSet<String>,
	pub eligibility: BTreeSet<String>,
	pub agency: BTreeSet<String>,
	pub category: BTreeSet<String>,
	pub sort_by: SortOption,
}
impl SearchFetcherProps {
	pub fn page_offset(&self) -> u32 {
		self.page.max(1)
	}

	/// The trimmed free-text query, if any text remains.
	pub fn query_text(&self) -> Option<&str> {
		self.query.as_deref().map(str::trim).filter(|query| !query.is_empty())
	}
}
impl Default for SearchFetcherProps {
	fn default() -> Self {
		Self {
			page: 1,
			query: None,
			status: BTreeSet::new(),
			funding_instrument: BTreeSet::new(),
			eligibility: BTreeSet::new(),
			agency: BTreeSet::new(),
			category: BTreeSet::new(),
			sort_by: SortOption::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOption {
	OpportunityNumberAsc,
	OpportunityNumberDesc,
	OpportunityTitleAsc,
	OpportunityTitleDesc,
	AgencyAsc,
	AgencyDesc,
	PostedDateAsc,
	#[default]
	PostedDateDesc,
	CloseDateAsc,
	CloseDateDesc,
}
impl SortOption {
	/// Upstream `order_by` column.
	pub fn order_by(self) -> &'static str {
		match self {
			Self::OpportunityNumberAsc | Self::OpportunityNumberDesc => "opportunity_number",
			Self::OpportunityTitleAsc | Self::OpportunityTitleDesc => "opportunity_title",
			Self::AgencyAsc | Self::AgencyDesc => "agency_code",
			Self::PostedDateAsc | Self::PostedDateDesc => "post_date",
			Self::CloseDateAsc | Self::CloseDateDesc => "close_date",
		}
	}

	pub fn is_descending(self) -> bool {
		matches!(
			self,
			Self::OpportunityNumberDesc
				| Self::OpportunityTitleDesc
				| Self::AgencyDesc
				| Self::PostedDateDesc
				| Self::CloseDateDesc
		)
	}

	pub fn sort_direction(self) -> &'static str {
		if self.is_descending() { "descending" } else { "ascending" }
	}
}

/// A search result page. Top-level upstream fields beyond the known ones stay in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	pub data: Vec<Opportunity>,
	pub status_code: u16,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pagination_info: Option<PaginationInfo>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
	pub page_offset: u32,
	pub page_size: u32,
	pub total_pages: u32,
	pub total_records: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub order_by: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sort_direction: Option<String>,
}

/// One search hit. Fields the portal does not read are carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
	pub opportunity_id: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub opportunity_number: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub opportunity_title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub agency: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub opportunity_status: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub summary: Option<OpportunitySummary>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySummary {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub summary_description: Option<String>,
	/// ISO-8601 calendar date, e.g. `2024-03-01`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub post_date: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub close_date: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub award_floor: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub award_ceiling: Option<i64>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub funding_instruments: Vec<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub applicant_types: Vec<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
