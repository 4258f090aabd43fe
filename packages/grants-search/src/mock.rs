use std::{cmp::Ordering, collections::BTreeSet};

use serde_json::Map;

use crate::{
	BoxFuture, Error, Opportunity, PaginationInfo, Result, SearchFetcher, SearchFetcherProps,
	SearchResponse, SortOption,
};

const FIXTURE: &str = include_str!("../fixtures/opportunities.json");

/// Offline strategy. Filters, sorts, and paginates a fixed set of opportunities in memory.
#[derive(Debug, Clone)]
pub struct MockSearchFetcher {
	opportunities: Vec<Opportunity>,
	page_size: u32,
}
impl MockSearchFetcher {
	/// Loads the bundled fixture.
	pub fn new(page_size: u32) -> Result<Self> {
		let opportunities: Vec<Opportunity> = serde_json::from_str(FIXTURE)?;

		Self::from_opportunities(opportunities, page_size)
	}

	pub fn from_opportunities(opportunities: Vec<Opportunity>, page_size: u32) -> Result<Self> {
		if page_size == 0 {
			return Err(Error::InvalidConfig {
				message: "Mock search page size must be greater than zero.".to_string(),
			});
		}

		Ok(Self { opportunities, page_size })
	}

	pub fn search(&self, props: &SearchFetcherProps) -> SearchResponse {
		let query = props.query_text().map(str::to_lowercase);
		let mut hits: Vec<&Opportunity> = self
			.opportunities
			.iter()
			.filter(|opportunity| matches_query(opportunity, query.as_deref()))
			.filter(|opportunity| matches_one(&props.status, opportunity.opportunity_status.as_deref()))
			.filter(|opportunity| matches_one(&props.agency, opportunity.agency.as_deref()))
			.filter(|opportunity| matches_one(&props.category, opportunity.category.as_deref()))
			.filter(|opportunity| {
				matches_any(&props.funding_instrument, summary_list(opportunity, |s| &s.funding_instruments))
			})
			.filter(|opportunity| {
				matches_any(&props.eligibility, summary_list(opportunity, |s| &s.applicant_types))
			})
			.collect();

		hits.sort_by(|a, b| compare(a, b, props.sort_by));

		let total_records = hits.len() as u64;
		let page_size = self.page_size;
		let page_offset = props.page_offset();
		let total_pages = total_records.div_ceil(u64::from(page_size)) as u32;
		let skip = (page_offset as usize - 1).saturating_mul(page_size as usize);
		let data = hits.into_iter().skip(skip).take(page_size as usize).cloned().collect();

		SearchResponse {
			data,
			status_code: 200,
			message: "Success".to_string(),
			pagination_info: Some(PaginationInfo {
				page_offset,
				page_size,
				total_pages,
				total_records,
				order_by: Some(props.sort_by.order_by().to_string()),
				sort_direction: Some(props.sort_by.sort_direction().to_string()),
			}),
			extra: Map::new(),
		}
	}
}
impl SearchFetcher for MockSearchFetcher {
	fn fetch_opportunities<'a>(
		&'a self,
		props: &'a SearchFetcherProps,
	) -> BoxFuture<'a, Result<SearchResponse>> {
		Box::pin(async move { Ok(self.search(props)) })
	}
}

fn matches_query(opportunity: &Opportunity, query: Option<&str>) -> bool {
	let Some(query) = query else {
		return true;
	};
	let description =
		opportunity.summary.as_ref().and_then(|summary| summary.summary_description.as_deref());

	[
		opportunity.opportunity_title.as_deref(),
		opportunity.opportunity_number.as_deref(),
		opportunity.agency.as_deref(),
		description,
	]
	.into_iter()
	.flatten()
	.any(|field| field.to_lowercase().contains(query))
}

fn matches_one(wanted: &BTreeSet<String>, value: Option<&str>) -> bool {
	wanted.is_empty() || value.map(|value| wanted.contains(value)).unwrap_or(false)
}

fn matches_any(wanted: &BTreeSet<String>, values: &[String]) -> bool {
	wanted.is_empty() || values.iter().any(|value| wanted.contains(value))
}

fn summary_list(
	opportunity: &Opportunity,
	pick: impl Fn(&crate::OpportunitySummary) -> &Vec<String>,
) -> &[String] {
	opportunity.summary.as_ref().map(|summary| pick(summary).as_slice()).unwrap_or(&[])
}

fn sort_key(opportunity: &Opportunity, sort_by: SortOption) -> Option<&str> {
	let summary = opportunity.summary.as_ref();

	match sort_by.order_by() {
		"opportunity_number" => opportunity.opportunity_number.as_deref(),
		"opportunity_title" => opportunity.opportunity_title.as_deref(),
		"agency_code" => opportunity.agency.as_deref(),
		"close_date" => summary.and_then(|summary| summary.close_date.as_deref()),
		_ => summary.and_then(|summary| summary.post_date.as_deref()),
	}
}

/// Missing keys sort last in both directions; ties fall back to ascending id.
fn compare(a: &Opportunity, b: &Opportunity, sort_by: SortOption) -> Ordering {
	let ordering = match (sort_key(a, sort_by), sort_key(b, sort_by)) {
		(Some(left), Some(right)) =>
			if sort_by.is_descending() {
				right.cmp(left)
			} else {
				left.cmp(right)
			},
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	};

	ordering.then_with(|| a.opportunity_id.cmp(&b.opportunity_id))
}
