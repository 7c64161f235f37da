//! Query predicate for campaign listings
//!
//! Syntax: whitespace separated tokens. `status:<value>` tokens are structured
//! filters, OR-combined with each other. Every other token is free text that
//! must appear (case-insensitive) in the campaign name or description.

use serde::{Deserialize, Serialize};

use crate::models::types::{Campaign, CampaignStatus};

const STATUS_FIELD: &str = "status";

/// Parsed listing query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignQuery {
    /// `None` when no status token was given. `Some(empty)` means only
    /// unrecognised statuses were given, which matches nothing.
    statuses: Option<Vec<CampaignStatus>>,
    terms: Vec<String>,
}

impl CampaignQuery {
    pub fn parse(query: &str) -> Self {
        let mut parsed = Self::default();

        for token in query.split_whitespace() {
            match split_filter(token) {
                Some((field, value)) if field.eq_ignore_ascii_case(STATUS_FIELD) => {
                    let statuses = parsed.statuses.get_or_insert_with(Vec::new);
                    if let Some(status) = CampaignStatus::parse(value) {
                        if !statuses.contains(&status) {
                            statuses.push(status);
                        }
                    }
                }
                _ => parsed.terms.push(token.to_lowercase()),
            }
        }
        parsed
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_none() && self.terms.is_empty()
    }

    pub fn matches(&self, campaign: &Campaign) -> bool {
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&campaign.status) {
                return false;
            }
        }
        if self.terms.is_empty() {
            return true;
        }

        let name = campaign.name.to_lowercase();
        let description = campaign.description.to_lowercase();
        self.terms
            .iter()
            .all(|term| name.contains(term.as_str()) || description.contains(term.as_str()))
    }
}

/// Visibility rules applied before the query predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Visibility {
    pub include_hidden: bool,
    pub include_pending: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            include_hidden: false,
            include_pending: true,
        }
    }
}

impl Visibility {
    /// Everything, used for favorites and featured lists
    pub const ALL: Visibility = Visibility {
        include_hidden: true,
        include_pending: true,
    };

    pub fn admits(&self, campaign: &Campaign) -> bool {
        (self.include_hidden || !campaign.hidden)
            && (self.include_pending || campaign.status != CampaignStatus::Pending)
    }
}

// ============================================
// Filter string helpers
// ============================================

fn split_filter(token: &str) -> Option<(&str, &str)> {
    let (field, value) = token.split_once(':')?;
    (!field.is_empty() && !value.is_empty()).then_some((field, value))
}

fn is_filter(token: &str, field: &str, value: &str) -> bool {
    split_filter(token)
        .map(|(f, v)| f.eq_ignore_ascii_case(field) && v.eq_ignore_ascii_case(value))
        .unwrap_or(false)
}

/// Whether `field:value` is present in `query`
pub fn filter_exists(query: &str, field: &str, value: &str) -> bool {
    query.split_whitespace().any(|t| is_filter(t, field, value))
}

/// Append `field:value` unless already present
pub fn add_filter(query: &str, field: &str, value: &str) -> String {
    let query = query.trim();
    if filter_exists(query, field, value) {
        return query.to_string();
    }
    let filter = format!("{}:{}", field, value);
    if query.is_empty() {
        filter
    } else {
        format!("{} {}", query, filter)
    }
}

/// Remove every `field:value` token, keeping the rest in order
pub fn remove_filter(query: &str, field: &str, value: &str) -> String {
    query
        .split_whitespace()
        .filter(|t| !is_filter(t, field, value))
        .collect::<Vec<_>>()
        .join(" ")
}
