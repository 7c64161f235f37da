//! Campaign normalizer
//!
//! Pure transformation of raw escrow state plus resolved balances into the
//! denormalized [`Campaign`] view. No I/O.

use std::collections::HashMap;

use crate::models::types::{
    AddressPriority, Campaign, FundingToken, GovToken, RawCampaignState,
};

/// Campaign address -> name-service label
pub type NameMap = HashMap<String, String>;

/// Build a campaign view. Returns `None` when the raw amounts are not valid
/// integers.
pub fn normalize(
    address: &str,
    created_at_height: Option<u64>,
    state: &RawCampaignState,
    campaign_gov_balance: u128,
    dao_gov_balance: u128,
    featured: &[AddressPriority],
    name_map: &NameMap,
) -> Option<Campaign> {
    let goal = parse_amount(&state.funding_goal.amount)?;
    let pledged = parse_amount(&state.funds_raised.amount)?;

    let details = state.status.details();
    let info = &state.campaign_info;
    let gov_info = state.gov_token_info.as_ref();

    Some(Campaign {
        address: address.to_string(),
        name: info.name.clone(),
        description: info.description.clone(),
        status: state.status.status(),
        hidden: info.hidden,
        featured: featured.iter().any(|f| f.addr == address),
        dens_name: name_map.get(address).cloned(),
        created_at_height,
        creator: state.creator.clone(),
        dao_address: state.dao_addr.clone(),
        version: state.version.clone(),

        goal,
        pledged,
        funding_token: FundingToken {
            address: state.funding_token_addr.clone(),
            is_cw20: state.funding_goal.is_token,
            name: state.funding_token_info.name.clone(),
            symbol: state.funding_token_info.symbol.clone(),
            decimals: state.funding_token_info.decimals,
        },
        gov_token: GovToken {
            address: state.gov_token_addr.clone(),
            name: gov_info.map(|t| t.name.clone()),
            symbol: gov_info.map(|t| t.symbol.clone()),
            decimals: gov_info.map(|t| t.decimals),
            campaign_balance: campaign_gov_balance,
            dao_balance: dao_gov_balance,
            initial_campaign_balance: details
                .initial_gov_token_balance
                .as_deref()
                .and_then(parse_amount),
            price: details
                .token_price
                .as_deref()
                .and_then(|p| p.trim().parse::<f64>().ok())
                .filter(|p| p.is_finite()),
        },

        image_url: info.image_url.clone(),
        profile_image_url: info.profile_image_url.clone(),
        description_image_urls: info.description_image_urls.clone().unwrap_or_default(),
        website: info.website.clone(),
        twitter: info.twitter.clone(),
        discord: info.discord.clone(),
    })
}

fn parse_amount(raw: &str) -> Option<u128> {
    raw.trim().parse::<u128>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::CampaignStatus;
    use crate::providers::memory::{sample_campaign_state, SAMPLE_GOV_TOKEN};

    #[test]
    fn test_normalize_sample() {
        let state = sample_campaign_state("Rocket Fund", "to the moon", CampaignStatus::Open);
        let featured = vec![AddressPriority {
            addr: "juno1camp".to_string(),
            priority: 3,
        }];
        let mut names = NameMap::new();
        names.insert("juno1camp".to_string(), "rocket".to_string());

        let campaign =
            normalize("juno1camp", Some(42), &state, 700, 300, &featured, &names).unwrap();

        assert_eq!(campaign.status, CampaignStatus::Open);
        assert_eq!(campaign.goal, 1_000_000_000);
        assert_eq!(campaign.pledged, 250_000_000);
        assert!(campaign.featured);
        assert_eq!(campaign.dens_name.as_deref(), Some("rocket"));
        assert_eq!(campaign.created_at_height, Some(42));
        assert_eq!(campaign.gov_token.address, SAMPLE_GOV_TOKEN);
        assert_eq!(campaign.gov_token.campaign_balance, 700);
        assert_eq!(campaign.gov_token.dao_balance, 300);
        assert_eq!(campaign.gov_token.initial_campaign_balance, Some(1_000_000));
        assert_eq!(campaign.gov_token.price, Some(0.5));
        assert_eq!(campaign.progress_percent(), 25.0);
    }

    #[test]
    fn test_normalize_rejects_bad_amount() {
        let mut state = sample_campaign_state("x", "y", CampaignStatus::Funded);
        state.funds_raised.amount = "12abc".to_string();
        assert!(normalize("juno1camp", None, &state, 0, 0, &[], &NameMap::new()).is_none());
    }

    #[test]
    fn test_pending_has_no_price() {
        let state = sample_campaign_state("x", "y", CampaignStatus::Pending);
        let campaign = normalize("juno1camp", None, &state, 0, 0, &[], &NameMap::new()).unwrap();
        assert_eq!(campaign.status, CampaignStatus::Pending);
        assert!(!campaign.featured);
        assert_eq!(campaign.gov_token.price, None);
        assert_eq!(campaign.dens_name, None);
    }
}
