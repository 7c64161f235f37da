//! Integration tests for the discovery engine over the in-memory ledger

use campaign_discovery::models::{AddressPriority, CampaignStatus, DiscoveryConfig, ErrorCode};
use campaign_discovery::providers::memory::{sample_campaign_state, SAMPLE_DAO, SAMPLE_GOV_TOKEN};
use campaign_discovery::{DiscoveryEngine, InMemoryLedger, LedgerClient, Visibility};
use std::sync::Arc;

const CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Deterministic, well-formed contract address for `(group, index)`
fn addr(group: u64, index: usize) -> String {
    let tag: String = [group as usize, index / 32, index % 32]
        .iter()
        .map(|&d| CHARSET[d % 32] as char)
        .collect();
    format!("juno1{}{}", "q".repeat(55), tag)
}

fn config(code_ids: &[u64], cutoff: usize) -> DiscoveryConfig {
    DiscoveryConfig {
        code_ids: code_ids.to_vec(),
        addresses_halt_cutoff: cutoff,
        ..DiscoveryConfig::default()
    }
}

/// `per_group` open campaigns in each group, ledger pages of `ledger_page` addresses
fn seeded(groups: &[u64], per_group: usize, ledger_page: usize) -> Arc<InMemoryLedger> {
    let ledger = Arc::new(InMemoryLedger::new(ledger_page));
    for &group in groups {
        for i in 0..per_group {
            let name = format!("Campaign {}-{}", group, i);
            ledger.add_campaign(
                group,
                &addr(group, i),
                sample_campaign_state(&name, "community project", CampaignStatus::Open),
            );
        }
    }
    ledger
}

fn addresses(campaigns: &[campaign_discovery::Campaign]) -> Vec<String> {
    campaigns.iter().map(|c| c.address.clone()).collect()
}

// ============================================
// Paging
// ============================================

#[tokio::test]
async fn test_three_groups_paged_in_group_order() {
    let ledger = seeded(&[1, 2, 3], 5, 5);
    let engine = DiscoveryEngine::with_client(config(&[1, 2, 3], 1000), ledger.clone());

    let first = engine.get_page("", 1, 10).await.unwrap();
    let expected: Vec<String> = (0..5).map(|i| addr(1, i)).chain((0..5).map(|i| addr(2, i))).collect();
    assert_eq!(addresses(&first.campaigns), expected);
    assert!(first.has_more);

    let second = engine.get_page("", 2, 10).await.unwrap();
    let expected: Vec<String> = (0..5).map(|i| addr(3, i)).collect();
    assert_eq!(addresses(&second.campaigns), expected);
    assert!(!second.has_more);
}

#[tokio::test]
async fn test_repeated_page_is_identical_and_cached() {
    let ledger = seeded(&[1, 2], 7, 3);
    let engine = DiscoveryEngine::with_client(config(&[1, 2], 1000), ledger.clone());

    let first = engine.get_page("campaign", 2, 4).await.unwrap();
    let calls = ledger.total_calls();
    let second = engine.get_page("campaign", 2, 4).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ledger.total_calls(), calls, "second read must be served from cache");
}

#[tokio::test]
async fn test_cutoff_caps_every_page() {
    let ledger = seeded(&[1, 2, 3], 5, 5);
    let engine = DiscoveryEngine::with_client(config(&[1, 2, 3], 7), ledger.clone());

    let page = engine.get_page("", 1, 20).await.unwrap();
    let expected: Vec<String> = (0..5).map(|i| addr(1, i)).chain((0..2).map(|i| addr(2, i))).collect();
    assert_eq!(addresses(&page.campaigns), expected);
    assert!(!page.has_more);

    let small_pages = engine.get_page("", 2, 5).await.unwrap();
    assert_eq!(small_pages.campaigns.len(), 2);
    assert!(!small_pages.has_more);
    assert!(engine.get_page("", 3, 5).await.unwrap().campaigns.is_empty());

    let all = engine.all_campaigns().await.unwrap();
    assert_eq!(all.len(), 7);
}

#[tokio::test]
async fn test_deny_list_excluded_from_every_listing() {
    let ledger = seeded(&[1, 2, 3], 5, 2);
    let denied = [addr(1, 2), addr(3, 0)];
    ledger.set_deny_list(&[denied[0].as_str(), denied[1].as_str()]);
    ledger.set_featured(vec![AddressPriority {
        addr: denied[0].clone(),
        priority: 9,
    }]);
    let engine = DiscoveryEngine::with_client(config(&[1, 2, 3], 1000), ledger.clone());

    for query in ["", "status:open", "campaign", "Campaign 1-2"] {
        let page = engine.get_page(query, 1, 20).await.unwrap();
        for address in &denied {
            assert!(!addresses(&page.campaigns).contains(address), "{} leaked for {:?}", address, query);
        }
    }
    assert_eq!(engine.get_page("", 1, 20).await.unwrap().campaigns.len(), 13);
    assert!(engine.featured_campaigns().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_window_has_more_tracks_21st_match() {
    let ledger = seeded(&[1], 21, 10);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);
    let page = engine.get_page("", 1, 20).await.unwrap();
    assert_eq!(page.campaigns.len(), 20);
    assert!(page.has_more);

    let ledger = seeded(&[1], 20, 10);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);
    let page = engine.get_page("", 1, 20).await.unwrap();
    assert_eq!(page.campaigns.len(), 20);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_zero_size_makes_no_remote_calls() {
    let ledger = seeded(&[1], 5, 5);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger.clone());

    let page = engine.get_page("anything", 3, 0).await.unwrap();
    assert!(page.campaigns.is_empty());
    assert!(page.has_more);
    assert_eq!(ledger.total_calls(), 0);
}

#[tokio::test]
async fn test_page_beyond_universe_is_empty() {
    let ledger = seeded(&[1], 5, 5);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);

    let page = engine.get_page("", usize::MAX / 2, 2).await.unwrap();
    assert!(page.campaigns.is_empty());
    assert!(!page.has_more);

    let page = engine.get_page("campaign", usize::MAX, usize::MAX).await.unwrap();
    assert!(page.campaigns.is_empty());
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_page_zero_is_first_page() {
    let ledger = seeded(&[1], 5, 5);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);
    let zero = engine.get_page("", 0, 3).await.unwrap();
    let one = engine.get_page("", 1, 3).await.unwrap();
    assert_eq!(zero, one);
}

// ============================================
// Query & visibility
// ============================================

#[tokio::test]
async fn test_status_and_text_query() {
    let ledger = Arc::new(InMemoryLedger::new(10));
    let rows = [
        ("Rocket Garden", "plants", CampaignStatus::Funded),
        ("Moon rocket", "space", CampaignStatus::Open),
        ("Boat", "a ROCKET-powered boat", CampaignStatus::Funded),
        ("Tree", "forest", CampaignStatus::Funded),
    ];
    for (i, (name, description, status)) in rows.iter().enumerate() {
        ledger.add_campaign(1, &addr(1, i), sample_campaign_state(name, description, *status));
    }
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);

    let page = engine.get_page("status:Funded rocket", 1, 20).await.unwrap();
    let names: Vec<&str> = page.campaigns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Rocket Garden", "Boat"]);
    assert!(!page.has_more);

    let either = engine.get_page("status:open status:funded", 1, 20).await.unwrap();
    assert_eq!(either.campaigns.len(), 4);
    assert!(engine.get_page("status:live", 1, 20).await.unwrap().campaigns.is_empty());
}

#[tokio::test]
async fn test_filter_scans_past_non_matching_batches() {
    let ledger = Arc::new(InMemoryLedger::new(4));
    for i in 0..12 {
        let status = if i % 4 == 3 { CampaignStatus::Funded } else { CampaignStatus::Open };
        ledger.add_campaign(1, &addr(1, i), sample_campaign_state("c", "d", status));
    }
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);

    let page = engine.get_page("status:funded", 1, 2).await.unwrap();
    assert_eq!(addresses(&page.campaigns), vec![addr(1, 3), addr(1, 7)]);
    assert!(page.has_more);

    let page = engine.get_page("status:funded", 2, 2).await.unwrap();
    assert_eq!(addresses(&page.campaigns), vec![addr(1, 11)]);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_hidden_and_pending_visibility() {
    let ledger = Arc::new(InMemoryLedger::new(10));
    let mut hidden = sample_campaign_state("Secret", "", CampaignStatus::Open);
    hidden.campaign_info.hidden = true;
    ledger.add_campaign(1, &addr(1, 0), hidden);
    ledger.add_campaign(1, &addr(1, 1), sample_campaign_state("Soon", "", CampaignStatus::Pending));
    ledger.add_campaign(1, &addr(1, 2), sample_campaign_state("Live", "", CampaignStatus::Open));
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);

    let default = engine.get_page("", 1, 10).await.unwrap();
    assert_eq!(addresses(&default.campaigns), vec![addr(1, 1), addr(1, 2)]);

    let everything = engine.get_page_with("", 1, 10, Visibility::ALL).await.unwrap();
    assert_eq!(everything.campaigns.len(), 3);

    let strict = Visibility {
        include_hidden: false,
        include_pending: false,
    };
    let live = engine.get_page_with("", 1, 10, strict).await.unwrap();
    assert_eq!(addresses(&live.campaigns), vec![addr(1, 2)]);
}

// ============================================
// Failures
// ============================================

#[tokio::test]
async fn test_single_failure_is_contained() {
    let ledger = seeded(&[1, 2, 3], 5, 5);
    let broken = addr(2, 1);
    ledger.fail(&broken);
    let engine = DiscoveryEngine::with_client(config(&[1, 2, 3], 1000), ledger.clone());

    let page = engine.get_page("", 1, 20).await.unwrap();
    assert_eq!(page.campaigns.len(), 14);
    assert!(!addresses(&page.campaigns).contains(&broken));

    let response = engine.get_campaign(&broken, false).await;
    assert!(response.campaign.is_none());
    let error = response.error.unwrap();
    assert_eq!(error.code, ErrorCode::RemoteReadFailure);
    assert!(error.message.contains(&broken));
}

#[tokio::test]
async fn test_failed_code_group_is_skipped() {
    let ledger = seeded(&[1, 2], 3, 5);
    ledger.fail("code:1");
    let engine = DiscoveryEngine::with_client(config(&[1, 2], 1000), ledger);

    let page = engine.get_page("", 1, 10).await.unwrap();
    assert_eq!(addresses(&page.campaigns), (0..3).map(|i| addr(2, i)).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_deny_list_failure_fails_the_page() {
    let ledger = seeded(&[1], 3, 5);
    ledger.set_deny_list_down(true);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger.clone());

    let error = engine.get_page("", 1, 10).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::RemoteReadFailure);

    // Single reads do not depend on the deny list.
    assert!(engine.get_campaign(&addr(1, 0), false).await.campaign.is_some());

    ledger.set_deny_list_down(false);
    engine.refresh_listings();
    assert_eq!(engine.get_page("", 1, 10).await.unwrap().campaigns.len(), 3);
}

#[tokio::test]
async fn test_missing_client_then_connect() {
    let ledger = seeded(&[1], 3, 5);
    let engine = DiscoveryEngine::new(config(&[1], 1000));

    let error = engine.get_page("", 1, 10).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ClientUnavailable);
    let response = engine.get_campaign(&addr(1, 0), false).await;
    assert_eq!(response.error.unwrap().code, ErrorCode::ClientUnavailable);

    let client: Arc<dyn LedgerClient> = ledger;
    engine.set_client(Some(client));
    assert_eq!(engine.get_page("", 1, 10).await.unwrap().campaigns.len(), 3);
    assert!(engine.get_campaign(&addr(1, 0), false).await.campaign.is_some());
}

#[tokio::test]
async fn test_invalid_address_rejected_without_remote_calls() {
    let ledger = seeded(&[1], 1, 5);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger.clone());

    for input in ["", "   ", "juno1short", "osmo1qpzry9x8gf2tvdw0s3jn54khce6mua7l"] {
        let response = engine.get_campaign(input, false).await;
        assert_eq!(response.error.unwrap().code, ErrorCode::InvalidAddress, "{:?}", input);
    }
    assert_eq!(ledger.total_calls(), 0);
}

#[tokio::test]
async fn test_normalizer_rejection_is_unknown_error() {
    let ledger = Arc::new(InMemoryLedger::new(5));
    let mut state = sample_campaign_state("Broken", "", CampaignStatus::Open);
    state.funding_goal.amount = "not-a-number".to_string();
    ledger.add_campaign(1, &addr(1, 0), state);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);

    let error = engine.get_campaign(&addr(1, 0), false).await.error.unwrap();
    assert_eq!(error.code, ErrorCode::NormalizationFailure);
    assert_eq!(error.message, "Unknown error.");
    assert!(engine.get_page("", 1, 10).await.unwrap().campaigns.is_empty());
}

// ============================================
// Refresh
// ============================================

#[tokio::test]
async fn test_bump_refresh_refetches_campaign() {
    let ledger = seeded(&[1], 2, 5);
    let target = addr(1, 0);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger.clone());
    assert_eq!(engine.get_page("", 1, 10).await.unwrap().campaigns.len(), 2);

    let before = engine.get_campaign(&target, false).await.campaign.unwrap();
    assert_eq!(before.pledged, 250_000_000);
    let state_calls = ledger.calls("contract_state");

    let mut updated = sample_campaign_state("Campaign 1-0", "community project", CampaignStatus::Funded);
    updated.funds_raised.amount = "1000000000".to_string();
    ledger.set_state(&target, updated);

    let cached = engine.get_campaign(&target, false).await.campaign.unwrap();
    assert_eq!(cached.pledged, 250_000_000);
    assert_eq!(ledger.calls("contract_state"), state_calls);

    engine.bump_refresh(&target);
    let after = engine.get_campaign(&target, false).await.campaign.unwrap();
    assert_eq!(after.pledged, 1_000_000_000);
    assert_eq!(after.status, CampaignStatus::Funded);
    assert_eq!(ledger.calls("contract_state"), state_calls + 1);

    // Listings see the new value too, other campaigns stay cached.
    let page = engine.get_page("status:funded", 1, 10).await.unwrap();
    assert_eq!(addresses(&page.campaigns), vec![target]);
    assert_eq!(ledger.calls("contract_state"), state_calls + 1);
}

#[tokio::test]
async fn test_bump_refresh_on_token_refetches_balances() {
    let ledger = seeded(&[1], 1, 5);
    let target = addr(1, 0);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger.clone());

    let campaign = engine.get_campaign(&target, false).await.campaign.unwrap();
    assert_eq!(campaign.gov_token.campaign_balance, 0);

    ledger.set_balance(SAMPLE_GOV_TOKEN, &target, 700);
    ledger.set_balance(SAMPLE_GOV_TOKEN, SAMPLE_DAO, 300);
    engine.bump_refresh(SAMPLE_GOV_TOKEN);

    let campaign = engine.get_campaign(&target, false).await.campaign.unwrap();
    assert_eq!(campaign.gov_token.campaign_balance, 700);
    assert_eq!(campaign.gov_token.dao_balance, 300);
}

#[tokio::test]
async fn test_refresh_listings_picks_up_new_contracts() {
    let ledger = seeded(&[1], 2, 5);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger.clone());
    assert_eq!(engine.get_page("", 1, 10).await.unwrap().campaigns.len(), 2);

    ledger.add_campaign(1, &addr(1, 2), sample_campaign_state("New", "", CampaignStatus::Open));
    assert_eq!(engine.get_page("", 1, 10).await.unwrap().campaigns.len(), 2);

    let state_calls = ledger.calls("contract_state");
    engine.refresh_listings();
    assert_eq!(engine.get_page("", 1, 10).await.unwrap().campaigns.len(), 3);
    // Only the new campaign's state is fetched.
    assert_eq!(ledger.calls("contract_state"), state_calls + 1);
}

// ============================================
// Concurrency
// ============================================

#[tokio::test]
async fn test_concurrent_pages_share_resolutions() {
    let ledger = seeded(&[1, 2], 6, 3);
    let engine = DiscoveryEngine::with_client(config(&[1, 2], 1000), ledger.clone());

    let target = addr(1, 0);
    let (a, b, c) = tokio::join!(
        engine.get_page("", 1, 12),
        engine.get_page("campaign", 1, 12),
        engine.get_campaign(&target, false),
    );
    assert_eq!(a.unwrap().campaigns.len(), 12);
    assert_eq!(b.unwrap().campaigns.len(), 12);
    assert!(c.campaign.is_some());
    assert_eq!(ledger.calls("contract_state"), 12);
    assert_eq!(ledger.calls("deny_list_addresses"), 1);
}

// ============================================
// Supplementary reads
// ============================================

#[tokio::test]
async fn test_featured_sorted_by_priority() {
    let ledger = seeded(&[1], 4, 5);
    ledger.set_featured(vec![
        AddressPriority { addr: addr(1, 0), priority: 1 },
        AddressPriority { addr: addr(1, 3), priority: 5 },
        AddressPriority { addr: addr(1, 2), priority: 3 },
    ]);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);

    let featured = engine.featured_campaigns().await.unwrap();
    assert_eq!(addresses(&featured), vec![addr(1, 3), addr(1, 2), addr(1, 0)]);
    assert!(featured.iter().all(|c| c.featured));

    let page = engine.get_page("", 1, 10).await.unwrap();
    assert!(!page.campaigns[1].featured);
}

#[tokio::test]
async fn test_name_service_labels_and_lookup() {
    let ledger = seeded(&[1], 2, 5);
    ledger.register_name("rocket", &addr(1, 1));
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);

    let page = engine.get_page("", 1, 10).await.unwrap();
    assert_eq!(page.campaigns[0].dens_name, None);
    assert_eq!(page.campaigns[1].dens_name.as_deref(), Some("rocket"));

    assert_eq!(engine.resolve_campaign_address("Rocket").await.unwrap(), addr(1, 1));
    assert_eq!(engine.resolve_campaign_address(&addr(1, 0)).await.unwrap(), addr(1, 0));
    let error = engine.resolve_campaign_address("unknown").await.unwrap_err();
    assert_eq!(error.code, ErrorCode::NameNotFound);
}

#[tokio::test]
async fn test_full_read_includes_creation_height() {
    let ledger = seeded(&[1], 2, 5);
    ledger.set_creation_height(&addr(1, 0), 4_211);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger.clone());

    let full = engine.get_campaign(&addr(1, 0), true).await.campaign.unwrap();
    assert_eq!(full.created_at_height, Some(4_211));
    let list = engine.get_campaign(&addr(1, 0), false).await.campaign.unwrap();
    assert_eq!(list.created_at_height, None);

    // Missing height degrades to None instead of failing the campaign.
    let other = engine.get_campaign(&addr(1, 1), true).await.campaign.unwrap();
    assert_eq!(other.created_at_height, None);

    engine.get_page("", 1, 10).await.unwrap();
    assert_eq!(ledger.calls("creation_height"), 2);
}

#[tokio::test]
async fn test_favorites_follow_the_cell() {
    let ledger = seeded(&[1], 3, 5);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);
    assert!(engine.favorite_campaigns().await.unwrap().is_empty());

    engine.set_favorites(vec![addr(1, 2), addr(1, 0)]);
    let favorites = engine.favorite_campaigns().await.unwrap();
    assert_eq!(addresses(&favorites), vec![addr(1, 2), addr(1, 0)]);
    assert_eq!(engine.favorites().len(), 2);
}

#[tokio::test]
async fn test_wallet_balance_and_token_info() {
    let ledger = seeded(&[1], 1, 5);
    let info = campaign_discovery::models::TokenInfo {
        name: "Gov".to_string(),
        symbol: "GOV".to_string(),
        decimals: 6,
        total_supply: "2000000".to_string(),
    };
    ledger.set_token_info(SAMPLE_GOV_TOKEN, info.clone());
    ledger.set_balance(SAMPLE_GOV_TOKEN, "juno1wallet", 42);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);

    assert_eq!(engine.token_info(SAMPLE_GOV_TOKEN).await.unwrap(), info);
    assert_eq!(engine.wallet_token_balance(SAMPLE_GOV_TOKEN).await.unwrap(), None);

    engine.set_wallet_address(Some("juno1wallet".to_string()));
    assert_eq!(engine.wallet_token_balance(SAMPLE_GOV_TOKEN).await.unwrap(), Some(42));

    engine.set_wallet_address(None);
    assert_eq!(engine.wallet_token_balance(SAMPLE_GOV_TOKEN).await.unwrap(), None);
}

#[tokio::test]
async fn test_distinct_queries_do_not_grow_cache_unbounded() {
    let ledger = seeded(&[1], 5, 5);
    let bounded = DiscoveryConfig {
        max_cached_nodes: 100,
        ..config(&[1], 1000)
    };
    let engine = DiscoveryEngine::with_client(bounded, ledger.clone());
    let first = engine.get_page("", 1, 2).await.unwrap();

    for i in 0..500 {
        engine.get_page(&format!("q{}", i), 1, 2).await.unwrap();
        if i % 50 == 49 {
            engine.evict_idle();
        }
    }
    let stats = engine.stats();
    assert!(stats.nodes <= 100, "{} nodes cached", stats.nodes);
    assert!(stats.evictions >= 400);

    // Evicted results are recomputed on demand.
    assert_eq!(engine.get_page("", 1, 2).await.unwrap(), first);
}

#[tokio::test]
async fn test_idle_results_are_evicted_and_recomputed() {
    let ledger = seeded(&[1], 3, 5);
    let eager = DiscoveryConfig {
        cache_max_idle: std::time::Duration::ZERO,
        ..config(&[1], 1000)
    };
    let engine = DiscoveryEngine::with_client(eager, ledger.clone());

    let before = engine.get_page("", 1, 10).await.unwrap();
    let calls = ledger.calls("contract_state");
    assert!(engine.evict_idle() > 0);
    assert_eq!(engine.stats().nodes, 0);

    assert_eq!(engine.get_page("", 1, 10).await.unwrap(), before);
    assert_eq!(ledger.calls("contract_state"), calls * 2);

    // Refresh keeps working on recomputed nodes.
    engine.bump_refresh(&addr(1, 0));
    engine.get_page("", 1, 10).await.unwrap();
    assert_eq!(ledger.calls("contract_state"), calls * 2 + 1);
}

#[tokio::test]
async fn test_stats_track_evaluations() {
    let ledger = seeded(&[1], 3, 5);
    let engine = DiscoveryEngine::with_client(config(&[1], 1000), ledger);
    engine.get_page("", 1, 10).await.unwrap();

    let stats = engine.stats();
    assert!(stats.evaluations > 0);
    assert!(stats.nodes > 0);
    assert!(stats.edges > 0);

    let generation = stats.generation;
    engine.bump_refresh(&addr(1, 0));
    assert!(engine.stats().generation > generation);
    assert!(engine.stats().invalidations > 0);
}
