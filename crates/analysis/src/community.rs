use normalizer::RawRepository;
use serde::Serialize;

/// GitHub only exposes current totals, so the "gained" fields stay zero.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommunityStats {
    pub stars_gained: u64,
    pub forks_gained: u64,
    pub current_stars: u64,
    pub current_forks: u64,
    pub star_growth_percentage: f64,
}

pub fn community_stats(repo: &RawRepository) -> CommunityStats {
    CommunityStats {
        stars_gained: 0,
        forks_gained: 0,
        current_stars: repo.stars,
        current_forks: repo.forks,
        star_growth_percentage: 0.0,
    }
}
