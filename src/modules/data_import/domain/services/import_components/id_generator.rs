//! Candidate id sourcing.
//!
//! A [`Strategy`] expands into an ordered list of [`Bucket`]s. Id buckets are
//! computed up front from a seeded generator; listing buckets are resolved
//! against the catalog source when the campaign reaches them.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::log_debug;
use crate::modules::provider::{CatalogSource, PageFilter, RawAnime, SourceError, SourceResult};

/// Default campaign size the built-in tables are calibrated for.
pub const REFERENCE_TARGET: usize = 100_000;
pub const RANDOM_BATCH_SIZE: usize = 100;
pub const RANDOM_ATTEMPT_FACTOR: usize = 3;
pub const DEFAULT_SEED: u64 = 0x5eed_a11e;

const LISTING_PAGE_SIZE: u32 = 50;
const LISTING_PAGE_RETRIES: u32 = 3;
/// Safety stop for sources that ignore the page parameter.
const MAX_LISTING_PAGES: u32 = 400;

const RANGE_BANDS: [(i64, i64, usize); 4] = [
    (1, 10_000, 10_000),
    (10_001, 30_000, 15_000),
    (30_001, 60_000, 10_000),
    (60_001, 100_000, 5_000),
];

const GENRES: [(i64, &str, usize); 12] = [
    (1, "Action", 3000),
    (2, "Adventure", 2000),
    (4, "Comedy", 2500),
    (7, "Mystery", 1500),
    (10, "Fantasy", 2000),
    (22, "Romance", 1500),
    (27, "Shounen", 2000),
    (28, "Shoujo", 1000),
    (24, "Sci-Fi", 1500),
    (36, "Slice of Life", 1500),
    (31, "Supernatural", 1500),
    (40, "Psychological", 1000),
];

pub const CLASSIC_IDS: [i64; 44] = [
    1, 20, 1535, 164, 813, 6702, 11061, 9253, 6547, 20507, 21881, 22319, 23273, 24701, 28223,
    30276, 31964, 32935, 33352, 34321, 34933, 37491, 38000, 39486, 40456, 40748, 41587, 42938,
    44135, 48561, 48607, 48926, 49129, 49596, 5114, 5081, 47257, 48583, 47917, 49762, 50602,
    50631, 51179, 52034,
];

fn year_table() -> Vec<(i32, usize)> {
    let mut years: Vec<(i32, usize)> = Vec::new();
    years.extend((2010..=2024).rev().map(|y| (y, 1500)));
    years.extend((2002..=2009).rev().map(|y| (y, 1000)));
    years.extend((1995..=2001).rev().map(|y| (y, 500)));
    years.extend([(1990, 300), (1985, 200), (1980, 100), (1975, 50), (1970, 50)]);
    years
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBand {
    pub start: i64,
    pub end: i64,
    pub target: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearTarget {
    pub year: i32,
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreTarget {
    pub genre_id: i64,
    pub name: String,
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    RangeWeighted { bands: Vec<RangeBand>, seed: u64 },
    YearBucketed { years: Vec<YearTarget> },
    GenreBucketed { genres: Vec<GenreTarget> },
    UniformRandom { target: usize, seed: u64 },
    PopularListing { target: usize },
    Curated { ids: Vec<i64> },
}

impl Strategy {
    pub fn ranges(target: usize, seed: u64) -> Self {
        let bands = RANGE_BANDS
            .iter()
            .map(|&(start, end, count)| RangeBand {
                start,
                end,
                target: scale(count, target, 40_000),
            })
            .filter(|band| band.target > 0)
            .collect();
        Strategy::RangeWeighted { bands, seed }
    }

    pub fn years(target: usize) -> Self {
        let years = year_table()
            .into_iter()
            .map(|(year, count)| YearTarget {
                year,
                target: scale(count, target, 30_000),
            })
            .filter(|y| y.target > 0)
            .collect();
        Strategy::YearBucketed { years }
    }

    /// Descending year span with an even per-year target.
    pub fn year_span(start_year: i32, end_year: i32, per_year: usize) -> Self {
        let (low, high) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };
        let years = (low..=high)
            .rev()
            .map(|year| YearTarget {
                year,
                target: per_year,
            })
            .collect();
        Strategy::YearBucketed { years }
    }

    pub fn genres(target: usize) -> Self {
        let genres = GENRES
            .iter()
            .map(|&(genre_id, name, count)| GenreTarget {
                genre_id,
                name: name.to_string(),
                target: scale(count, target, 20_000),
            })
            .filter(|g| g.target > 0)
            .collect();
        Strategy::GenreBucketed { genres }
    }

    pub fn random(target: usize, seed: u64) -> Self {
        Strategy::UniformRandom { target, seed }
    }

    pub fn popular(target: usize) -> Self {
        Strategy::PopularListing { target }
    }

    pub fn classics() -> Self {
        Strategy::Curated {
            ids: CLASSIC_IDS.to_vec(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::RangeWeighted { .. } => "ranges",
            Strategy::YearBucketed { .. } => "years",
            Strategy::GenreBucketed { .. } => "genres",
            Strategy::UniformRandom { .. } => "random",
            Strategy::PopularListing { .. } => "popular",
            Strategy::Curated { .. } => "classics",
        }
    }

    /// Sum of the per-bucket targets.
    pub fn target(&self) -> usize {
        match self {
            Strategy::RangeWeighted { bands, .. } => bands.iter().map(|b| b.target).sum(),
            Strategy::YearBucketed { years } => years.iter().map(|y| y.target).sum(),
            Strategy::GenreBucketed { genres } => genres.iter().map(|g| g.target).sum(),
            Strategy::UniformRandom { target, .. } | Strategy::PopularListing { target } => {
                *target
            }
            Strategy::Curated { ids } => ids.len(),
        }
    }
}

/// `count` rescaled from a table calibrated for `reference` to `target`.
fn scale(count: usize, target: usize, reference: usize) -> usize {
    if target == 0 || reference == 0 {
        return 0;
    }
    ((count as f64) * (target as f64) / (reference as f64)).ceil() as usize
}

#[derive(Debug, Clone, PartialEq)]
pub enum Bucket {
    Ids {
        label: String,
        ids: Vec<i64>,
    },
    Listing {
        label: String,
        filter: PageFilter,
        target: usize,
        single_page: bool,
    },
}

impl Bucket {
    pub fn label(&self) -> &str {
        match self {
            Bucket::Ids { label, .. } | Bucket::Listing { label, .. } => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyPlan {
    pub name: String,
    pub target: usize,
    pub buckets: Vec<Bucket>,
}

/// Ordered strategies of one campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignPlan {
    pub strategies: Vec<StrategyPlan>,
}

impl CampaignPlan {
    /// Ranges, years, genres and random draws split 40/30/20/10.
    pub fn staged(target: usize, seed: u64) -> Self {
        let ranges = target * 40 / 100;
        let years = target * 30 / 100;
        let genres = target * 20 / 100;
        let random = target.saturating_sub(ranges + years + genres);

        let strategies = vec![
            IdGenerator::plan_with_target(&Strategy::ranges(ranges, seed), ranges),
            IdGenerator::plan_with_target(&Strategy::years(years), years),
            IdGenerator::plan_with_target(&Strategy::genres(genres), genres),
            IdGenerator::plan_with_target(&Strategy::random(random, seed), random),
        ];
        Self { strategies }
    }

    /// One strategy capped at `limit` or its own bucket total.
    pub fn single(strategy: &Strategy, limit: usize) -> Self {
        let target = limit.min(strategy.target());
        Self {
            strategies: vec![IdGenerator::plan_with_target(strategy, target)],
        }
    }

    pub fn total_target(&self) -> usize {
        self.strategies.iter().map(|s| s.target).sum()
    }
}

pub struct IdGenerator;

impl IdGenerator {
    pub fn plan(strategy: &Strategy) -> StrategyPlan {
        Self::plan_with_target(strategy, strategy.target())
    }

    /// Plan whose import target is `target` rather than the bucket sum.
    pub fn plan_with_target(strategy: &Strategy, target: usize) -> StrategyPlan {
        let buckets = match strategy {
            Strategy::RangeWeighted { bands, seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                bands
                    .iter()
                    .map(|band| Bucket::Ids {
                        label: format!("ids {}-{}", band.start, band.end),
                        ids: sample_band(band, &mut rng),
                    })
                    .collect()
            }
            Strategy::YearBucketed { years } => years
                .iter()
                .map(|y| Bucket::Listing {
                    label: format!("year {}", y.year),
                    filter: PageFilter::by_year(y.year),
                    target: y.target,
                    single_page: false,
                })
                .collect(),
            Strategy::GenreBucketed { genres } => genres
                .iter()
                .map(|g| Bucket::Listing {
                    label: format!("genre {}", g.name),
                    filter: PageFilter::by_genre(g.genre_id),
                    target: g.target,
                    single_page: true,
                })
                .collect(),
            Strategy::UniformRandom { target, seed } => random_draws(*target, *seed)
                .chunks(RANDOM_BATCH_SIZE)
                .enumerate()
                .map(|(i, chunk)| Bucket::Ids {
                    label: format!("random batch {}", i + 1),
                    ids: chunk.to_vec(),
                })
                .collect(),
            Strategy::PopularListing { target } => vec![Bucket::Listing {
                label: "popular".to_string(),
                filter: PageFilter::popular(),
                target: *target,
                single_page: false,
            }],
            Strategy::Curated { ids } => vec![Bucket::Ids {
                label: "classics".to_string(),
                ids: ids.clone(),
            }],
        };

        StrategyPlan {
            name: strategy.name().to_string(),
            target,
            buckets,
        }
    }

    /// Every id the strategy yields without consulting the source.
    /// Listing buckets contribute nothing here.
    pub fn generate(strategy: &Strategy) -> Vec<i64> {
        Self::plan(strategy)
            .buckets
            .into_iter()
            .flat_map(|bucket| match bucket {
                Bucket::Ids { ids, .. } => ids,
                Bucket::Listing { .. } => Vec::new(),
            })
            .collect()
    }

    pub async fn resolve_bucket(
        source: &dyn CatalogSource,
        bucket: &Bucket,
    ) -> SourceResult<Vec<i64>> {
        match bucket {
            Bucket::Ids { ids, .. } => Ok(ids.clone()),
            Bucket::Listing {
                label,
                filter,
                target,
                single_page,
            } => Self::resolve_listing(source, label, filter, *target, *single_page).await,
        }
    }

    /// Pages through a listing until `target` ids, an empty or short page, or
    /// (for single-page buckets) the first page.
    async fn resolve_listing(
        source: &dyn CatalogSource,
        label: &str,
        filter: &PageFilter,
        target: usize,
        single_page: bool,
    ) -> SourceResult<Vec<i64>> {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        if target == 0 {
            return Ok(ids);
        }

        let page_size = (target.min(LISTING_PAGE_SIZE as usize)) as u32;
        let mut page = 1;

        while ids.len() < target && page <= MAX_LISTING_PAGES {
            let records = Self::fetch_page_with_retry(source, filter, page, page_size).await?;
            let received = records.len();

            for id in records.into_iter().filter_map(|r| r.id) {
                if id > 0 && seen.insert(id) {
                    ids.push(id);
                }
            }

            if single_page || received < page_size as usize {
                break;
            }
            page += 1;
        }

        ids.truncate(target);
        log_debug!("Listing '{}' yielded {} ids over {} pages", label, ids.len(), page);
        Ok(ids)
    }

    async fn fetch_page_with_retry(
        source: &dyn CatalogSource,
        filter: &PageFilter,
        page: u32,
        page_size: u32,
    ) -> SourceResult<Vec<RawAnime>> {
        let mut attempt = 0;
        loop {
            match source.fetch_page(filter, page, page_size).await {
                // The client holds its own cooldown, so the next call waits it out.
                Err(SourceError::RateLimited { .. }) if attempt + 1 < LISTING_PAGE_RETRIES => {
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Stride sample when the band is sparse enough, otherwise draw without
/// replacement.
pub fn sample_band(band: &RangeBand, rng: &mut StdRng) -> Vec<i64> {
    if band.end < band.start || band.target == 0 {
        return Vec::new();
    }
    let total = (band.end - band.start + 1) as usize;
    if band.target >= total {
        return (band.start..=band.end).collect();
    }

    let step = total / band.target;
    if step > 1 {
        (band.start..=band.end)
            .step_by(step)
            .take(band.target)
            .collect()
    } else {
        index::sample(rng, total, band.target)
            .into_iter()
            .map(|offset| band.start + offset as i64)
            .collect()
    }
}

/// Draws up to the attempt ceiling, mostly from the dense low id space.
fn random_draws(target: usize, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..target * RANDOM_ATTEMPT_FACTOR)
        .map(|_| {
            if rng.gen_bool(0.8) {
                rng.gen_range(1..=200_000)
            } else {
                rng.gen_range(200_001..=500_000)
            }
        })
        .collect()
}
