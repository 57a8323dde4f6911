// Skill-based job recommendation
//
// Scoring is a pure function over a corpus snapshot. `RecommendationService`
// wraps it with store access and guarantees a best-effort answer.

use crate::config::FallbackPolicy;
use crate::models::{normalize_skills, JobPosting, JobRecord, ScoredJob};
use crate::store::{JobStore, ProfileStore};
use crate::telemetry;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const MATCH_BASE_SCORE: usize = 60;
const MATCH_SCORE_PER_SKILL: usize = 20;
const MAX_SCORE: usize = 100;

/// Score band for jobs with no skill hit
pub const UNMATCHED_SCORE_RANGE: RangeInclusive<u8> = 50..=75;
/// Score band for the sample served to users without skills
pub const POPULAR_SCORE_RANGE: RangeInclusive<u8> = 70..=90;

pub const REASON_UNMATCHED: &str = "Based on your profile";
pub const REASON_POPULAR: &str = "Popular jobs for you";
pub const REASON_FEATURED: &str = "Featured job";

/// Corpus size used when the primary recommendation path failed
const DEGRADED_CORPUS_LIMIT: i64 = 50;

/// Score for a job matching `matches` skills
pub fn match_score(matches: usize) -> u8 {
    (matches * MATCH_SCORE_PER_SKILL + MATCH_BASE_SCORE).min(MAX_SCORE) as u8
}

/// Skills (already normalized) found as substrings of title + description
pub fn match_skills(skills: &[String], job: &JobPosting) -> Vec<String> {
    let surface = format!("{} {}", job.title, job.description).to_lowercase();
    skills
        .iter()
        .filter(|skill| surface.contains(skill.as_str()))
        .cloned()
        .collect()
}

/// Newest first: `date_posted` desc, then `updated_at` desc, then `external_id` asc
fn recency_order(a: &JobRecord, b: &JobRecord) -> Ordering {
    b.posting
        .date_posted
        .cmp(&a.posting.date_posted)
        .then_with(|| b.updated_at.cmp(&a.updated_at))
        .then_with(|| a.external_id().cmp(b.external_id()))
}

/// Linear interpolation from the top of `range` (rank 0) to its bottom (last rank)
fn rank_score(rank: usize, total: usize, range: &RangeInclusive<u8>) -> u8 {
    let (low, high) = (*range.start() as usize, *range.end() as usize);
    if total <= 1 {
        return high as u8;
    }
    (high - rank * (high - low) / (total - 1)) as u8
}

fn scored(job: JobRecord, matched_skills: Vec<String>, score: u8, reason: String) -> ScoredJob {
    ScoredJob {
        job,
        matched_skills,
        match_score: score,
        match_reason: reason,
    }
}

/// Ranks a job corpus against a skill set
#[derive(Debug, Clone, Copy)]
pub struct RecommendationScorer {
    policy: FallbackPolicy,
}

impl Default for RecommendationScorer {
    fn default() -> Self {
        Self::new(FallbackPolicy::Recency)
    }
}

impl RecommendationScorer {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self { policy }
    }

    /// Matched jobs first (score desc), then unmatched (score desc), truncated to `limit`.
    /// Without any usable skill the result is a popular-jobs sample instead.
    pub fn recommend(&self, skills: &[String], corpus: &[JobRecord], limit: usize) -> Vec<ScoredJob> {
        let skills = normalize_skills(skills);
        if skills.is_empty() {
            return self.sample(corpus, limit, REASON_POPULAR);
        }

        let mut matched = Vec::new();
        let mut unmatched = Vec::new();
        for job in corpus {
            let hits = match_skills(&skills, &job.posting);
            if hits.is_empty() {
                unmatched.push(job.clone());
            } else {
                matched.push((job.clone(), hits));
            }
        }

        let mut matched: Vec<ScoredJob> = matched
            .into_iter()
            .map(|(job, hits)| {
                let score = match_score(hits.len());
                let reason = format!("Matches {} of your skills", hits.len());
                scored(job, hits, score, reason)
            })
            .collect();
        matched.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then_with(|| recency_order(&a.job, &b.job))
        });

        let mut unmatched = self.score_fallback(unmatched, &UNMATCHED_SCORE_RANGE, REASON_UNMATCHED);
        unmatched.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then_with(|| recency_order(&a.job, &b.job))
        });

        debug!(
            matched = matched.len(),
            unmatched = unmatched.len(),
            "Scored job corpus"
        );

        matched.extend(unmatched);
        matched.truncate(limit);
        matched
    }

    /// `min(limit, corpus.len())` jobs scored in the popular band, none matched
    pub fn sample(&self, corpus: &[JobRecord], limit: usize, reason: &str) -> Vec<ScoredJob> {
        let picked: Vec<JobRecord> = match self.policy {
            FallbackPolicy::Recency => {
                let mut jobs = corpus.to_vec();
                jobs.sort_by(recency_order);
                jobs.truncate(limit);
                jobs
            }
            FallbackPolicy::Random => corpus
                .choose_multiple(&mut rand::thread_rng(), limit)
                .cloned()
                .collect(),
        };

        let mut sample = self.score_fallback(picked, &POPULAR_SCORE_RANGE, reason);
        sample.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        sample
    }

    fn score_fallback(
        &self,
        mut jobs: Vec<JobRecord>,
        range: &RangeInclusive<u8>,
        reason: &str,
    ) -> Vec<ScoredJob> {
        match self.policy {
            FallbackPolicy::Recency => {
                jobs.sort_by(recency_order);
                let total = jobs.len();
                jobs.into_iter()
                    .enumerate()
                    .map(|(rank, job)| {
                        scored(job, Vec::new(), rank_score(rank, total, range), reason.to_string())
                    })
                    .collect()
            }
            FallbackPolicy::Random => {
                let mut rng = rand::thread_rng();
                jobs.into_iter()
                    .map(|job| {
                        let score = rng.gen_range(range.clone());
                        scored(job, Vec::new(), score, reason.to_string())
                    })
                    .collect()
            }
        }
    }
}

/// On-demand recommendations that never fail the caller
#[derive(Clone)]
pub struct RecommendationService {
    jobs: Arc<dyn JobStore>,
    profiles: Arc<dyn ProfileStore>,
    scorer: RecommendationScorer,
    corpus_limit: i64,
}

impl RecommendationService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        profiles: Arc<dyn ProfileStore>,
        scorer: RecommendationScorer,
        corpus_limit: i64,
    ) -> Self {
        Self {
            jobs,
            profiles,
            scorer,
            corpus_limit,
        }
    }

    /// Recommend for a user by id, reading skills from the profile store.
    /// A missing or unreadable profile degrades to featured jobs.
    #[instrument(skip(self))]
    pub async fn recommend_for_user(&self, user_id: &str, limit: usize) -> Vec<ScoredJob> {
        match self.profiles.find_profile(user_id).await {
            Ok(Some(profile)) => self.recommend_for_skills(&profile.skills, limit).await,
            Ok(None) => {
                warn!(user_id = %user_id, "Profile not found, serving featured jobs");
                self.degraded(limit).await
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile lookup failed, serving featured jobs");
                self.degraded(limit).await
            }
        }
    }

    #[instrument(skip(self, skills), fields(skill_count = skills.len()))]
    pub async fn recommend_for_skills(&self, skills: &[String], limit: usize) -> Vec<ScoredJob> {
        let corpus = match self.jobs.corpus(self.corpus_limit).await {
            Ok(corpus) => corpus,
            Err(e) => {
                warn!(error = %e, "Failed to load job corpus, serving featured jobs");
                return self.degraded(limit).await;
            }
        };

        let mode = if normalize_skills(skills).is_empty() {
            "no_skills"
        } else {
            "matched"
        };
        telemetry::record_recommendation(mode);

        self.scorer.recommend(skills, &corpus, limit)
    }

    async fn degraded(&self, limit: usize) -> Vec<ScoredJob> {
        match self.jobs.corpus(DEGRADED_CORPUS_LIMIT).await {
            Ok(corpus) => {
                telemetry::record_recommendation("degraded");
                self.scorer.sample(&corpus, limit, REASON_FEATURED)
            }
            Err(e) => {
                warn!(error = %e, "Fallback corpus load failed, returning no recommendations");
                telemetry::record_recommendation("empty");
                Vec::new()
            }
        }
    }
}
