//! Synthetic quantitative indicators conditioned on assigned themes.
//!
//! A toy generative model: base rate + per-theme additive effect + Gaussian
//! noise, clipped to each indicator's valid range. Themes absent from a
//! response (or from the codebook) contribute no effect.

use crate::models::{CodedResponse, Frame, IndicatorRecord, QualmixError, Result};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;
use tracing::debug;

pub const STRESS_MAX: f64 = 40.0;
pub const CLOSURE_RISK_MAX: f64 = 3.0;
pub const CLOSURE_RISK_HIGH: u8 = 2;

/// Noise distributions, drawn in this order for every respondent.
struct Noise {
    stress_base: Normal,
    burnout_effect: Normal,
    scheduling_effect: Normal,
    food_jitter: Normal,
    employment_jitter: Normal,
    closure_base: Normal,
    staffing_effect: Normal,
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal> {
    Normal::new(mean, std_dev)
        .map_err(|e| QualmixError::Internal(format!("invalid normal({mean}, {std_dev}): {e}")))
}

impl Noise {
    fn new() -> Result<Self> {
        Ok(Self {
            stress_base: normal(18.0, 6.0)?,
            burnout_effect: normal(8.0, 2.0)?,
            scheduling_effect: normal(2.0, 1.0)?,
            food_jitter: normal(0.0, 0.02)?,
            employment_jitter: normal(0.0, 0.01)?,
            closure_base: normal(1.0, 0.4)?,
            staffing_effect: normal(1.2, 0.2)?,
        })
    }
}

fn flag(row: &CodedResponse, theme: &str) -> f64 {
    if row.has_theme(theme) {
        1.0
    } else {
        0.0
    }
}

/// Bernoulli draw against a probability clipped to [0, 1].
fn bernoulli(rng: &mut StdRng, p: f64) -> bool {
    rng.gen::<f64>() < p.clamp(0.0, 1.0)
}

/// Simulate indicators for every respondent, deterministically for a seed.
///
/// Every noise term is drawn for every respondent regardless of flags, so a
/// theme flag never shifts the draws of later respondents.
pub fn simulate_indicators(rows: &[CodedResponse], seed: u64) -> Result<Vec<IndicatorRecord>> {
    let noise = Noise::new()?;
    let mut rng = StdRng::seed_from_u64(seed);

    let records: Vec<IndicatorRecord> = rows
        .iter()
        .map(|row| {
            let burnout = flag(row, "STRESS_BURNOUT");
            let scheduling = flag(row, "SCHEDULING_CONSTRAINTS");
            let food = flag(row, "FOOD_INSECURITY");
            let affordability = flag(row, "AFFORDABILITY");
            let employment = flag(row, "EMPLOYMENT_DISRUPTION");
            let access = flag(row, "CHILDCARE_ACCESS");
            let staffing = flag(row, "PROVIDER_STAFF_SHORTAGE");
            let frame = row.response.frame;

            let base = noise.stress_base.sample(&mut rng).clamp(0.0, STRESS_MAX);
            let stress = base
                + burnout * noise.burnout_effect.sample(&mut rng)
                + scheduling * noise.scheduling_effect.sample(&mut rng);

            let food_prob =
                0.15 + noise.food_jitter.sample(&mut rng) + food * 0.35 + affordability * 0.2;
            let food_insecure = bernoulli(&mut rng, food_prob);

            let employment_prob =
                0.1 + noise.employment_jitter.sample(&mut rng) + employment * 0.5 + access * 0.15;
            let disrupted = bernoulli(&mut rng, employment_prob) && frame == Frame::Household;

            let closure = noise.closure_base.sample(&mut rng)
                + staffing * noise.staffing_effect.sample(&mut rng)
                + scheduling * 0.2;
            let closure_risk = match frame {
                Frame::Provider => closure.round().clamp(0.0, CLOSURE_RISK_MAX) as u8,
                Frame::Household => 0,
            };

            IndicatorRecord {
                respondent_id: row.response.respondent_id.clone(),
                frame,
                wave: row.response.wave,
                stress_score: stress.clamp(0.0, STRESS_MAX),
                food_insecurity: u8::from(food_insecure),
                employment_disruption: u8::from(disrupted),
                provider_closure_risk: closure_risk,
                closure_risk_high: u8::from(closure_risk >= CLOSURE_RISK_HIGH),
            }
        })
        .collect();

    debug!(respondents = records.len(), seed, "Simulated quantitative indicators");
    Ok(records)
}
