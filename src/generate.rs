//! Deterministic synthetic survey generator.
//!
//! One seeded generator drives every draw, in respondent order, so identical
//! (responses, waves, seed) triples always produce identical tables.

use crate::models::{
    ConfigError, Frame, GenerationConfig, IncomeBracket, ProviderSetting, QualmixError, Response,
    Result, MAX_WAVES,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

const FRAME_WEIGHTS: [f64; 2] = [0.65, 0.35];

const MONTHS: [&str; MAX_WAVES as usize] = ["January 2024", "February 2024", "March 2024"];

const STATES: [&str; 17] = [
    "AL", "AZ", "CA", "CO", "CT", "FL", "GA", "IL", "MA", "MI", "NC", "NJ", "NY", "OH", "PA",
    "TX", "WA",
];

const INCOME_WEIGHTS: [f64; 4] = [0.25, 0.35, 0.25, 0.15];

const SETTING_WEIGHTS: [f64; 4] = [0.45, 0.25, 0.15, 0.15];

/// Theme-flavoured sentences: (theme, household phrasings, provider phrasings).
const THEME_SNIPPETS: [(&str, [&str; 3], [&str; 3]); 7] = [
    (
        "STRESS_BURNOUT",
        [
            "The stress of juggling work and caregiving is overwhelming and my mental health keeps slipping.",
            "I feel burned out every week trying to cover shifts and still be a present parent.",
            "My partner and I are exhausted, constantly anxious about childcare collapsing at the last minute.",
        ],
        [
            "Staff and I are emotionally drained; burnout is spreading across the team.",
            "Managing constant schedule changes with too few people is crushing my mental health.",
            "I am overwhelmed balancing paperwork, families, and the classroom without relief.",
        ],
    ),
    (
        "FOOD_INSECURITY",
        [
            "We stretch groceries and sometimes skip meals so tuition can stay current.",
            "Food insecurity is creeping back—we rely on the pantry between paychecks.",
            "I water down meals for the kids when food runs low after rent and child care.",
        ],
        [
            "Families tell me they face food insecurity, and we set up snack pantries in the classroom.",
            "I see children coming in hungry, and our program scrambles to cover snacks.",
            "Food budgets for the program are maxed out while families ask for extra meals.",
        ],
    ),
    (
        "CHILDCARE_ACCESS",
        [
            "We have been on a childcare waitlist for months after our center closed.",
            "No slots open when my shifts change, so reliable childcare access feels impossible.",
            "Finding after-school care is a battle every semester, and options keep shrinking.",
        ],
        [
            "Families want more slots than we can offer; access breaks down when staff call out.",
            "Our center closed classrooms temporarily, so neighborhood access evaporated.",
            "I field calls daily from parents desperate for openings we just do not have.",
        ],
    ),
    (
        "AFFORDABILITY",
        [
            "Tuition and fees are too expensive; every increase means cutting groceries.",
            "We cannot afford reliable care when costs rise faster than wages.",
            "Childcare remains unaffordable, forcing us to take turns missing work.",
        ],
        [
            "Operating costs skyrocket but families cannot absorb more tuition.",
            "Affordability pressures mean delays in payments and tighter margins for the program.",
            "Keeping care affordable while paying staff fairly is nearly impossible.",
        ],
    ),
    (
        "EMPLOYMENT_DISRUPTION",
        [
            "I miss work every time care falls through, and my employer is losing patience.",
            "My hours were cut after too many schedule changes driven by childcare gaps.",
            "Employment keeps getting disrupted when I have to leave early for pickups.",
        ],
        [
            "I am juggling second jobs because enrollment swings disrupt my own employment stability.",
            "Assistants quit when schedules change, so my employment feels precarious too.",
            "Staff juggle multiple jobs, and every disruption ripples through coverage.",
        ],
    ),
    (
        "PROVIDER_STAFF_SHORTAGE",
        [
            "Our center says classrooms merge because of staff shortages, leaving fewer hours.",
            "Short staffing means inconsistent caregivers and unpredictable schedules for us.",
            "We were told staffing shortages limit the program to part-week care.",
        ],
        [
            "We are short staffed and cannot hire assistants even after months of recruiting.",
            "No substitutes are available, so I cover multiple classrooms daily.",
            "Open positions stay vacant, forcing us to cap enrollment and reduce hours.",
        ],
    ),
    (
        "SCHEDULING_CONSTRAINTS",
        [
            "My split shift schedule never aligns with the center's hours, so coverage falls apart.",
            "Weekend work is non-negotiable, but there is no evening care anywhere nearby.",
            "Coordinating schedules with my partner and the provider is a weekly puzzle we rarely solve.",
        ],
        [
            "Families need nights and weekend coverage, but we cannot stretch schedules without burning out staff.",
            "Coordinating staggered shifts with limited staff feels impossible.",
            "Scheduling constraints force us to close early when multiple people call out.",
        ],
    ),
];

/// Parameters of one synthetic survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticConfig {
    pub num_responses: usize,
    pub num_waves: u8,
    pub seed: u64,
}

impl SyntheticConfig {
    pub fn new(num_responses: usize, num_waves: u8, seed: u64) -> Self {
        Self {
            num_responses,
            num_waves,
            seed,
        }
    }

    /// Reject invalid combinations before any draw.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.num_responses == 0 {
            return Err(ConfigError::InvalidResponseCount(self.num_responses));
        }
        if !(1..=MAX_WAVES).contains(&self.num_waves) {
            return Err(ConfigError::InvalidWaveCount(self.num_waves));
        }
        Ok(())
    }
}

impl From<&GenerationConfig> for SyntheticConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self::new(config.responses, config.waves, config.seed)
    }
}

fn weighted(weights: &[f64]) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(weights)
        .map_err(|e| QualmixError::Internal(format!("invalid sampling weights: {e}")))
}

/// Join 1-3 distinct theme snippets phrased for the respondent's frame.
fn compose_response(frame: Frame, rng: &mut StdRng) -> String {
    let theme_count = rng.gen_range(1..=3);
    let chosen: Vec<_> = THEME_SNIPPETS
        .choose_multiple(rng, theme_count)
        .cloned()
        .collect();

    chosen
        .into_iter()
        .map(|(_, household, provider)| {
            let phrases = match frame {
                Frame::Household => household,
                Frame::Provider => provider,
            };
            phrases[rng.gen_range(0..phrases.len())]
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate synthetic open-ended responses across household and provider frames.
pub fn generate_responses(config: &SyntheticConfig) -> Result<Vec<Response>> {
    config.validate()?;

    let frames = weighted(&FRAME_WEIGHTS)?;
    let incomes = weighted(&INCOME_WEIGHTS)?;
    let settings = weighted(&SETTING_WEIGHTS)?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut responses = Vec::with_capacity(config.num_responses);
    for idx in 0..config.num_responses {
        let frame = Frame::ALL[frames.sample(&mut rng)];
        let wave = rng.gen_range(1..=config.num_waves);
        let state = STATES[rng.gen_range(0..STATES.len())];

        let income_bracket = match frame {
            Frame::Household => Some(IncomeBracket::ALL[incomes.sample(&mut rng)]),
            Frame::Provider => None,
        };
        let provider_setting = match frame {
            Frame::Provider => Some(ProviderSetting::ALL[settings.sample(&mut rng)]),
            Frame::Household => None,
        };

        let open_response_text = compose_response(frame, &mut rng);

        responses.push(Response {
            respondent_id: format!("R{:05}", idx + 1),
            frame,
            wave,
            survey_month: MONTHS[usize::from(wave) - 1].to_string(),
            state: state.to_string(),
            income_bracket,
            provider_setting,
            open_response_text,
        });
    }

    debug!(seed = config.seed, "Synthetic draws complete");
    info!(
        responses = responses.len(),
        waves = config.num_waves,
        "Generated synthetic responses"
    );
    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebook::Codebook;

    #[test]
    fn test_generates_exact_count_within_bounds() {
        let responses = generate_responses(&SyntheticConfig::new(120, 2, 42)).unwrap();
        assert_eq!(responses.len(), 120);
        for r in &responses {
            assert!((1..=2).contains(&r.wave));
            assert_eq!(r.survey_month, MONTHS[usize::from(r.wave) - 1]);
            match r.frame {
                Frame::Household => {
                    assert!(r.income_bracket.is_some());
                    assert!(r.provider_setting.is_none());
                }
                Frame::Provider => {
                    assert!(r.income_bracket.is_none());
                    assert!(r.provider_setting.is_some());
                }
            }
            assert!(!r.open_response_text.is_empty());
        }
        assert_eq!(responses[0].respondent_id, "R00001");
        assert_eq!(responses[119].respondent_id, "R00120");
    }

    #[test]
    fn test_same_seed_same_responses() {
        let config = SyntheticConfig::new(50, 3, 7);
        assert_eq!(
            generate_responses(&config).unwrap(),
            generate_responses(&config).unwrap()
        );
    }

    #[test]
    fn test_different_seed_differs() {
        let a = generate_responses(&SyntheticConfig::new(50, 3, 1)).unwrap();
        let b = generate_responses(&SyntheticConfig::new(50, 3, 2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(matches!(
            generate_responses(&SyntheticConfig::new(0, 3, 42)),
            Err(QualmixError::Config(ConfigError::InvalidResponseCount(0)))
        ));
        assert!(matches!(
            generate_responses(&SyntheticConfig::new(10, 4, 42)),
            Err(QualmixError::Config(ConfigError::InvalidWaveCount(4)))
        ));
    }

    #[test]
    fn test_both_frames_present() {
        let responses = generate_responses(&SyntheticConfig::new(200, 3, 42)).unwrap();
        assert!(responses.iter().any(|r| r.frame == Frame::Household));
        assert!(responses.iter().any(|r| r.frame == Frame::Provider));
    }

    #[test]
    fn test_snippet_themes_match_codebook() {
        let codebook = Codebook::standard();
        for (theme, _, _) in THEME_SNIPPETS {
            assert!(codebook.contains(theme), "{theme} missing from codebook");
        }
    }
}
