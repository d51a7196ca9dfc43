use serde::{Deserialize, Serialize};

use crate::{NodeRole, Result, ValidationError};

/// Fixed capacity of the wave set carried by [`WaveParameters`].
pub const MAX_NUM_WAVES: usize = 8;
/// Time period applied when the caller does not provide one.
pub const DEFAULT_TIME_PERIOD: u32 = 255;
/// Distance period applied when the caller does not provide one.
pub const DEFAULT_DISTANCE_PERIOD: u32 = 32;

/// Sinusoid describing one colour component of a wave.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveChannel {
    /// Amplitude.
    pub a: u8,
    /// Offset.
    pub b: u8,
    /// Temporal frequency.
    pub w_t: u8,
    /// Spatial frequency.
    pub w_x: u8,
    /// Phase.
    pub phi: u8,
}

/// One animation-parameter record within the fixed-capacity wave set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wave {
    pub h: WaveChannel,
    pub s: WaveChannel,
    pub v: WaveChannel,
    pub a: WaveChannel,
}

impl Wave {
    /// Neutral wave used to pad partially filled parameter sets.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }
}

/// Full animation configuration distributed by a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveParameters {
    pub waves: [Wave; MAX_NUM_WAVES],
    pub time_period: u32,
    pub distance_period: u32,
}

impl Default for WaveParameters {
    fn default() -> Self {
        Self::empty()
    }
}

impl WaveParameters {
    /// Parameter set made entirely of empty waves with the default periods.
    pub fn empty() -> Self {
        Self {
            waves: [Wave::empty(); MAX_NUM_WAVES],
            time_period: DEFAULT_TIME_PERIOD,
            distance_period: DEFAULT_DISTANCE_PERIOD,
        }
    }

    /// Number of leading waves that carry data, ignoring trailing padding.
    pub fn active_waves(&self) -> usize {
        self.waves
            .iter()
            .rposition(|wave| !wave.is_empty())
            .map_or(0, |index| index + 1)
    }
}

/// Partial parameter set as supplied by application code.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveParametersInput {
    #[serde(default)]
    pub waves: Vec<Wave>,
    #[serde(default)]
    pub time_period: Option<u32>,
    #[serde(default)]
    pub distance_period: Option<u32>,
}

impl WaveParametersInput {
    pub fn new(waves: Vec<Wave>) -> Self {
        Self {
            waves,
            ..Default::default()
        }
    }

    pub fn with_time_period(mut self, time_period: u32) -> Self {
        self.time_period = Some(time_period);
        self
    }

    pub fn with_distance_period(mut self, distance_period: u32) -> Self {
        self.distance_period = Some(distance_period);
        self
    }
}

impl From<WaveParameters> for WaveParametersInput {
    fn from(value: WaveParameters) -> Self {
        Self {
            waves: value.waves.to_vec(),
            time_period: Some(value.time_period),
            distance_period: Some(value.distance_period),
        }
    }
}

/// Validates `input` and expands it into a fixed-length [`WaveParameters`].
///
/// Waves are copied in order and right-padded with [`Wave::empty`]; missing
/// periods fall back to [`DEFAULT_TIME_PERIOD`] and
/// [`DEFAULT_DISTANCE_PERIOD`]. Role enforcement happens in the lifecycle
/// guard, the role is only recorded here.
pub fn normalize(input: &WaveParametersInput, role: NodeRole) -> Result<WaveParameters> {
    let count = input.waves.len();
    if count > MAX_NUM_WAVES {
        return Err(ValidationError::TooManyWaves {
            count,
            max: MAX_NUM_WAVES,
        }
        .into());
    }

    let mut waves = [Wave::empty(); MAX_NUM_WAVES];
    waves[..count].copy_from_slice(&input.waves);

    tracing::trace!(%role, count, "normalised wave parameters");

    Ok(WaveParameters {
        waves,
        time_period: input.time_period.unwrap_or(DEFAULT_TIME_PERIOD),
        distance_period: input.distance_period.unwrap_or(DEFAULT_DISTANCE_PERIOD),
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::WaveSyncError;

    fn wave(seed: u8) -> Wave {
        let channel = WaveChannel {
            a: seed,
            b: seed.wrapping_add(1),
            w_t: seed.wrapping_add(2),
            w_x: seed.wrapping_add(3),
            phi: seed.wrapping_add(4),
        };
        Wave {
            h: channel,
            s: channel,
            v: channel,
            a: channel,
        }
    }

    fn arb_wave() -> impl Strategy<Value = Wave> {
        any::<u8>().prop_map(wave)
    }

    #[test]
    fn empty_parameters_use_defaults() {
        let params = WaveParameters::empty();
        assert!(params.waves.iter().all(Wave::is_empty));
        assert_eq!(params.time_period, DEFAULT_TIME_PERIOD);
        assert_eq!(params.distance_period, DEFAULT_DISTANCE_PERIOD);
        assert_eq!(params.active_waves(), 0);
    }

    #[test]
    fn pads_short_input_and_applies_default_periods() {
        let input = WaveParametersInput::new(vec![wave(10), wave(20)]);
        let params = normalize(&input, NodeRole::Controller).unwrap();

        assert_eq!(params.waves[0], wave(10));
        assert_eq!(params.waves[1], wave(20));
        assert!(params.waves[2..].iter().all(|w| *w == Wave::empty()));
        assert_eq!(params.time_period, DEFAULT_TIME_PERIOD);
        assert_eq!(params.distance_period, DEFAULT_DISTANCE_PERIOD);
        assert_eq!(params.active_waves(), 2);
    }

    #[test]
    fn keeps_explicit_periods() {
        let input = WaveParametersInput::new(vec![wave(1)])
            .with_time_period(100)
            .with_distance_period(7);
        let params = normalize(&input, NodeRole::Controller).unwrap();
        assert_eq!(params.time_period, 100);
        assert_eq!(params.distance_period, 7);
    }

    #[test]
    fn rejects_too_many_waves() {
        let input = WaveParametersInput::new(vec![wave(1); MAX_NUM_WAVES + 1]);
        let err = normalize(&input, NodeRole::Controller).unwrap_err();
        assert!(matches!(
            err,
            WaveSyncError::Validation(ValidationError::TooManyWaves { count: 9, max: 8 })
        ));
    }

    #[test]
    fn full_parameters_survive_resubmission() {
        let mut original = WaveParameters::empty();
        original.waves[MAX_NUM_WAVES - 1] = wave(42);
        original.time_period = 12;

        let params = normalize(&original.clone().into(), NodeRole::Controller).unwrap();
        assert_eq!(params, original);
    }

    #[test]
    fn deserialises_partial_input() {
        let input: WaveParametersInput = serde_json::from_str(r#"{"time_period": 9}"#).unwrap();
        assert!(input.waves.is_empty());
        assert_eq!(input.time_period, Some(9));
        assert_eq!(input.distance_period, None);
    }

    proptest! {
        #[test]
        fn normalised_length_is_fixed_and_prefix_preserved(
            waves in prop::collection::vec(arb_wave(), 0..=MAX_NUM_WAVES),
        ) {
            let input = WaveParametersInput::new(waves.clone());
            let params = normalize(&input, NodeRole::Controller).unwrap();

            prop_assert_eq!(params.waves.len(), MAX_NUM_WAVES);
            prop_assert_eq!(&params.waves[..waves.len()], waves.as_slice());
            prop_assert!(params.waves[waves.len()..].iter().all(|w| *w == Wave::empty()));
            prop_assert_eq!(&input.waves, &waves);
        }

        #[test]
        fn oversized_input_is_always_rejected(
            waves in prop::collection::vec(arb_wave(), MAX_NUM_WAVES + 1..MAX_NUM_WAVES * 3),
        ) {
            let input = WaveParametersInput::new(waves);
            prop_assert!(normalize(&input, NodeRole::Controller).is_err());
        }
    }
}
