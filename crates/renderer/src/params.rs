//! User-tunable visual parameters.
//!
//! Every parameter is described once in [`PARAMS`]: its config key, panel
//! label and group, static domain, default value, and the accessor pair the
//! control panel uses to read and write the field. Nothing in this module
//! clamps on write; the control surface is responsible for keeping values in
//! their domain.

use std::fmt;

/// Closed interval a parameter may take, plus the panel step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Domain {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Panel folder a parameter is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamGroup {
    Animation,
    Pattern,
    VisualEffects,
    ColorTint,
}

impl ParamGroup {
    pub const ALL: [ParamGroup; 4] = [
        ParamGroup::Animation,
        ParamGroup::Pattern,
        ParamGroup::VisualEffects,
        ParamGroup::ColorTint,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ParamGroup::Animation => "Animation",
            ParamGroup::Pattern => "Pattern",
            ParamGroup::VisualEffects => "Visual Effects",
            ParamGroup::ColorTint => "Color Tint",
        }
    }
}

/// Identifies one scalar parameter. The color tint is exposed as three
/// scalar channels so each can be bound to its own control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamId {
    TimeScale,
    PatternAmp,
    PatternFreq,
    BloomStrength,
    Saturation,
    GrainAmount,
    MinCircleSize,
    CircleStrength,
    DistortX,
    DistortY,
    ColorTintR,
    ColorTintG,
    ColorTintB,
}

impl ParamId {
    pub fn spec(self) -> &'static ParamSpec {
        &PARAMS[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn from_key(key: &str) -> Option<Self> {
        PARAMS.iter().find(|spec| spec.key == key).map(|spec| spec.id)
    }
}

/// Static description of a parameter and how to reach its field.
pub struct ParamSpec {
    pub id: ParamId,
    pub key: &'static str,
    pub label: &'static str,
    pub group: ParamGroup,
    pub domain: Domain,
    pub default: f32,
    pub get: fn(&ParameterSet) -> f32,
    pub set: fn(&mut ParameterSet, f32),
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("key", &self.key)
            .field("domain", &self.domain)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Ordered to match the `ParamId` discriminants.
pub static PARAMS: [ParamSpec; 13] = [
    ParamSpec {
        id: ParamId::TimeScale,
        key: "timeScale",
        label: "Speed",
        group: ParamGroup::Animation,
        domain: Domain::new(0.1, 3.0, 0.05),
        default: 0.4,
        get: |p| p.time_scale,
        set: |p, v| p.time_scale = v,
    },
    ParamSpec {
        id: ParamId::PatternAmp,
        key: "patternAmp",
        label: "Pattern Amp",
        group: ParamGroup::Pattern,
        domain: Domain::new(1.0, 50.0, 0.1),
        default: 12.0,
        get: |p| p.pattern_amp,
        set: |p, v| p.pattern_amp = v,
    },
    ParamSpec {
        id: ParamId::PatternFreq,
        key: "patternFreq",
        label: "Pattern Freq",
        group: ParamGroup::Pattern,
        domain: Domain::new(0.2, 10.0, 0.1),
        default: 0.5,
        get: |p| p.pattern_freq,
        set: |p, v| p.pattern_freq = v,
    },
    ParamSpec {
        id: ParamId::BloomStrength,
        key: "bloomStrength",
        label: "Bloom",
        group: ParamGroup::VisualEffects,
        domain: Domain::new(0.0, 5.0, 0.05),
        default: 1.0,
        get: |p| p.bloom_strength,
        set: |p, v| p.bloom_strength = v,
    },
    ParamSpec {
        id: ParamId::Saturation,
        key: "saturation",
        label: "Saturation",
        group: ParamGroup::VisualEffects,
        domain: Domain::new(0.0, 2.0, 0.05),
        default: 0.85,
        get: |p| p.saturation,
        set: |p, v| p.saturation = v,
    },
    ParamSpec {
        id: ParamId::GrainAmount,
        key: "grainAmount",
        label: "Grain",
        group: ParamGroup::VisualEffects,
        domain: Domain::new(0.0, 0.5, 0.01),
        default: 0.2,
        get: |p| p.grain_amount,
        set: |p, v| p.grain_amount = v,
    },
    ParamSpec {
        id: ParamId::MinCircleSize,
        key: "minCircleSize",
        label: "Circle Size",
        group: ParamGroup::VisualEffects,
        domain: Domain::new(0.0, 10.0, 0.1),
        default: 3.0,
        get: |p| p.min_circle_size,
        set: |p, v| p.min_circle_size = v,
    },
    ParamSpec {
        id: ParamId::CircleStrength,
        key: "circleStrength",
        label: "Circle Strength",
        group: ParamGroup::VisualEffects,
        domain: Domain::new(0.0, 3.0, 0.05),
        default: 1.0,
        get: |p| p.circle_strength,
        set: |p, v| p.circle_strength = v,
    },
    ParamSpec {
        id: ParamId::DistortX,
        key: "distortX",
        label: "Distort-X",
        group: ParamGroup::VisualEffects,
        domain: Domain::new(0.0, 50.0, 0.5),
        default: 5.0,
        get: |p| p.distort_x,
        set: |p, v| p.distort_x = v,
    },
    ParamSpec {
        id: ParamId::DistortY,
        key: "distortY",
        label: "Distort-Y",
        group: ParamGroup::VisualEffects,
        domain: Domain::new(0.0, 50.0, 0.5),
        default: 20.0,
        get: |p| p.distort_y,
        set: |p, v| p.distort_y = v,
    },
    ParamSpec {
        id: ParamId::ColorTintR,
        key: "colorTintR",
        label: "Red",
        group: ParamGroup::ColorTint,
        domain: Domain::new(0.0, 1.5, 0.05),
        default: 1.0,
        get: |p| p.color_tint[0],
        set: |p, v| p.color_tint[0] = v,
    },
    ParamSpec {
        id: ParamId::ColorTintG,
        key: "colorTintG",
        label: "Green",
        group: ParamGroup::ColorTint,
        domain: Domain::new(0.0, 1.5, 0.05),
        default: 1.0,
        get: |p| p.color_tint[1],
        set: |p, v| p.color_tint[1] = v,
    },
    ParamSpec {
        id: ParamId::ColorTintB,
        key: "colorTintB",
        label: "Blue",
        group: ParamGroup::ColorTint,
        domain: Domain::new(0.0, 1.5, 0.05),
        default: 1.0,
        get: |p| p.color_tint[2],
        set: |p, v| p.color_tint[2] = v,
    },
];

/// Key accepted for setting all three tint channels at once.
pub const COLOR_TINT_KEY: &str = "colorTint";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter '{0}'")]
    Unknown(String),
    #[error("parameter '{key}' value {value} is outside [{min}, {max}]")]
    OutOfDomain {
        key: String,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("parameter '{0}' expects a single number")]
    ExpectedScalar(String),
    #[error("parameter '{0}' expects a number or a [r, g, b] triple")]
    ExpectedColor(String),
}

/// Current value of every tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    pub time_scale: f32,
    pub pattern_amp: f32,
    pub pattern_freq: f32,
    pub bloom_strength: f32,
    pub saturation: f32,
    pub grain_amount: f32,
    pub color_tint: [f32; 3],
    pub min_circle_size: f32,
    pub circle_strength: f32,
    pub distort_x: f32,
    pub distort_y: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        let mut params = Self {
            time_scale: 0.0,
            pattern_amp: 0.0,
            pattern_freq: 0.0,
            bloom_strength: 0.0,
            saturation: 0.0,
            grain_amount: 0.0,
            color_tint: [0.0; 3],
            min_circle_size: 0.0,
            circle_strength: 0.0,
            distort_x: 0.0,
            distort_y: 0.0,
        };
        for spec in &PARAMS {
            (spec.set)(&mut params, spec.default);
        }
        params
    }
}

impl ParameterSet {
    pub fn get(&self, id: ParamId) -> f32 {
        (id.spec().get)(self)
    }

    /// Writes the raw value; callers own domain checks.
    pub fn set(&mut self, id: ParamId, value: f32) {
        (id.spec().set)(self, value);
    }

    /// Applies a named override from configuration, rejecting unknown names
    /// and values outside the parameter's domain.
    pub fn set_by_key(&mut self, key: &str, value: f32) -> Result<(), ParamError> {
        if key == COLOR_TINT_KEY {
            return Err(ParamError::ExpectedColor(key.to_string()));
        }
        let id = ParamId::from_key(key).ok_or_else(|| ParamError::Unknown(key.to_string()))?;
        let domain = id.spec().domain;
        if !domain.contains(value) {
            return Err(ParamError::OutOfDomain {
                key: key.to_string(),
                value,
                min: domain.min,
                max: domain.max,
            });
        }
        self.set(id, value);
        Ok(())
    }

    pub fn set_color_tint(&mut self, rgb: [f32; 3]) -> Result<(), ParamError> {
        let channels = [ParamId::ColorTintR, ParamId::ColorTintG, ParamId::ColorTintB];
        for (id, value) in channels.into_iter().zip(rgb) {
            let domain = id.spec().domain;
            if !domain.contains(value) {
                return Err(ParamError::OutOfDomain {
                    key: COLOR_TINT_KEY.to_string(),
                    value,
                    min: domain.min,
                    max: domain.max,
                });
            }
        }
        self.color_tint = rgb;
        Ok(())
    }
}
