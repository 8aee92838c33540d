use bytemuck::{Pod, Zeroable};
use tracing::{trace, warn};

use crate::params::ParameterSet;
use crate::seed::RandomSeed;

/// Named uniform slots understood by the wrapped fragment shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniform {
    Time,
    Resolution,
    Seed,
    TimeScale,
    PatternAmp,
    PatternFreq,
    BloomStrength,
    Saturation,
    GrainAmount,
    ColorTint,
    MinCircleSize,
    CircleStrength,
    DistortX,
    DistortY,
}

impl Uniform {
    pub const COUNT: usize = 14;

    pub const ALL: [Uniform; Uniform::COUNT] = [
        Uniform::Time,
        Uniform::Resolution,
        Uniform::Seed,
        Uniform::TimeScale,
        Uniform::PatternAmp,
        Uniform::PatternFreq,
        Uniform::BloomStrength,
        Uniform::Saturation,
        Uniform::GrainAmount,
        Uniform::ColorTint,
        Uniform::MinCircleSize,
        Uniform::CircleStrength,
        Uniform::DistortX,
        Uniform::DistortY,
    ];

    /// Identifier the shader uses for this slot.
    pub fn name(self) -> &'static str {
        match self {
            Uniform::Time => "time",
            Uniform::Resolution => "resolution",
            Uniform::Seed => "seed",
            Uniform::TimeScale => "timeScale",
            Uniform::PatternAmp => "patternAmp",
            Uniform::PatternFreq => "patternFreq",
            Uniform::BloomStrength => "bloomStrength",
            Uniform::Saturation => "saturation",
            Uniform::GrainAmount => "grainAmount",
            Uniform::ColorTint => "colorTint",
            Uniform::MinCircleSize => "minCircleSize",
            Uniform::CircleStrength => "circleStrength",
            Uniform::DistortX => "distortX",
            Uniform::DistortY => "distortY",
        }
    }
}

/// Destination for uniform writes.
pub trait UniformSink {
    fn write_float(&mut self, slot: Uniform, value: f32);
    fn write_vec2(&mut self, slot: Uniform, value: [f32; 2]);
    fn write_vec3(&mut self, slot: Uniform, value: [f32; 3]);
}

/// CPU mirror of the std140 block declared in the shader prelude.
///
/// Field order and padding must match `VisualParams` in `compile.rs`:
/// each `vec3` starts on a 16-byte boundary and the following float packs
/// into its fourth component. The whole block is 80 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct UniformBlock {
    pub resolution: [f32; 2],
    pub time: f32,
    pub time_scale: f32,
    pub seed: [f32; 3],
    pub pattern_amp: f32,
    pub color_tint: [f32; 3],
    pub pattern_freq: f32,
    pub bloom_strength: f32,
    pub saturation: f32,
    pub grain_amount: f32,
    pub min_circle_size: f32,
    pub circle_strength: f32,
    pub distort_x: f32,
    pub distort_y: f32,
    pub _padding: f32,
}

impl UniformBlock {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            ..Self::zeroed()
        }
    }
}

impl UniformSink for UniformBlock {
    fn write_float(&mut self, slot: Uniform, value: f32) {
        let field = match slot {
            Uniform::Time => &mut self.time,
            Uniform::TimeScale => &mut self.time_scale,
            Uniform::PatternAmp => &mut self.pattern_amp,
            Uniform::PatternFreq => &mut self.pattern_freq,
            Uniform::BloomStrength => &mut self.bloom_strength,
            Uniform::Saturation => &mut self.saturation,
            Uniform::GrainAmount => &mut self.grain_amount,
            Uniform::MinCircleSize => &mut self.min_circle_size,
            Uniform::CircleStrength => &mut self.circle_strength,
            Uniform::DistortX => &mut self.distort_x,
            Uniform::DistortY => &mut self.distort_y,
            other => {
                trace!(uniform = other.name(), "ignoring scalar write to vector slot");
                return;
            }
        };
        *field = value;
    }

    fn write_vec2(&mut self, slot: Uniform, value: [f32; 2]) {
        match slot {
            Uniform::Resolution => self.resolution = value,
            other => trace!(uniform = other.name(), "ignoring vec2 write"),
        }
    }

    fn write_vec3(&mut self, slot: Uniform, value: [f32; 3]) {
        match slot {
            Uniform::Seed => self.seed = value,
            Uniform::ColorTint => self.color_tint = value,
            other => trace!(uniform = other.name(), "ignoring vec3 write"),
        }
    }
}

/// Which slots were found when the shader was set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTable {
    bound: [bool; Uniform::COUNT],
}

impl SlotTable {
    pub fn all() -> Self {
        Self {
            bound: [true; Uniform::COUNT],
        }
    }

    /// Looks up every slot once, warning about each one the shader lacks.
    pub fn resolve(mut lookup: impl FnMut(&str) -> bool) -> Self {
        let mut bound = [false; Uniform::COUNT];
        for slot in Uniform::ALL {
            bound[slot as usize] = lookup(slot.name());
            if !bound[slot as usize] {
                warn!(
                    uniform = slot.name(),
                    "uniform not found in shader; writes to it will be ignored"
                );
            }
        }
        Self { bound }
    }

    pub fn is_bound(&self, slot: Uniform) -> bool {
        self.bound[slot as usize]
    }

    pub fn missing(&self) -> impl Iterator<Item = Uniform> + '_ {
        Uniform::ALL
            .into_iter()
            .filter(move |slot| !self.is_bound(*slot))
    }
}

/// One-way push of parameters and frame state into uniform slots.
#[derive(Debug, Clone, Copy)]
pub struct UniformBridge {
    slots: SlotTable,
}

impl UniformBridge {
    pub fn new(slots: SlotTable) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub fn push_all<S: UniformSink + ?Sized>(&self, params: &ParameterSet, sink: &mut S) {
        self.float(sink, Uniform::TimeScale, params.time_scale);
        self.float(sink, Uniform::PatternAmp, params.pattern_amp);
        self.float(sink, Uniform::PatternFreq, params.pattern_freq);
        self.float(sink, Uniform::BloomStrength, params.bloom_strength);
        self.float(sink, Uniform::Saturation, params.saturation);
        self.float(sink, Uniform::GrainAmount, params.grain_amount);
        if self.slots.is_bound(Uniform::ColorTint) {
            sink.write_vec3(Uniform::ColorTint, params.color_tint);
        }
        self.float(sink, Uniform::MinCircleSize, params.min_circle_size);
        self.float(sink, Uniform::CircleStrength, params.circle_strength);
        self.float(sink, Uniform::DistortX, params.distort_x);
        self.float(sink, Uniform::DistortY, params.distort_y);
    }

    pub fn push_frame_state<S: UniformSink + ?Sized>(
        &self,
        time_seconds: f32,
        width: u32,
        height: u32,
        sink: &mut S,
    ) {
        self.float(sink, Uniform::Time, time_seconds);
        if self.slots.is_bound(Uniform::Resolution) {
            sink.write_vec2(Uniform::Resolution, [width as f32, height as f32]);
        }
    }

    pub fn push_seed<S: UniformSink + ?Sized>(&self, seed: RandomSeed, sink: &mut S) {
        if self.slots.is_bound(Uniform::Seed) {
            sink.write_vec3(Uniform::Seed, seed.values());
        }
    }

    fn float<S: UniformSink + ?Sized>(&self, sink: &mut S, slot: Uniform, value: f32) {
        if self.slots.is_bound(slot) {
            sink.write_float(slot, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<(Uniform, Vec<f32>)>,
    }

    impl UniformSink for RecordingSink {
        fn write_float(&mut self, slot: Uniform, value: f32) {
            self.writes.push((slot, vec![value]));
        }

        fn write_vec2(&mut self, slot: Uniform, value: [f32; 2]) {
            self.writes.push((slot, value.to_vec()));
        }

        fn write_vec3(&mut self, slot: Uniform, value: [f32; 3]) {
            self.writes.push((slot, value.to_vec()));
        }
    }

    #[test]
    fn block_matches_std140_size() {
        assert_eq!(std::mem::size_of::<UniformBlock>(), 80);
        assert_eq!(std::mem::size_of::<UniformBlock>() % 16, 0);
    }

    #[test]
    fn push_all_writes_every_parameter_slot() {
        let bridge = UniformBridge::new(SlotTable::all());
        let mut params = ParameterSet::default();
        params.saturation = 1.25;
        params.color_tint = [0.5, 0.75, 1.0];
        let mut block = UniformBlock::new(640, 480);

        bridge.push_all(&params, &mut block);

        assert_eq!(block.time_scale, params.time_scale);
        assert_eq!(block.pattern_amp, params.pattern_amp);
        assert_eq!(block.pattern_freq, params.pattern_freq);
        assert_eq!(block.bloom_strength, params.bloom_strength);
        assert_eq!(block.saturation, 1.25);
        assert_eq!(block.grain_amount, params.grain_amount);
        assert_eq!(block.color_tint, [0.5, 0.75, 1.0]);
        assert_eq!(block.min_circle_size, params.min_circle_size);
        assert_eq!(block.circle_strength, params.circle_strength);
        assert_eq!(block.distort_x, params.distort_x);
        assert_eq!(block.distort_y, params.distort_y);
        // frame state is untouched by parameter pushes
        assert_eq!(block.time, 0.0);
        assert_eq!(block.resolution, [640.0, 480.0]);
    }

    #[test]
    fn push_all_does_not_clamp() {
        let bridge = UniformBridge::new(SlotTable::all());
        let mut params = ParameterSet::default();
        params.grain_amount = 4.0;
        let mut block = UniformBlock::zeroed();
        bridge.push_all(&params, &mut block);
        assert_eq!(block.grain_amount, 4.0);
    }

    #[test]
    fn missing_slots_become_no_ops() {
        let slots = SlotTable::resolve(|name| name != "grainAmount" && name != "seed");
        assert_eq!(
            slots.missing().collect::<Vec<_>>(),
            vec![Uniform::Seed, Uniform::GrainAmount]
        );

        let bridge = UniformBridge::new(slots);
        let mut sink = RecordingSink::default();
        bridge.push_all(&ParameterSet::default(), &mut sink);
        bridge.push_seed(RandomSeed::new([0.1, 0.2, 0.3]), &mut sink);

        assert!(sink
            .writes
            .iter()
            .all(|(slot, _)| *slot != Uniform::GrainAmount && *slot != Uniform::Seed));
        assert_eq!(sink.writes.len(), 10);
    }

    #[test]
    fn frame_state_writes_time_and_resolution() {
        let bridge = UniformBridge::new(SlotTable::all());
        let mut block = UniformBlock::new(1, 1);
        bridge.push_frame_state(2.5, 1920, 1080, &mut block);
        assert_eq!(block.time, 2.5);
        assert_eq!(block.resolution, [1920.0, 1080.0]);
    }
}
