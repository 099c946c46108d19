//! Keyframe curves evaluated by the animation sampler
//!
//! Keys are `(frame, value)` pairs with per-segment interpolation. The mode
//! stored on a key applies to the segment that starts at that key.

/// Anything the sampler can evaluate at an integer frame
pub trait ChannelCurve {
    fn evaluate(&self, frame: f32) -> f32;
}

/// Segment interpolation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Hold the key value until the next key
    Constant,
    #[default]
    Linear,
    /// Cubic Bézier through the key handles
    Bezier,
}

/// One curve key. Handles are absolute `(frame, value)` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub frame: f32,
    pub value: f32,
    pub interpolation: Interpolation,
    pub handle_left: [f32; 2],
    pub handle_right: [f32; 2],
}

impl Keyframe {
    /// Key with flat handles, which makes a Bézier segment ease in and out
    pub fn new(frame: f32, value: f32, interpolation: Interpolation) -> Self {
        Self {
            frame,
            value,
            interpolation,
            handle_left: [frame, value],
            handle_right: [frame, value],
        }
    }

    pub fn with_handles(mut self, left: [f32; 2], right: [f32; 2]) -> Self {
        self.handle_left = left;
        self.handle_right = right;
        self
    }
}

/// Sorted keyframes for one scalar channel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyframeCurve {
    keys: Vec<Keyframe>,
}

impl KeyframeCurve {
    /// Build a curve, sorting keys by frame
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        Self { keys }
    }

    /// Linear keys from `(frame, value)` pairs
    pub fn linear(points: &[(f32, f32)]) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(frame, value)| Keyframe::new(frame, value, Interpolation::Linear))
                .collect(),
        )
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Frame span covered by the keys
    pub fn frame_range(&self) -> Option<(f32, f32)> {
        Some((self.keys.first()?.frame, self.keys.last()?.frame))
    }
}

impl ChannelCurve for KeyframeCurve {
    fn evaluate(&self, frame: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if frame <= first.frame {
            return first.value;
        }
        if frame >= last.frame {
            return last.value;
        }

        // First key strictly after `frame`; the clamps above keep it in 1..len
        let next = self.keys.partition_point(|k| k.frame <= frame);
        let k0 = &self.keys[next - 1];
        let k1 = &self.keys[next];

        let span = k1.frame - k0.frame;
        if span <= 0.0 {
            return k1.value;
        }

        match k0.interpolation {
            Interpolation::Constant => k0.value,
            Interpolation::Linear => {
                let t = (frame - k0.frame) / span;
                k0.value + (k1.value - k0.value) * t
            }
            Interpolation::Bezier => bezier_segment(k0, k1, frame),
        }
    }
}

/// Evaluate the Bézier segment between two keys at `frame`.
///
/// The handle x-coordinates are clamped into the segment so x(s) stays
/// monotonic, then x(s) = frame is solved with Newton iterations.
fn bezier_segment(k0: &Keyframe, k1: &Keyframe, frame: f32) -> f32 {
    let span = k1.frame - k0.frame;
    let x1 = ((k0.handle_right[0] - k0.frame) / span).clamp(0.0, 1.0);
    let x2 = ((k1.handle_left[0] - k0.frame) / span).clamp(0.0, 1.0);
    let target = (frame - k0.frame) / span;

    let mut s = target;
    for _ in 0..15 {
        let x = cubic(0.0, x1, x2, 1.0, s);
        let dx = cubic_derivative(0.0, x1, x2, 1.0, s);
        if dx.abs() < 1e-6 {
            break;
        }
        let next = (s - (x - target) / dx).clamp(0.0, 1.0);
        if (next - s).abs() < 1e-6 {
            s = next;
            break;
        }
        s = next;
    }

    cubic(k0.value, k0.handle_right[1], k1.handle_left[1], k1.value, s)
}

fn cubic(p0: f32, p1: f32, p2: f32, p3: f32, s: f32) -> f32 {
    let t = 1.0 - s;
    t * t * t * p0 + 3.0 * t * t * s * p1 + 3.0 * t * s * s * p2 + s * s * s * p3
}

fn cubic_derivative(p0: f32, p1: f32, p2: f32, p3: f32, s: f32) -> f32 {
    let t = 1.0 - s;
    3.0 * t * t * (p1 - p0) + 6.0 * t * s * (p2 - p1) + 3.0 * s * s * (p3 - p2)
}
