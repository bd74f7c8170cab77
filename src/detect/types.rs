use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Tuning passed to the detector on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
    /// Square input size the frame is scaled to before inference
    pub input_size: u32,
    /// Boxes scoring below this are discarded
    pub score_threshold: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            input_size: 224,
            score_threshold: 0.5,
        }
    }
}

/// Faces found in one sampled frame. Produced and discarded every tick.
#[derive(Debug, Clone, Default)]
pub struct FrameSample {
    /// Sequence number of the frame that was sampled
    pub sequence: u64,
    pub faces: Vec<BoundingBox>,
}

impl FrameSample {
    pub fn has_face(&self) -> bool {
        !self.faces.is_empty()
    }

    /// The face with the largest box area. Ties keep the earlier box.
    pub fn largest_face(&self) -> Option<&BoundingBox> {
        self.faces.iter().fold(None, |best: Option<&BoundingBox>, b| match best {
            Some(a) if a.area() >= b.area() => Some(a),
            _ => Some(b),
        })
    }
}
