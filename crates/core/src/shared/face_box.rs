use std::cmp::Ordering;

/// Axis-aligned face box in frame pixel coordinates, as reported by a
/// detector.
///
/// Detectors may report boxes that hang off the frame edges (or lie entirely
/// outside it); [`FaceBox::clamp_to`] produces the visible part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: Option<f32>,
}

impl FaceBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    /// Intersects the box with a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when the intersection has zero area.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<FaceBox> {
        let x1 = (self.x as i64).max(0);
        let y1 = (self.y as i64).max(0);
        let x2 = (self.x as i64 + self.width as i64).min(frame_width as i64);
        let y2 = (self.y as i64 + self.height as i64).min(frame_height as i64);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(FaceBox {
            x: x1 as i32,
            y: y1 as i32,
            width: (x2 - x1) as i32,
            height: (y2 - y1) as i32,
            confidence: self.confidence,
        })
    }

    /// Clamps every box to the frame, drops the empty ones and returns the
    /// rest in detector order.
    pub fn usable(faces: &[FaceBox], frame_width: u32, frame_height: u32) -> Vec<FaceBox> {
        faces
            .iter()
            .filter_map(|f| f.clamp_to(frame_width, frame_height))
            .collect()
    }

    /// Picks the single face to score from a frame's detections.
    ///
    /// Ranking: highest confidence first (boxes without a confidence rank
    /// below any box with one), then larger clamped area, then detector order.
    pub fn best(faces: &[FaceBox], frame_width: u32, frame_height: u32) -> Option<FaceBox> {
        let usable = Self::usable(faces, frame_width, frame_height);
        let mut best: Option<FaceBox> = None;
        for face in usable {
            let better = match &best {
                None => true,
                Some(current) => face.rank(current) == Ordering::Greater,
            };
            if better {
                best = Some(face);
            }
        }
        best
    }

    fn rank(&self, other: &FaceBox) -> Ordering {
        let by_confidence = match (self.confidence, other.confidence) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        by_confidence.then_with(|| self.area().cmp(&other.area()))
    }
}
