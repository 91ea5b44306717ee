/// Bounding box in pixel units of the frame the detection was computed on.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn intersection_area(&self, other: &BBox) -> f32 {
        let l = self.x.max(other.x);
        let r = (self.x + self.width).min(other.x + other.width);
        let t = self.y.max(other.y);
        let b = (self.y + self.height).min(other.y + other.height);
        (r - l).max(0.0) * (b - t).max(0.0)
    }

    pub fn iou(&self, other: &BBox) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// One model output: box, class label and confidence in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    pub class: String,
    pub score: f32,
}

impl Detection {
    pub fn new(class: impl Into<String>, score: f32, bbox: BBox) -> Self {
        Self {
            bbox,
            class: class.into(),
            score,
        }
    }

    /// Score as an integer percentage, rounded half up.
    pub fn percent(&self) -> u32 {
        to_percent(self.score)
    }
}

pub(crate) fn to_percent(score: f32) -> u32 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u32
}
