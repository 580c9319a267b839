/// A single prior box, in normalized `(center_x, center_y, width, height)` format.
///
/// All coordinates are relative to the input image size, so a box covering the whole
/// image is `(0.5, 0.5, 1.0, 1.0)`.
///
/// ```
/// use prior_box::PriorBox;
///
/// let prior = PriorBox::new(0.5, 0.5, 0.5, 0.25);
///
/// assert_eq!(prior.to_corners(), (0.25, 0.375, 0.75, 0.625));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl PriorBox {
    /// Create a new prior box from its center and size.
    #[must_use]
    pub fn new(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        PriorBox { cx, cy, w, h }
    }

    /// Clamp every coordinate of the box into `[0, 1]`.
    ///
    /// Each coordinate is clamped independently, which means the center and the size are
    /// not adjusted to keep the box's extent inside the image.
    #[must_use]
    pub fn clamped(&self) -> PriorBox {
        PriorBox {
            cx: self.cx.clamp(0.0, 1.0),
            cy: self.cy.clamp(0.0, 1.0),
            w: self.w.clamp(0.0, 1.0),
            h: self.h.clamp(0.0, 1.0),
        }
    }

    /// Convert the box to `(xmin, ymin, xmax, ymax)` corner format.
    #[must_use]
    pub fn to_corners(&self) -> (f32, f32, f32, f32) {
        let half_w = self.w / 2.0;
        let half_h = self.h / 2.0;

        (
            self.cx - half_w,
            self.cy - half_h,
            self.cx + half_w,
            self.cy + half_h,
        )
    }
}

impl From<PriorBox> for [f32; 4] {
    fn from(prior: PriorBox) -> Self {
        [prior.cx, prior.cy, prior.w, prior.h]
    }
}

impl From<PriorBox> for (f32, f32, f32, f32) {
    fn from(prior: PriorBox) -> Self {
        (prior.cx, prior.cy, prior.w, prior.h)
    }
}

impl From<(f32, f32, f32, f32)> for PriorBox {
    fn from((cx, cy, w, h): (f32, f32, f32, f32)) -> Self {
        PriorBox { cx, cy, w, h }
    }
}

#[cfg(test)]
mod tests {
    use super::PriorBox;

    #[test]
    fn clamped() {
        let prior = PriorBox::new(0.95, -0.1, 1.4, 0.3);
        let clamped = prior.clamped();

        assert_eq!(clamped, PriorBox::new(0.95, 0.0, 1.0, 0.3));
        assert_eq!(clamped.clamped(), clamped);
    }

    #[test]
    fn corners() {
        let prior = PriorBox::new(0.25, 0.75, 0.5, 0.5);
        assert_eq!(prior.to_corners(), (0.0, 0.5, 0.5, 1.0));
    }

    #[test]
    fn conversions() {
        let prior = PriorBox::from((0.1, 0.2, 0.3, 0.4));

        assert_eq!(<[f32; 4]>::from(prior), [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(<(f32, f32, f32, f32)>::from(prior), (0.1, 0.2, 0.3, 0.4));
    }
}
