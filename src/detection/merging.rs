use crate::config::MergeParams;
use crate::models::Rectangle;

impl MergeParams {
    /// Pixels added on each horizontal side of a candidate before the overlap test.
    pub fn half_reach(&self, image_width: u32) -> i32 {
        let reach = (image_width as f64 * self.reach_fraction).round_ties_even() as i32;
        reach / 2
    }

    fn is_noise(&self, r: &Rectangle) -> bool {
        r.width < self.min_side || r.height < self.min_side
    }

    fn union_fits(&self, r: &Rectangle, image_width: u32, image_height: u32) -> bool {
        (r.width as f64) < image_width as f64 * self.max_width
            && (r.height as f64) < image_height as f64 * self.max_height
    }
}

/// Fuse horizontally adjacent fragments of the same row into word/line boxes.
///
/// One greedy left-to-right sweep: each surviving seed grows by absorbing
/// later boxes that touch its current extent (after widening the candidate
/// by the merge reach), as long as the union stays under the size cap.
/// Boxes below `min_side` in either dimension are dropped. Absorbed boxes
/// never seed, but a later seed may still absorb them again.
pub fn merge_rows(
    boxes: &[Rectangle],
    params: &MergeParams,
    image_width: u32,
    image_height: u32,
) -> Vec<Rectangle> {
    let mut sorted = boxes.to_vec();
    sorted.sort_by_key(|r| r.x);

    let half_reach = params.half_reach(image_width);
    let mut consumed = vec![false; sorted.len()];
    let mut merged = Vec::new();

    for i in 0..sorted.len() {
        if consumed[i] {
            continue;
        }
        if params.is_noise(&sorted[i]) {
            consumed[i] = true;
            continue;
        }

        let mut current = sorted[i];

        for j in (i + 1)..sorted.len() {
            let candidate = sorted[j];
            if params.is_noise(&candidate) {
                consumed[j] = true;
                continue;
            }

            let reach = candidate.inflate(half_reach, 0);
            if !current.intersects(&reach) {
                continue;
            }

            let union = current.union(&candidate);
            if params.union_fits(&union, image_width, image_height) {
                current = union;
                consumed[j] = true;
            }
        }

        merged.push(current.clamp_to(image_width, image_height));
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 1000;
    const H: u32 = 1000;

    fn merge(boxes: &[Rectangle]) -> Vec<Rectangle> {
        merge_rows(boxes, &MergeParams::default(), W, H)
    }

    #[test]
    fn half_reach_uses_integer_halving() {
        let params = MergeParams::default();
        assert_eq!(params.half_reach(1000), 5);
        assert_eq!(params.half_reach(300), 1);
        assert_eq!(params.half_reach(100), 0);
    }

    #[test]
    fn glyphs_within_reach_become_one_word() {
        // Gaps of 4 pixels, reach of 5 on each side
        let boxes = [
            Rectangle::new(114, 100, 10, 12),
            Rectangle::new(100, 100, 10, 12),
            Rectangle::new(128, 102, 10, 10),
        ];
        assert_eq!(merge(&boxes), vec![Rectangle::new(100, 100, 38, 12)]);
    }

    #[test]
    fn gap_beyond_reach_keeps_boxes_apart() {
        let boxes = [
            Rectangle::new(100, 100, 10, 12),
            Rectangle::new(116, 100, 10, 12),
        ];
        assert_eq!(merge(&boxes), boxes.to_vec());
    }

    #[test]
    fn separate_rows_do_not_merge() {
        let boxes = [
            Rectangle::new(100, 100, 50, 12),
            Rectangle::new(100, 112, 50, 12),
        ];
        assert_eq!(merge(&boxes).len(), 2);
    }

    #[test]
    fn union_over_width_cap_is_refused() {
        // Together they would be 300 wide, the cap is strictly below 300
        let boxes = [
            Rectangle::new(0, 100, 150, 12),
            Rectangle::new(152, 100, 148, 12),
        ];
        let merged = merge(&boxes);
        assert_eq!(merged.len(), 2);
        for r in merged {
            assert!((r.width as f64) < W as f64 * 0.30);
        }
    }

    #[test]
    fn union_over_height_cap_is_refused() {
        let boxes = [
            Rectangle::new(100, 100, 40, 30),
            Rectangle::new(138, 125, 40, 30),
        ];
        assert_eq!(merge(&boxes).len(), 2);
    }

    #[test]
    fn adjacent_noise_boxes_are_both_dropped() {
        let boxes = [Rectangle::new(100, 100, 4, 4), Rectangle::new(105, 100, 4, 4)];
        assert!(merge(&boxes).is_empty());
    }

    #[test]
    fn noise_is_dropped_without_breaking_neighbours() {
        let boxes = [
            Rectangle::new(100, 100, 30, 12),
            Rectangle::new(131, 100, 3, 12),
            Rectangle::new(134, 100, 30, 12),
        ];
        assert_eq!(merge(&boxes), vec![Rectangle::new(100, 100, 64, 12)]);
    }

    #[test]
    fn single_pass_does_not_revisit_earlier_candidates() {
        // After absorbing B the seed covers C, but C was scanned before B
        // because of the x ordering and is left alone.
        let a = Rectangle::new(0, 0, 20, 10);
        let c = Rectangle::new(1, 30, 12, 10);
        let b = Rectangle::new(22, 5, 20, 40);
        let merged = merge(&[a, b, c]);
        assert_eq!(merged, vec![Rectangle::new(0, 0, 42, 45), c]);
    }

    #[test]
    fn output_is_clamped_to_the_image() {
        let boxes = [Rectangle::new(-3, 995, 20, 10)];
        let merged = merge_rows(&boxes, &MergeParams::default(), W, H);
        assert_eq!(merged, vec![Rectangle::new(0, 995, 17, 5)]);
        assert!(merged.iter().all(|r| r.fits_within(W, H)));
    }
}
