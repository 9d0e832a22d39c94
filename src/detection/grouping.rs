use crate::config::{GroupParams, SizeEnvelope};
use crate::models::{Group, Rectangle};

impl GroupParams {
    /// `candidate` may join when it starts no further than `gap_factor` of its
    /// own heights below the block grown so far.
    fn within_reach(&self, block: &Rectangle, candidate: &Rectangle) -> bool {
        candidate.y <= block.bottom() + self.gap_factor * candidate.height
    }

    /// Horizontal overlap of the two boxes must exceed `min_overlap` of each box's area.
    fn overlaps_enough(&self, seed: &Rectangle, candidate: &Rectangle) -> bool {
        let (a, b) = (seed.flatten(), candidate.flatten());
        if !a.intersects(&b) {
            return false;
        }
        let shared = a.intersection(&b).area() as f64;
        shared > seed.area() as f64 * self.min_overlap
            && shared > candidate.area() as f64 * self.min_overlap
    }
}

/// Stack merged line boxes into block hypotheses, top to bottom.
///
/// Every box that is not too large seeds exactly one group; later boxes join
/// a seed when they are close enough below the growing block and overlap the
/// seed horizontally. A box can belong to several groups. Too-large boxes are
/// excluded for the rest of the pass, both as seeds and as members.
pub fn group_blocks(
    merged: &[Rectangle],
    params: &GroupParams,
    envelope: &SizeEnvelope,
    image_width: u32,
    image_height: u32,
) -> Vec<Group> {
    let mut sorted = merged.to_vec();
    sorted.sort_by_key(|r| r.y);

    let mut excluded = vec![false; sorted.len()];
    let mut groups = Vec::new();

    for i in 0..sorted.len() {
        let seed = sorted[i];
        if excluded[i] || envelope.is_too_large(&seed, image_width, image_height) {
            continue;
        }

        let mut current = seed;
        let mut group = Group::seeded(seed);

        for j in (i + 1)..sorted.len() {
            let candidate = sorted[j];
            if envelope.is_too_large(&candidate, image_width, image_height) {
                excluded[j] = true;
                continue;
            }
            if !params.within_reach(&current, &candidate) {
                continue;
            }
            if params.overlaps_enough(&seed, &candidate) {
                current = current.union(&candidate);
                group.members.push(candidate);
            }
        }

        groups.push(group);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 400;
    const H: u32 = 200;

    fn group(boxes: &[Rectangle]) -> Vec<Group> {
        group_blocks(boxes, &GroupParams::default(), &SizeEnvelope::default(), W, H)
    }

    fn sizes(groups: &[Group]) -> Vec<usize> {
        groups.iter().map(Group::len).collect()
    }

    #[test]
    fn three_stacked_lines_form_one_block() {
        let lines = [
            Rectangle::new(100, 50, 150, 15),
            Rectangle::new(100, 10, 150, 15),
            Rectangle::new(110, 30, 140, 15),
        ];
        let groups = group(&lines);
        assert_eq!(sizes(&groups), vec![3, 2, 1]);
        assert_eq!(groups[0].members[0], Rectangle::new(100, 10, 150, 15));
        assert_eq!(groups.iter().filter(|g| g.len() == 3).count(), 1);
    }

    #[test]
    fn reach_grows_with_the_block() {
        // Third line is out of the seed's reach but close to the second
        let lines = [
            Rectangle::new(100, 10, 150, 10),
            Rectangle::new(100, 35, 150, 10),
            Rectangle::new(100, 60, 150, 10),
        ];
        assert_eq!(group(&lines)[0].len(), 3);
    }

    #[test]
    fn distant_line_is_not_joined() {
        let lines = [
            Rectangle::new(100, 10, 150, 10),
            Rectangle::new(100, 41, 150, 10),
        ];
        assert_eq!(sizes(&group(&lines)), vec![1, 1]);
    }

    #[test]
    fn overlap_must_exceed_a_quarter_of_both_boxes() {
        // Shared width 30 of a 120 wide seed: exactly 25%, not enough
        let seed = Rectangle::new(100, 10, 120, 10);
        let short = Rectangle::new(190, 25, 60, 10);
        assert_eq!(group(&[seed, short])[0].len(), 1);

        let longer_overlap = Rectangle::new(180, 25, 60, 10);
        assert_eq!(group(&[seed, longer_overlap])[0].len(), 2);
    }

    #[test]
    fn small_box_under_a_wide_one_needs_its_own_share() {
        // Overlap is all of the small box but only a sliver of the wide one
        let wide = Rectangle::new(0, 10, 150, 10);
        let small = Rectangle::new(10, 25, 20, 10);
        assert_eq!(sizes(&group(&[wide, small])), vec![1, 1]);
    }

    #[test]
    fn too_large_box_never_seeds_or_joins() {
        let lines = [
            Rectangle::new(100, 10, 150, 15),
            Rectangle::new(60, 30, 200, 15), // half the image width
            Rectangle::new(100, 50, 150, 15),
        ];
        let groups = group(&lines);
        assert_eq!(sizes(&groups), vec![2, 1]);
        for g in &groups {
            assert!(!g.members.contains(&lines[1]));
        }
    }

    #[test]
    fn shared_member_appears_in_several_groups() {
        let lines = [
            Rectangle::new(100, 10, 100, 10),
            Rectangle::new(100, 25, 100, 10),
            Rectangle::new(100, 40, 100, 10),
        ];
        let groups = group(&lines);
        assert_eq!(sizes(&groups), vec![3, 2, 1]);
        assert!(groups[0].members.contains(&lines[2]));
        assert!(groups[1].members.contains(&lines[2]));
    }
}
