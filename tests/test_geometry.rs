//! Integration tests for the region-detection stages.
//!
//! Tests cover:
//! - Stacked text lines becoming block hypotheses
//! - Oversized rows removed by the size filter
//! - Every reported box staying inside the image

mod common;

use addrscan::detection::build_geometry_pipeline;
use common::*;

fn hypotheses(rows: &[(u32, u32, u32, u32)]) -> anyhow::Result<addrscan::PipelineData> {
    build_geometry_pipeline(&DetectionConfig::default()).run(page_image(rows))
}

#[test]
fn test_stacked_lines_form_one_three_line_block() -> anyhow::Result<()> {
    let data = hypotheses(&ADDRESS_ROWS)?;

    // Erosion with a 10px element widens each 140px row to 149px
    assert_eq!(
        data.merged,
        vec![
            Rectangle::new(96, 10, 149, 15),
            Rectangle::new(96, 30, 149, 15),
            Rectangle::new(96, 50, 149, 15),
        ]
    );

    let sizes: Vec<usize> = data.groups.iter().map(Group::len).collect();
    assert_eq!(sizes, vec![3, 2, 1]);
    assert_eq!(
        data.groups[0].bounds(),
        Some(Rectangle::new(96, 10, 149, 55))
    );

    Ok(())
}

#[test]
fn test_oversized_rows_never_reach_grouping() -> anyhow::Result<()> {
    // 200px rows grow to 209px, above 40% of the 400px page
    let rows = [(100, 10, 200, 15), (100, 30, 200, 15), (100, 50, 200, 15)];
    let data = hypotheses(&rows)?;

    assert!(data.boxes.is_empty());
    assert!(data.merged.is_empty());
    assert!(data.groups.is_empty());

    Ok(())
}

#[test]
fn test_one_oversized_row_leaves_the_rest() -> anyhow::Result<()> {
    let rows = [(100, 10, 140, 15), (50, 30, 250, 15), (100, 50, 140, 15)];
    let data = hypotheses(&rows)?;

    assert_eq!(data.merged.len(), 2);
    let sizes: Vec<usize> = data.groups.iter().map(Group::len).collect();
    assert_eq!(sizes, vec![2, 1]);

    Ok(())
}

#[test]
fn test_blank_page_yields_nothing() -> anyhow::Result<()> {
    let data = hypotheses(&[])?;
    assert!(data.boxes.is_empty());
    assert!(data.groups.is_empty());
    Ok(())
}

#[test]
fn test_boxes_stay_inside_the_page() -> anyhow::Result<()> {
    // Rows touching the page edges
    let rows = [(0, 0, 120, 12), (300, 20, 100, 12), (0, 185, 150, 15)];
    let data = hypotheses(&rows)?;

    for r in data.boxes.iter().chain(&data.merged) {
        assert!(r.fits_within(PAGE_WIDTH, PAGE_HEIGHT), "{} escapes the page", r);
    }
    for group in &data.groups {
        for member in &group.members {
            assert!(member.fits_within(PAGE_WIDTH, PAGE_HEIGHT), "{} escapes the page", member);
        }
    }
    assert!(!data.merged.is_empty());

    Ok(())
}
