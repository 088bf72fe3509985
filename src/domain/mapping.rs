//! Hole-numbering mapper.
//!
//! A course can be split into reusable sub-courses (front 9 / back 9 /
//! A-B-C loops) that recombine into many playable configurations. Players see
//! 1-based sequential display numbers for whichever configuration they chose,
//! while score and par data stay keyed by the course's fixed absolute hole
//! numbers. Everything here is pure and recomputed per call.

use crate::domain::model::{CourseConfiguration, Hole, HoleMapping, SubCourse};
use crate::utils::error::{MigrationError, Result};
use std::collections::HashSet;

/// Outcome of [`validate_ranges`]. Reports one conflicting hole on failure;
/// gaps in coverage are allowed and not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeValidation {
    pub valid: bool,
    pub conflicting_hole: Option<u32>,
}

fn ordered<'a>(sub_courses: &'a [SubCourse]) -> Vec<&'a SubCourse> {
    let mut ordered: Vec<&SubCourse> = sub_courses.iter().collect();
    // Stable sort: ties and missing sequences keep input order.
    ordered.sort_by_key(|s| s.sequence.unwrap_or(0));
    ordered
}

/// Builds the full absolute/display mapping for the given sub-courses,
/// visiting them in ascending `sequence` order and numbering display holes
/// 1, 2, 3, … continuously across segment boundaries.
///
/// Legacy-compatible: overlapping ranges are not rejected here and produce
/// duplicate absolute entries. Use [`build_hole_mapping_checked`] where a
/// corrupt mapping must not escape.
pub fn build_hole_mapping(sub_courses: &[SubCourse]) -> Vec<HoleMapping> {
    let mut mapping = Vec::new();
    let mut display = 1u32;

    for sub in ordered(sub_courses) {
        for absolute in sub.start_hole..=sub.end_hole {
            mapping.push(HoleMapping {
                absolute_hole: absolute,
                display_hole: display,
                sub_course_id: sub.id.clone(),
            });
            display += 1;
        }
    }

    mapping
}

/// Like [`build_hole_mapping`], but fails fast on the first absolute hole
/// claimed by more than one sub-course.
pub fn build_hole_mapping_checked(sub_courses: &[SubCourse]) -> Result<Vec<HoleMapping>> {
    let mut claimed = HashSet::new();
    let mut mapping = Vec::new();
    let mut display = 1u32;

    for sub in ordered(sub_courses) {
        for absolute in sub.start_hole..=sub.end_hole {
            if !claimed.insert(absolute) {
                return Err(MigrationError::OverlappingSegments { hole: absolute });
            }
            mapping.push(HoleMapping {
                absolute_hole: absolute,
                display_hole: display,
                sub_course_id: sub.id.clone(),
            });
            display += 1;
        }
    }

    Ok(mapping)
}

/// Display number for an absolute hole, or `None` when no sub-course claims
/// it.
pub fn absolute_to_display(absolute_hole: u32, sub_courses: &[SubCourse]) -> Option<u32> {
    build_hole_mapping(sub_courses)
        .iter()
        .find(|m| m.absolute_hole == absolute_hole)
        .map(|m| m.display_hole)
}

/// Absolute number for a display hole, or `None` when the display number is
/// not part of the mapping.
pub fn display_to_absolute(display_hole: u32, sub_courses: &[SubCourse]) -> Option<u32> {
    build_hole_mapping(sub_courses)
        .iter()
        .find(|m| m.display_hole == display_hole)
        .map(|m| m.absolute_hole)
}

/// Legacy identity-fallback policy: an unmatched lookup returns the input
/// unchanged. Callers that can distinguish "not found" should prefer
/// [`absolute_to_display`].
pub fn absolute_to_display_or_self(absolute_hole: u32, sub_courses: &[SubCourse]) -> u32 {
    absolute_to_display(absolute_hole, sub_courses).unwrap_or(absolute_hole)
}

/// Legacy identity-fallback counterpart of [`display_to_absolute`].
pub fn display_to_absolute_or_self(display_hole: u32, sub_courses: &[SubCourse]) -> u32 {
    display_to_absolute(display_hole, sub_courses).unwrap_or(display_hole)
}

/// Minimum and maximum display numbers assigned to `sub_course`'s holes
/// within the full mapping over `all_sub_courses`. Returns `(1, 1)` when the
/// segment contributes no holes.
pub fn display_range(sub_course: &SubCourse, all_sub_courses: &[SubCourse]) -> (u32, u32) {
    let displays: Vec<u32> = build_hole_mapping(all_sub_courses)
        .iter()
        .filter(|m| m.sub_course_id == sub_course.id)
        .map(|m| m.display_hole)
        .collect();

    match (displays.iter().min(), displays.iter().max()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => (1, 1),
    }
}

/// Checks that no absolute hole is claimed by more than one sub-course.
pub fn validate_ranges(sub_courses: &[SubCourse]) -> RangeValidation {
    let mut claimed = HashSet::new();

    for sub in sub_courses {
        for absolute in sub.start_hole..=sub.end_hole {
            if !claimed.insert(absolute) {
                return RangeValidation {
                    valid: false,
                    conflicting_hole: Some(absolute),
                };
            }
        }
    }

    RangeValidation {
        valid: true,
        conflicting_hole: None,
    }
}

/// Keeps only the holes whose absolute number is referenced by at least one
/// segment of at least one configuration. An empty configuration list means
/// no filtering at all.
pub fn filter_holes(holes: &[Hole], configurations: &[CourseConfiguration]) -> Vec<Hole> {
    if configurations.is_empty() {
        return holes.to_vec();
    }

    let referenced: HashSet<u32> = configurations
        .iter()
        .flat_map(|c| c.sub_courses.iter())
        .flat_map(|s| s.start_hole..=s.end_hole)
        .collect();

    holes
        .iter()
        .filter(|h| referenced.contains(&h.hole_number))
        .cloned()
        .collect()
}
