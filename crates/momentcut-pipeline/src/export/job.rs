//! Cut job export.

use momentcut_models::{CutJob, CutSheet};

use super::JobTarget;

/// Job description for cutting every entry of `sheet` out of the target
/// media into the target directory.
pub fn to_job(sheet: &CutSheet, target: &JobTarget) -> CutJob {
    CutJob::from_segments(
        &target.media_path,
        &target.output_dir,
        &sheet.segments(),
        &target.extension,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutsheet::CutSheetBuilder;
    use momentcut_models::{CandidateMoment, SegmentValidator};
    use std::path::PathBuf;

    fn target() -> JobTarget {
        JobTarget {
            media_path: PathBuf::from("/media/episode.mp4"),
            output_dir: PathBuf::from("/out"),
            extension: "mp4".to_string(),
        }
    }

    #[test]
    fn test_job_reparses_to_same_segments() {
        let mut hooked = CandidateMoment::new(0, "Big reveal", 10.0, 30.0).with_rationale("payoff");
        hooked.virality_score = Some(0.8);
        hooked.quote = Some("here it is".into());
        let candidates = vec![hooked, CandidateMoment::new(1, "Setup", 0.0, 12.0)];
        let segments = SegmentValidator::default()
            .validate(&candidates, 40.0)
            .unwrap()
            .segments;
        let sheet = CutSheetBuilder::new().build(&segments, 40.0).unwrap();

        let json = to_job(&sheet, &target()).to_json().unwrap();
        let parsed = CutJob::from_json(&json).unwrap();
        assert_eq!(
            parsed.entries[0].output_path,
            PathBuf::from("/out/000_setup.mp4")
        );
        assert_eq!(
            parsed.input_path().unwrap(),
            Some(PathBuf::from("/media/episode.mp4").as_path())
        );
        assert_eq!(parsed.into_segments().unwrap(), segments);
    }

    #[test]
    fn test_empty_job_is_empty_list() {
        let sheet = CutSheet::new(40.0, Vec::new()).unwrap();
        assert_eq!(to_job(&sheet, &target()).to_json().unwrap(), "[]");
    }
}
