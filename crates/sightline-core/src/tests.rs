#[cfg(test)]
mod tests {
    use glam::DVec3;

    use crate::config::DetectionConfig;
    use crate::constants::*;
    use crate::error::{DetectionError, Severity};
    use crate::events::{DetectionEvent, TargetChange};
    use crate::report::{DetectionReport, TargetView};
    use crate::types::{CandidateId, Observer};

    #[test]
    fn test_default_config_is_clean() {
        let (config, errors) = DetectionConfig::default().sanitized();
        assert!(errors.is_empty(), "defaults should sanitize without errors");
        assert_eq!(config, DetectionConfig::default());
    }

    /// Every invalid field is replaced by its default and reported.
    #[test]
    fn test_sanitize_substitutes_defaults() {
        let bad = DetectionConfig {
            range: -5.0,
            height_offset: -1.0,
            half_angle: 7.0,
            category: String::new(),
            occlusion_mask: 0,
            ..DetectionConfig::default()
        };
        let (config, errors) = bad.sanitized();

        assert_eq!(config.range, DEFAULT_RANGE);
        assert_eq!(config.height_offset, DEFAULT_HEIGHT_OFFSET);
        assert_eq!(config.half_angle, DEFAULT_HALF_ANGLE);
        assert_eq!(config.category, DEFAULT_CATEGORY);
        assert_eq!(config.occlusion_mask, DEFAULT_OCCLUSION_MASK);
        assert_eq!(errors.len(), 5, "one error per substituted field");
        assert!(errors
            .iter()
            .all(|e| e.severity() == Severity::Warning));
    }

    #[test]
    fn test_sanitize_rejects_non_finite_range() {
        let bad = DetectionConfig {
            range: f64::NAN,
            ..DetectionConfig::default()
        };
        let (config, errors) = bad.sanitized();
        assert_eq!(config.range, DEFAULT_RANGE);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_half_angle_bounds() {
        let full = DetectionConfig {
            half_angle: std::f64::consts::PI,
            ..DetectionConfig::default()
        };
        let (config, errors) = full.sanitized();
        assert!(errors.is_empty(), "half angle of exactly pi is legal");
        assert_eq!(config.half_angle, std::f64::consts::PI);

        let zero = DetectionConfig {
            half_angle: 0.0,
            ..DetectionConfig::default()
        };
        let (_, errors) = zero.sanitized();
        assert_eq!(errors.len(), 1, "half angle of zero is not legal");
    }

    /// Partial JSON fills the remaining fields from defaults.
    #[test]
    fn test_config_partial_json() {
        let config: DetectionConfig =
            serde_json::from_str(r#"{"range": 25.0, "category": "drones"}"#).unwrap();
        assert_eq!(config.range, 25.0);
        assert_eq!(config.category, "drones");
        assert_eq!(config.half_angle, DEFAULT_HALF_ANGLE);
        assert!(config.continuous_update);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = DetectionConfig {
            range: 90.0,
            occlusion_mask: 0b101,
            ..DetectionConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_error_severity() {
        let config_err = DetectionError::InvalidRange {
            given: -1.0,
            fallback: DEFAULT_RANGE,
        };
        assert_eq!(config_err.severity(), Severity::Warning);

        let invariant = DetectionError::SpatialIndexDegraded { cell_size: 0.0 };
        assert_eq!(invariant.severity(), Severity::Critical);
    }

    #[test]
    fn test_error_messages_name_the_fallback() {
        let err = DetectionError::InvalidRange {
            given: -3.0,
            fallback: DEFAULT_RANGE,
        };
        let text = err.to_string();
        assert!(text.contains("-3"), "message should carry the bad value: {text}");
        assert!(text.contains("60"), "message should carry the fallback: {text}");
    }

    /// Facing is projected to the horizontal plane and normalized.
    #[test]
    fn test_facing_horizontal() {
        let observer = Observer::new(DVec3::ZERO, DVec3::new(0.0, 3.0, 4.0));
        let facing = observer.facing_horizontal().unwrap();
        assert!((facing - DVec3::Z).length() < 1e-12, "vertical part stripped");

        let diagonal = Observer::new(DVec3::ZERO, DVec3::new(10.0, 2.0, 10.0));
        let facing = diagonal.facing_horizontal().unwrap();
        assert!((facing.length() - 1.0).abs() < 1e-12, "must be unit length");
        assert_eq!(facing.y, 0.0);
    }

    #[test]
    fn test_facing_degenerate() {
        let zero = Observer::new(DVec3::ZERO, DVec3::ZERO);
        assert!(zero.facing_horizontal().is_none());

        let straight_up = Observer::new(DVec3::ZERO, DVec3::Y);
        assert!(straight_up.facing_horizontal().is_none());
    }

    /// Events round-trip through serde with an internal type tag.
    #[test]
    fn test_event_serde() {
        let events = vec![
            DetectionEvent::TargetChanged(TargetChange {
                new: Some(CandidateId(7)),
                previous: None,
            }),
            DetectionEvent::SpatialIndexDegraded { cell_size: 0.0 },
        ];
        for event in &events {
            let json = serde_json::to_string(event).unwrap();
            assert!(json.contains("\"type\""), "tagged union: {json}");
            let back: DetectionEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(*event, back);
        }
    }

    #[test]
    fn test_report_round_trip() {
        let report = DetectionReport {
            tick: Some(42),
            detected: vec![TargetView {
                id: CandidateId(3),
                label: Some("scout".into()),
                distance: 12.5,
                score: 0.81,
                angle_score: 0.9,
            }],
            locked_target: Some(CandidateId(3)),
            last_error: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: DetectionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }
}
