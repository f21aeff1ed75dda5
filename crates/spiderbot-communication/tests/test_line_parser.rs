use proptest::prelude::*;
use spiderbot_communication::{classify, dispatch_line, InboundLine};
use spiderbot_core::{MessageLog, TelemetryStore};

proptest! {
    #[test]
    fn labelled_readings_set_distance(value in 0.0f64..10_000.0) {
        let telemetry = TelemetryStore::new();
        let log = MessageLog::default();
        dispatch_line(&format!("DIST:{}", value), &telemetry, &log);
        prop_assert_eq!(telemetry.get(), value);
    }

    #[test]
    fn bare_readings_set_distance(whole in 0u32..100_000, frac in 0u32..1000) {
        let line = format!("{}.{}", whole, frac);
        let expected: f64 = line.parse().unwrap();
        prop_assert_eq!(classify(&line), InboundLine::Distance(expected));
    }

    #[test]
    fn text_never_touches_distance(text in "[a-zA-Z ,!?-]{1,40}") {
        prop_assume!(!text.contains("DIST"));
        let telemetry = TelemetryStore::new();
        telemetry.set(55.0);
        let log = MessageLog::default();
        dispatch_line(&text, &telemetry, &log);
        prop_assert_eq!(telemetry.get(), 55.0);
    }

    #[test]
    fn classification_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let line = String::from_utf8_lossy(&bytes);
        let _ = classify(&line);
    }
}

#[test]
fn test_label_is_case_sensitive() {
    assert_eq!(classify("dist: 5"), InboundLine::Info("dist: 5".to_string()));
}

#[test]
fn test_firmware_echo_is_informational() {
    assert!(matches!(classify("CMD RECV: stop"), InboundLine::Info(_)));
}
