use image::RgbImage;
use spiderbot_core::{Frame, FrameKind, FrameRelay, OfferOutcome, OverflowPolicy};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn tagged_frame(kind: FrameKind, tag: u8) -> Frame {
    let mut image = RgbImage::new(1, 1);
    image.put_pixel(0, 0, image::Rgb([tag, 0, 0]));
    Frame::new(kind, image)
}

fn tag_of(frame: &Frame) -> u8 {
    frame.image.get_pixel(0, 0)[0]
}

#[test]
fn test_full_channel_yields_latest_frame() {
    let relay = FrameRelay::default();

    assert_eq!(relay.offer(tagged_frame(FrameKind::Rgb, 1)), OfferOutcome::Accepted);
    assert_eq!(
        relay.offer(tagged_frame(FrameKind::Rgb, 2)),
        OfferOutcome::EvictedOldest
    );

    let frame = relay.try_take(FrameKind::Rgb).expect("a frame");
    assert_eq!(tag_of(&frame), 2);
    assert!(relay.try_take(FrameKind::Rgb).is_none());
}

#[test]
fn test_drop_incoming_policy() {
    let relay = FrameRelay::new(1, OverflowPolicy::DropIncoming);

    relay.offer(tagged_frame(FrameKind::Thermal, 7));
    assert_eq!(
        relay.offer(tagged_frame(FrameKind::Thermal, 8)),
        OfferOutcome::DroppedIncoming
    );

    let frame = relay.try_take(FrameKind::Thermal).expect("a frame");
    assert_eq!(tag_of(&frame), 7);
    assert_eq!(relay.channel(FrameKind::Thermal).dropped(), 1);
}

#[test]
fn test_empty_take_does_not_block() {
    let relay = FrameRelay::default();
    assert!(relay.try_take(FrameKind::Rgb).is_none());
    assert!(relay.try_take(FrameKind::Thermal).is_none());
}

#[test]
fn test_streams_never_mix() {
    let relay = FrameRelay::default();
    relay.offer(tagged_frame(FrameKind::Rgb, 1));
    relay.offer(tagged_frame(FrameKind::Thermal, 2));

    assert_eq!(tag_of(&relay.try_take(FrameKind::Thermal).unwrap()), 2);
    assert_eq!(tag_of(&relay.try_take(FrameKind::Rgb).unwrap()), 1);
}

#[test]
fn test_concurrent_producer_and_poller() {
    let relay = FrameRelay::default();
    let producer_relay = relay.clone();
    let done = Arc::new(AtomicBool::new(false));
    let producer_done = done.clone();

    let producer = thread::spawn(move || {
        for tag in 0..=200u8 {
            producer_relay.offer(tagged_frame(FrameKind::Rgb, tag));
            thread::sleep(Duration::from_micros(200));
        }
        producer_done.store(true, Ordering::SeqCst);
    });

    let mut last_seen: Option<u8> = None;
    while !done.load(Ordering::SeqCst) {
        if let Some(frame) = relay.try_take(FrameKind::Rgb) {
            let tag = tag_of(&frame);
            if let Some(prev) = last_seen {
                assert!(tag > prev, "frames must arrive in offer order");
            }
            last_seen = Some(tag);
        }
        thread::sleep(Duration::from_millis(1));
    }
    producer.join().unwrap();

    if let Some(frame) = relay.try_take(FrameKind::Rgb) {
        last_seen = Some(tag_of(&frame));
    }
    assert_eq!(last_seen, Some(200));
}
