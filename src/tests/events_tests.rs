use crate::events::{Event, EventHub};

#[test]
fn test_publish_without_subscribers_is_dropped() {
    let hub = EventHub::new(4);
    assert_eq!(hub.publish(Event::DaemonError { message: "boom".to_string() }), 0);
}

#[test]
fn test_publish_reaches_every_subscriber() {
    let hub = EventHub::new(4);
    let mut first = hub.subscribe();
    let mut second = hub.subscribe();

    assert_eq!(hub.publish(Event::DaemonError { message: "boom".to_string() }), 2);
    for rx in [&mut first, &mut second] {
        match rx.try_recv().unwrap() {
            Event::DaemonError { message } => assert_eq!(message, "boom"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
