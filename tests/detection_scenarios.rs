use click_sentinel::{
    ClickEvent, Config, Detection, EventWindow, InjectionFlags, Monitor, RawMouseEvent,
    Registration, ReportSink, TimingClassifier, Verdict,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<Detection>>>);

impl ReportSink for Recorder {
    fn report(&mut self, detection: &Detection) {
        self.0.borrow_mut().push(*detection);
    }
}

impl Recorder {
    fn suspicious(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|d| matches!(d, Detection::SuspiciousClickPattern { .. }))
            .count()
    }

    fn injected(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|d| matches!(d, Detection::InjectedInput { .. }))
            .count()
    }
}

fn running_monitor() -> (Monitor, Recorder) {
    let recorder = Recorder::default();
    let mut monitor = Monitor::new(&Config::default(), Box::new(recorder.clone()));
    monitor.attach(Registration::full()).unwrap();
    monitor.start().unwrap();
    (monitor, recorder)
}

fn click_at(monitor: &mut Monitor, base: Instant, ms: u64) -> Verdict {
    monitor.on_mouse_event_at(RawMouseEvent::left_down(100, 200), base + Duration::from_millis(ms))
}

fn offsets_ms(window: &EventWindow, base: Instant) -> Vec<u64> {
    window
        .iter()
        .map(|e| e.timestamp.duration_since(base).as_millis() as u64)
        .collect()
}

#[test]
fn scenario_a_stale_clicks_are_pruned() {
    let (mut monitor, recorder) = running_monitor();
    let base = Instant::now();

    click_at(&mut monitor, base, 0);
    click_at(&mut monitor, base, 5);
    assert_eq!(recorder.suspicious(), 1);

    click_at(&mut monitor, base, 15_000);
    assert_eq!(offsets_ms(monitor.window(), base), vec![15_000]);
    assert!(!TimingClassifier::default().is_suspicious(monitor.window()));
    assert_eq!(recorder.suspicious(), 1);
}

#[test]
fn scenario_b_ten_ms_apart_is_suspicious() {
    let (mut monitor, recorder) = running_monitor();
    let base = Instant::now();

    click_at(&mut monitor, base, 0);
    click_at(&mut monitor, base, 10);

    assert_eq!(recorder.suspicious(), 1);
    assert_eq!(
        recorder.0.borrow()[0],
        Detection::SuspiciousClickPattern {
            gap: Duration::from_millis(10),
            clicks_in_window: 2,
        }
    );
}

#[test]
fn scenario_c_one_fast_pair_among_slow_ones() {
    let (mut monitor, recorder) = running_monitor();
    let base = Instant::now();

    click_at(&mut monitor, base, 0);
    click_at(&mut monitor, base, 100);
    assert_eq!(recorder.suspicious(), 0);

    click_at(&mut monitor, base, 105);
    assert_eq!(recorder.suspicious(), 1);
}

#[test]
fn scenario_d_injected_low_level_event_is_suppressed() {
    let (mut monitor, recorder) = running_monitor();

    let verdict = monitor.on_low_level_event(InjectionFlags::from_bits(InjectionFlags::INJECTED));

    assert!(verdict.is_block());
    assert_eq!(recorder.injected(), 1);
    assert_eq!(monitor.stats().injected_blocked, 1);
}

#[test]
fn window_keeps_exactly_the_horizon() {
    let base = Instant::now();
    let stamps = [0u64, 1_000, 4_000, 4_000, 9_500, 12_000, 13_999, 14_000, 20_500];

    let mut window = EventWindow::default();
    for (i, &ms) in stamps.iter().enumerate() {
        window.record(ClickEvent::new(base + Duration::from_millis(ms), 0, 0));

        let newest = ms;
        let expected: Vec<u64> = stamps[..=i]
            .iter()
            .copied()
            .filter(|&t| t + 10_000 >= newest)
            .collect();
        assert_eq!(offsets_ms(&window, base), expected, "after recording {}ms", ms);
    }
}

#[test]
fn threshold_boundaries() {
    for (gap_ms, expected) in [(20u64, false), (19, true), (0, true), (21, false)] {
        let (mut monitor, recorder) = running_monitor();
        let base = Instant::now();
        click_at(&mut monitor, base, 0);
        click_at(&mut monitor, base, gap_ms);
        assert_eq!(recorder.suspicious() == 1, expected, "gap of {}ms", gap_ms);
    }
}

#[test]
fn single_click_never_suspicious() {
    let (mut monitor, recorder) = running_monitor();
    click_at(&mut monitor, Instant::now(), 0);
    assert_eq!(recorder.suspicious(), 0);
}

#[test]
fn injection_flag_combinations() {
    let cases = [
        (0, false),
        (InjectionFlags::INJECTED, true),
        (InjectionFlags::LOWER_IL_INJECTED, true),
        (InjectionFlags::INJECTED | InjectionFlags::LOWER_IL_INJECTED, true),
    ];
    for (bits, blocked) in cases {
        let (mut monitor, _) = running_monitor();
        let verdict = monitor.on_low_level_event(InjectionFlags::from_bits(bits));
        assert_eq!(verdict.is_block(), blocked, "flags {:#x}", bits);
    }
}

#[test]
fn repeated_prune_is_stable() {
    let base = Instant::now();
    let mut window = EventWindow::default();
    for ms in [0, 3_000, 8_000, 11_000] {
        window.record(ClickEvent::new(base + Duration::from_millis(ms), 0, 0));
    }
    let now = base + Duration::from_millis(19_000);

    window.prune(now);
    let once = offsets_ms(&window, base);
    window.prune(now);
    assert_eq!(offsets_ms(&window, base), once);
    assert_eq!(once, vec![11_000]);
}

#[test]
fn injected_click_is_not_timed() {
    let (mut monitor, recorder) = running_monitor();
    let base = Instant::now();
    let injected = InjectionFlags::from_bits(InjectionFlags::LOWER_IL_INJECTED);

    click_at(&mut monitor, base, 0);
    let verdict = monitor.on_mouse_event_at(
        RawMouseEvent::left_down(0, 0).with_injection(injected),
        base + Duration::from_millis(1),
    );

    assert_eq!(verdict, Verdict::Block);
    assert_eq!(monitor.window().len(), 1);
    assert_eq!(recorder.suspicious(), 0);
    assert_eq!(recorder.injected(), 1);
}
