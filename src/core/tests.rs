use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};

use crate::core::{Config, Scheduler, SchedulerState, StopMode};
use crate::error::{SchedulerError, SinkError};
use crate::events::{Event, EventKind};
use crate::listeners::{BlockingListenerFn, ListenerFn, ListenerRef};
use crate::sink::{Level, TraceSink};
use crate::subscribers::Subscribe;
use crate::units::TimingUnit;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn setup(dot_ms: u64) -> (Arc<Scheduler>, Arc<TraceSink>) {
    let sink = Arc::new(TraceSink::new());
    let sched = Scheduler::new(Config::with_dot(ms(dot_ms)), sink.clone());
    (sched, sink)
}

fn counter() -> (Arc<AtomicUsize>, ListenerRef) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let listener: ListenerRef = ListenerFn::arc("count", move || {
        let seen = Arc::clone(&seen);
        async move {
            seen.fetch_add(1, Ordering::SeqCst);
        }
    });
    (count, listener)
}

/// Listener reporting the (virtual) time it ran at.
fn stamp() -> (mpsc::UnboundedReceiver<Instant>, ListenerRef) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener: ListenerRef = ListenerFn::arc("stamp", move || {
        let tx = tx.clone();
        async move {
            let _ = tx.send(Instant::now());
        }
    });
    (rx, listener)
}

fn kinds_until(rx: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev.kind);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn test_timeline_matches_unit_durations() {
    let (sched, sink) = setup(100);
    let t0 = Instant::now();

    sched.start().unwrap();
    sched.submit_all([
        TimingUnit::Dot,
        TimingUnit::CharBoundaryPause,
        TimingUnit::Dash,
    ]);
    sched.wait_idle().await;

    assert_eq!(
        sink.offsets_from(t0),
        vec![
            (ms(0), Level::On),
            (ms(100), Level::Off),
            (ms(500), Level::On),
            (ms(800), Level::Off),
        ]
    );
    assert_eq!(t0.elapsed(), ms(900));
    assert_eq!(sched.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_units_submitted_before_start_are_buffered() {
    let (sched, sink) = setup(10);
    sched.submit(TimingUnit::Dot);
    sched.submit(TimingUnit::Dash);
    assert_eq!(sched.pending(), 2);

    time::sleep(ms(500)).await;
    assert!(sink.is_empty());

    let t0 = Instant::now();
    sched.start().unwrap();
    sched.wait_idle().await;
    assert_eq!(
        sink.offsets_from(t0),
        vec![
            (ms(0), Level::On),
            (ms(10), Level::Off),
            (ms(20), Level::On),
            (ms(50), Level::Off),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_fifo_across_producers() {
    let (sched, _sink) = setup(1);
    let mut events = sched.events();
    let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    sched.start().unwrap();

    let mut producers = Vec::new();
    for p in 0..3usize {
        let sched = Arc::clone(&sched);
        let seen = Arc::clone(&seen);
        producers.push(tokio::spawn(async move {
            for i in 0..20usize {
                let seen = Arc::clone(&seen);
                let l = ListenerFn::arc("order", move || {
                    let seen = Arc::clone(&seen);
                    async move {
                        seen.lock().unwrap().push((p, i));
                    }
                });
                sched.submit_with(TimingUnit::Dot, l);
                tokio::task::yield_now().await;
            }
        }));
    }
    for h in producers {
        h.await.unwrap();
    }
    sched.wait_idle().await;
    sched.stop(StopMode::Drain).await.unwrap();

    let mut completed = Vec::new();
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::UnitCompleted {
            completed.push(ev.entry.unwrap());
        }
    }
    assert_eq!(completed, (0..60).collect::<Vec<u64>>());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 60);
    for p in 0..3 {
        let order: Vec<usize> = seen.iter().filter(|(q, _)| *q == p).map(|(_, i)| *i).collect();
        assert_eq!(order, (0..20).collect::<Vec<_>>());
    }
}

#[tokio::test(start_paused = true)]
async fn test_collection_listener_fires_once_after_last_unit() {
    let (sched, _sink) = setup(100);
    let (mut stamps, listener) = stamp();
    let t0 = Instant::now();

    sched.start().unwrap();
    sched.submit_all_with(
        [TimingUnit::Dot, TimingUnit::Dot, TimingUnit::Dash],
        listener,
    );

    let fired = stamps.recv().await.unwrap();
    assert!(fired.duration_since(t0) >= ms(800));

    sched.wait_idle().await;
    time::sleep(ms(1000)).await;
    assert!(stamps.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_sequence_listener_binds_to_last_unit() {
    let (sched, sink) = setup(100);
    let (mut stamps, listener) = stamp();
    let t0 = Instant::now();

    sched.start().unwrap();
    let units = (0..3).map(|_| TimingUnit::Dash);
    sched.submit_sequence(units, Some(listener));

    let fired = stamps.recv().await.unwrap();
    assert_eq!(fired.duration_since(t0), ms(1200));
    assert_eq!(sink.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_stream_submission_keeps_order() {
    let (sched, sink) = setup(10);
    let (count, listener) = counter();
    sched.start().unwrap();

    let stream = futures::stream::iter([
        Some(TimingUnit::Dash),
        None,
        Some(TimingUnit::Dot),
    ]);
    sched.submit_stream(stream, Some(listener)).await;
    sched.wait_idle().await;
    time::sleep(ms(1)).await;

    assert_eq!(
        sink.levels(),
        vec![Level::On, Level::Off, Level::On, Level::Off]
    );
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_unit_is_a_silent_noop() {
    let (sched, sink) = setup(100);
    let (mut stamps, listener) = stamp();
    let t0 = Instant::now();

    sched.start().unwrap();
    sched.submit_with(Option::<TimingUnit>::None, listener);
    sched.submit(TimingUnit::Dot);

    let fired = stamps.recv().await.unwrap();
    assert_eq!(fired.duration_since(t0), ms(0));

    sched.wait_idle().await;
    assert_eq!(
        sink.offsets_from(t0),
        vec![(ms(0), Level::On), (ms(100), Level::Off)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_collection_never_notifies() {
    let (sched, _sink) = setup(10);
    let (count, listener) = counter();
    sched.start().unwrap();

    sched.submit_all_with(Vec::<TimingUnit>::new(), Arc::clone(&listener));
    sched.submit_sequence(std::iter::empty::<TimingUnit>(), Some(Arc::clone(&listener)));
    sched
        .submit_stream(futures::stream::empty::<TimingUnit>(), Some(listener))
        .await;
    assert_eq!(sched.pending(), 0);

    time::sleep(ms(100)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_submit_never_waits_for_playback() {
    let (sched, sink) = setup(1);
    sched.start().unwrap();

    let t0 = Instant::now();
    for _ in 0..10_000 {
        sched.submit(TimingUnit::Dot);
    }
    assert_eq!(t0.elapsed(), Duration::ZERO);
    assert_eq!(sched.pending(), 10_000);

    sched.wait_idle().await;
    assert_eq!(sink.len(), 20_000);
    assert_eq!(t0.elapsed(), ms(20_000));
}

#[tokio::test(start_paused = true)]
async fn test_batches_play_contiguously() {
    let (sched, _sink) = setup(1);
    let mut events = sched.events();
    sched.start().unwrap();

    let producer = {
        let sched = Arc::clone(&sched);
        tokio::spawn(async move {
            let stream = futures::stream::iter(0..6).then(|_| async {
                tokio::task::yield_now().await;
                TimingUnit::Dot
            });
            sched.submit_stream(stream, None).await;
        })
    };
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    sched.submit_all([TimingUnit::Dash, TimingUnit::Dash, TimingUnit::Dash]);
    producer.await.unwrap();
    sched.wait_idle().await;

    let mut played = Vec::new();
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::UnitStarted {
            played.push(ev.unit.unwrap());
        }
    }
    assert_eq!(played.len(), 9);
    let first_dash = played
        .iter()
        .position(|u| *u == TimingUnit::Dash)
        .unwrap();
    assert_eq!(
        &played[first_dash..first_dash + 3],
        &[TimingUnit::Dash; 3]
    );
}

#[tokio::test(start_paused = true)]
async fn test_listener_failures_do_not_delay_playback() {
    let (sched, sink) = setup(100);
    let mut events = sched.events();
    let t0 = Instant::now();
    sched.start().unwrap();

    let hangs: ListenerRef = ListenerFn::arc("hangs", || std::future::pending::<()>());
    let panics: ListenerRef = ListenerFn::arc("panics", || async { panic!("listener bug"); });

    sched.submit_with(TimingUnit::Dot, hangs);
    sched.submit_with(TimingUnit::Dot, panics);
    sched.submit(TimingUnit::Dash);
    sched.wait_idle().await;

    assert_eq!(
        sink.offsets_from(t0),
        vec![
            (ms(0), Level::On),
            (ms(100), Level::Off),
            (ms(200), Level::On),
            (ms(300), Level::Off),
            (ms(400), Level::On),
            (ms(700), Level::Off),
        ]
    );

    let ev = time::timeout(ms(1000), async {
        loop {
            let ev = events.recv().await.unwrap();
            if ev.kind == EventKind::ListenerPanicked {
                return ev;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(ev.entry, Some(1));
    assert_eq!(ev.listener.as_deref(), Some("panics"));
    assert_eq!(ev.reason.as_deref(), Some("listener bug"));
}

#[tokio::test(start_paused = true)]
async fn test_sink_errors_are_reported_and_skipped() {
    let sink = Arc::new(|level: Level| -> Result<(), SinkError> {
        match level {
            Level::On => Err(SinkError::Unavailable {
                reason: "no carrier".into(),
            }),
            Level::Off => Ok(()),
        }
    });
    let sched = Scheduler::new(Config::with_dot(ms(10)), sink);
    let mut events = sched.events();
    let t0 = Instant::now();

    sched.start().unwrap();
    sched.submit_all([TimingUnit::Dot, TimingUnit::Dot]);
    sched.wait_idle().await;

    assert_eq!(t0.elapsed(), ms(40));
    let failed: Vec<Event> = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|ev| ev.kind == EventKind::SinkFailed)
        .collect();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0].level, Some(Level::On));
    assert_eq!(sched.state(), SchedulerState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_stop_drain_plays_everything_queued() {
    let (sched, sink) = setup(100);
    let (count, listener) = counter();
    let t0 = Instant::now();

    sched.start().unwrap();
    sched.submit(TimingUnit::Dot);
    sched.submit_with(TimingUnit::Dash, listener);
    sched.stop(StopMode::Drain).await.unwrap();

    assert_eq!(t0.elapsed(), ms(600));
    assert_eq!(sink.len(), 4);
    assert_eq!(sched.state(), SchedulerState::Stopped);
    assert_eq!(sched.pending(), 0);

    time::sleep(ms(1)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_discard_forces_signal_off() {
    let (sched, sink) = setup(100);
    let (count, listener) = counter();
    let t0 = Instant::now();

    sched.start().unwrap();
    sched.submit_with(TimingUnit::Dash, Arc::clone(&listener));
    sched.submit(TimingUnit::Dot);
    sched.submit_with(TimingUnit::Dot, listener);

    time::sleep(ms(100)).await;
    sched.stop(StopMode::Discard).await.unwrap();

    assert_eq!(
        sink.offsets_from(t0),
        vec![(ms(0), Level::On), (ms(100), Level::Off)]
    );
    assert_eq!(sched.pending(), 0);
    assert_eq!(sched.state(), SchedulerState::Stopped);

    time::sleep(ms(1000)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(sink.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_drain_past_grace_discards_rest() {
    let sink = Arc::new(TraceSink::new());
    let mut cfg = Config::with_dot(ms(100));
    cfg.grace = ms(250);
    let sched = Scheduler::new(cfg, sink.clone());
    let mut events = sched.events();
    let t0 = Instant::now();

    sched.start().unwrap();
    sched.submit_all([TimingUnit::Dash, TimingUnit::Dash]);

    let err = sched.stop(StopMode::Drain).await.unwrap_err();
    assert!(matches!(
        err,
        SchedulerError::GraceExceeded { grace, pending: 2 } if grace == ms(250)
    ));
    assert_eq!(err.as_label(), "scheduler_grace_exceeded");
    assert_eq!(
        sink.offsets_from(t0),
        vec![(ms(0), Level::On), (ms(250), Level::Off)]
    );
    assert_eq!(sched.state(), SchedulerState::Stopped);
    assert_eq!(sched.pending(), 0);

    let counts: Vec<(EventKind, Option<u64>)> = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|ev| matches!(ev.kind, EventKind::WorkerStopped | EventKind::GraceExceeded))
        .map(|ev| (ev.kind, ev.count))
        .collect();
    assert_eq!(
        counts,
        vec![
            (EventKind::WorkerStopped, Some(2)),
            (EventKind::GraceExceeded, Some(2)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_errors() {
    let (sched, _sink) = setup(10);

    assert!(matches!(
        sched.stop(StopMode::Drain).await,
        Err(SchedulerError::NotRunning {
            state: SchedulerState::Created
        })
    ));

    sched.start().unwrap();
    assert!(matches!(
        sched.start(),
        Err(SchedulerError::AlreadyStarted {
            state: SchedulerState::Running
        })
    ));

    sched.stop(StopMode::Discard).await.unwrap();
    assert!(matches!(
        sched.stop(StopMode::Discard).await,
        Err(SchedulerError::NotRunning {
            state: SchedulerState::Stopped
        })
    ));
    assert!(sched.start().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_submit_after_stop_is_rejected() {
    let (sched, sink) = setup(10);
    let (count, listener) = counter();
    sched.start().unwrap();
    sched.stop(StopMode::Drain).await.unwrap();

    let mut events = sched.events();
    sched.submit_with(TimingUnit::Dash, listener);

    assert_eq!(sched.pending(), 0);
    assert_eq!(kinds_until(&mut events), vec![EventKind::SubmitRejected]);

    time::sleep(ms(100)).await;
    assert!(sink.is_empty());
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_worker_panic_is_fatal_and_reported() {
    let sink = Arc::new(|level: Level| -> Result<(), SinkError> {
        if level.is_on() {
            panic!("relay fused");
        }
        Ok(())
    });
    let sched = Scheduler::new(Config::with_dot(ms(10)), sink);
    let mut events = sched.events();

    sched.start().unwrap();
    sched.submit_all([TimingUnit::Dot, TimingUnit::Dash]);
    sched.wait_idle().await;

    assert_eq!(sched.state(), SchedulerState::Failed);
    assert_eq!(sched.pending(), 0);
    let lost = std::iter::from_fn(|| events.try_recv().ok())
        .find(|ev| ev.kind == EventKind::WorkerLost)
        .unwrap();
    assert_eq!(lost.reason.as_deref(), Some("relay fused"));

    match sched.stop(StopMode::Drain).await {
        Err(SchedulerError::WorkerLost { reason }) => assert_eq!(reason, "relay fused"),
        other => panic!("unexpected stop result: {other:?}"),
    }

    sched.submit(TimingUnit::Dot);
    assert_eq!(sched.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_listener_limit_serializes_bodies() {
    let sink = Arc::new(TraceSink::new());
    let mut cfg = Config::with_dot(ms(1));
    cfg.max_listeners = 1;
    let sched = Scheduler::new(cfg, sink);
    let (tx, mut stamps) = mpsc::unbounded_channel();

    sched.start().unwrap();
    for _ in 0..3 {
        let tx = tx.clone();
        let slow = ListenerFn::arc("slow", move || {
            let tx = tx.clone();
            async move {
                time::sleep(ms(100)).await;
                let _ = tx.send(Instant::now());
            }
        });
        sched.submit_with(TimingUnit::Empty, slow);
    }
    drop(tx);

    let t0 = Instant::now();
    let mut done = Vec::new();
    while let Some(at) = stamps.recv().await {
        done.push(at.duration_since(t0));
    }
    assert_eq!(done, vec![ms(100), ms(200), ms(300)]);
}

struct Recorder {
    kinds: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.kinds.lock().unwrap().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_the_whole_lifecycle() {
    let recorder = Arc::new(Recorder {
        kinds: Mutex::new(Vec::new()),
    });
    let sink = Arc::new(TraceSink::new());
    let sched = Scheduler::builder(Config::with_dot(ms(10)))
        .with_subscriber(recorder.clone())
        .build(sink);

    sched.start().unwrap();
    sched.submit(TimingUnit::Dot);
    sched.submit(TimingUnit::Empty);
    sched.stop(StopMode::Drain).await.unwrap();

    assert_eq!(
        *recorder.kinds.lock().unwrap(),
        vec![
            EventKind::WorkerStarted,
            EventKind::StopRequested,
            EventKind::UnitStarted,
            EventKind::UnitCompleted,
            EventKind::UnitSkipped,
            EventKind::WorkerStopped,
            EventKind::StoppedWithinGrace,
        ]
    );
}

/// Drains a bus receiver until every sender is gone; returns completed entry ids.
async fn completed_until_closed(events: &mut broadcast::Receiver<Event>) -> Vec<u64> {
    let mut completed = Vec::new();
    loop {
        match events.recv().await {
            Ok(ev) if ev.kind == EventKind::UnitCompleted => completed.push(ev.entry.unwrap()),
            Ok(_) => {}
            Err(broadcast::error::RecvError::Closed) => return completed,
            Err(broadcast::error::RecvError::Lagged(n)) => panic!("lagged by {n}"),
        }
    }
}

#[tokio::test]
async fn test_blocking_listener_keeps_playback_on_time() {
    let (sched, sink) = setup(20);
    let (tx, mut done) = mpsc::unbounded_channel();
    let slow: ListenerRef = BlockingListenerFn::arc("slow", move || {
        std::thread::sleep(ms(500));
        let _ = tx.send(());
    });

    let t0 = Instant::now();
    sched.start().unwrap();
    sched.submit_with(TimingUnit::Dot, slow);
    sched.submit(TimingUnit::Dot);
    sched.wait_idle().await;

    let offsets = sink.offsets_from(t0);
    assert_eq!(offsets.len(), 4);
    let (released, level) = offsets[3];
    assert_eq!(level, Level::Off);
    assert!(released < ms(300), "second dot released at {released:?}");

    done.recv().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_scheduler_plays_out_the_queue() {
    let (sched, sink) = setup(10);
    let mut events = sched.events();
    sched.start().unwrap();
    for _ in 0..5 {
        sched.submit(TimingUnit::Dot);
    }
    drop(sched);

    assert_eq!(completed_until_closed(&mut events).await, vec![0, 1, 2, 3, 4]);
    assert_eq!(sink.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_os_thread_producers_keep_fifo() {
    let (sched, sink) = setup(1);
    let mut events = sched.events();
    sched.start().unwrap();

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let sched = Arc::clone(&sched);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    sched.submit(TimingUnit::Dot);
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }
    drop(sched);

    let completed = completed_until_closed(&mut events).await;
    assert_eq!(completed, (0..200).collect::<Vec<u64>>());
    assert_eq!(sink.len(), 400);
}

#[tokio::test(start_paused = true)]
async fn test_huge_dot_plays_and_discards_cleanly() {
    let sink = Arc::new(TraceSink::new());
    let sched = Scheduler::new(Config::with_dot(Duration::MAX), sink.clone());
    sched.start().unwrap();
    sched.submit(TimingUnit::WordBoundaryPause);
    sched.submit(TimingUnit::Dash);

    time::sleep(ms(1000)).await;
    sched.stop(StopMode::Discard).await.unwrap();

    assert_eq!(sched.state(), SchedulerState::Stopped);
    assert!(sink.is_empty());
}
