// End-to-end checks across the timer, the session log and the reports,
// using only the public library surface.

use std::{sync::Arc, time::Duration};

use chrono::{Local, TimeZone, Utc};
use focuslog_lib::{
    db::Database,
    lifecycle::{ForegroundState, LifecycleMonitor},
    models::{Category, SessionRecord},
    reports::{build_report, Reports},
    store::{KeyValueStore, MemoryStore, SessionLog, SESSIONS_KEY},
    timer::{RecordOutcome, SessionRecorder, TimerController, TimerEvent, TimerRunState},
};
use tokio::sync::watch;

#[tokio::test(start_paused = true)]
async fn distraction_after_five_minutes_shows_up_in_reports() {
    let log = SessionLog::new(Arc::new(MemoryStore::new()));
    let timer = TimerController::new(
        SessionRecorder::new(log.clone()),
        TimerRunState::new(25, Category::Reading),
    );
    let mut events = timer.subscribe();

    let (signal_tx, signal_rx) = watch::channel(ForegroundState::Active);
    let mut monitor = LifecycleMonitor::new();
    monitor.start(timer.clone(), signal_rx).unwrap();

    timer.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300_500)).await;
    signal_tx.send_replace(ForegroundState::Background);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let records = log.read_all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].focused_seconds, 300);
    assert_eq!(records[0].distractions, 1);
    assert_eq!(records[0].category.as_deref(), Some("Reading"));

    let mut summaries = Vec::new();
    loop {
        match events.try_recv() {
            Ok(TimerEvent::SessionRecorded(summary)) => summaries.push(summary),
            Ok(_) => {}
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    assert_eq!(summaries.len(), 1);
    assert_eq!(
        summaries[0].to_string(),
        "Session distracted | Duration: 05:00 | Category: Reading | Distractions: 1"
    );

    let report = build_report(&records, &records[0].date.with_timezone(&Local));
    assert_eq!(report.today_seconds, 300);
    assert_eq!(report.all_time.distractions, 1);
    assert_eq!(report.last_7_days[6].minutes, 5);
    assert_eq!(report.by_category.len(), 1);
    assert_eq!(report.by_category[0].name, "Reading");
    assert_eq!(report.by_category[0].rounded_percentage(), 100);

    monitor.stop().await.unwrap();
    timer.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn exactly_one_record_per_run_whatever_fires() {
    let log = SessionLog::new(Arc::new(MemoryStore::new()));
    let timer = TimerController::new(
        SessionRecorder::new(log.clone()),
        TimerRunState::new(5, Category::Study),
    );

    timer.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(400)).await;

    assert!(timer.pause().await.is_err());
    assert_eq!(
        timer
            .handle_foreground_change(ForegroundState::Background)
            .await
            .unwrap(),
        None
    );
    assert_eq!(log.read_all().await.len(), 1);

    // A fresh run after reset records independently.
    timer.reset().await;
    timer.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    let outcome = timer.pause().await.unwrap();
    assert!(matches!(outcome, RecordOutcome::Recorded(ref s) if s.focused_seconds == 10));
    assert_eq!(log.read_all().await.len(), 2);
}

#[tokio::test]
async fn sqlite_log_keeps_order_and_clears() {
    let dir = tempfile::tempdir().unwrap();
    let database = Database::new(dir.path().join("focuslog.sqlite3")).unwrap();
    let log = SessionLog::new(Arc::new(database.clone()));

    let records: Vec<SessionRecord> = ["Study", "Coding", "Project"]
        .iter()
        .enumerate()
        .map(|(i, category)| {
            SessionRecord::new(
                Utc.with_ymd_and_hms(2026, 10, 17, 8, 10 * i as u32, 0).unwrap(),
                60 * (i as u32 + 1),
                i as u32,
                *category,
            )
        })
        .collect();
    for record in &records {
        log.append(record.clone()).await.unwrap();
    }

    assert_eq!(log.read_all().await, records);

    let stored = database.get(SESSIONS_KEY).await.unwrap().unwrap();
    assert!(stored.starts_with("[{"));
    assert!(stored.contains(r#""date":"2026-10-17T08:00:00.000Z""#));
    assert!(stored.contains(r#""focusedSeconds":60"#));

    let history = Reports::new(log.clone()).history().await;
    let categories: Vec<String> = history.iter().map(|r| r.category_label()).collect();
    assert_eq!(categories, vec!["Project", "Coding", "Study"]);

    log.clear().await.unwrap();
    assert!(log.read_all().await.is_empty());
    assert_eq!(database.get(SESSIONS_KEY).await.unwrap(), None);
    assert_eq!(Reports::new(log).report().await.session_count, 0);
}
