//! Refresh scheduler: lock discipline, segmented bands and shutdown.
//!
//! Run: cargo test -p ui --test refresh

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use common::{gui, sliders, titled};
use embassy_futures::join::join;
use embassy_futures::yield_now;
use platform::mocks::MockDisplay;
use platform::DisplayError;
use ui::{CancelToken, Gui, GuiConfig, GuiError, RefreshScheduler, RefreshStrategy, TaskPolicy, Value, Widget};

#[tokio::test]
async fn held_lock_blocks_the_refresh() {
    let (panel, gui) = gui();
    gui.open(titled("root")).unwrap();
    let scheduler = RefreshScheduler::new(gui.clone(), panel.clone());
    assert_eq!(scheduler.strategy(), RefreshStrategy::Synchronous);

    let guard = gui.refresh_lock().lock().await;
    let blocked = tokio::time::timeout(Duration::from_millis(50), scheduler.refresh_once()).await;
    assert!(blocked.is_err(), "refresh ran while the lock was held");
    assert_eq!(panel.borrow().refresh_count(), 0);

    drop(guard);
    scheduler.refresh_once().await.unwrap();
    assert_eq!(panel.borrow().refresh_count(), 1);
}

#[tokio::test]
async fn releasing_the_lock_lets_the_waiting_refresh_through() {
    let (panel, gui) = gui();
    gui.open(titled("root")).unwrap();
    let scheduler = RefreshScheduler::new(gui.clone(), panel.clone());

    let holder = async {
        let guard = gui.refresh_lock().lock().await;
        for _ in 0..5 {
            yield_now().await;
            assert_eq!(panel.borrow().refresh_count(), 0);
        }
        drop(guard);
    };
    let (_, refreshed) = join(holder, scheduler.refresh_once()).await;
    refreshed.unwrap();
    assert_eq!(panel.borrow().refresh_count(), 1);
}

#[tokio::test]
async fn refresh_redraws_dirty_widgets() {
    let (panel, gui) = gui();
    let palette = gui.config().palette;
    let (screen, handles) = sliders(1, 0.0);
    gui.open(screen).unwrap();
    let slider = handles.borrow()[0].clone();
    let scheduler = RefreshScheduler::new(gui.clone(), panel.clone());

    // Row 2, col 4, 60 wide: the middle of the bar is empty at 0.0.
    assert_eq!(panel.borrow().pixel_at(30, 3), Some(palette.background));
    slider.set_value(Value::Float(1.0));
    assert!(slider.borrow().base().is_dirty());

    scheduler.refresh_once().await.unwrap();
    assert!(!slider.borrow().base().is_dirty());
    assert_eq!(panel.borrow().pixel_at(30, 3), Some(palette.foreground));
}

#[tokio::test]
async fn full_redraw_repaints_clean_widgets() {
    let (panel, gui) = gui();
    let palette = gui.config().palette;
    let (screen, _) = sliders(1, 1.0);
    gui.open(screen).unwrap();
    let scheduler = RefreshScheduler::new(gui.clone(), panel.clone());

    gui.display().clear().unwrap();
    scheduler.refresh_once().await.unwrap();
    assert_eq!(panel.borrow().pixel_at(30, 3), Some(palette.background));

    gui.request_full_redraw();
    scheduler.refresh_once().await.unwrap();
    assert_eq!(panel.borrow().pixel_at(30, 3), Some(palette.foreground));
}

fn segmented(preferred: Option<u32>) -> (Rc<RefCell<MockDisplay>>, Gui) {
    let panel = Rc::new(RefCell::new(MockDisplay::segmented(128, 64, preferred)));
    let gui = Gui::new(&panel, GuiConfig::default());
    (panel, gui)
}

#[tokio::test]
async fn segmented_panel_refreshes_band_by_band() {
    let (panel, gui) = segmented(Some(4));
    gui.open(titled("root")).unwrap();
    let scheduler = RefreshScheduler::new(gui.clone(), panel.clone());
    assert_eq!(scheduler.strategy(), RefreshStrategy::Segmented(4));

    scheduler.refresh_once().await.unwrap();
    assert_eq!(panel.borrow().segments(), &[(0, 4), (1, 4), (2, 4), (3, 4)]);
    assert_eq!(panel.borrow().refresh_count(), 1);
}

#[tokio::test]
async fn waiter_gets_the_lock_between_bands() {
    let (panel, gui) = segmented(None);
    gui.open(titled("root")).unwrap();
    let scheduler = RefreshScheduler::new(gui.clone(), panel.clone());
    assert_eq!(scheduler.strategy(), RefreshStrategy::Segmented(2));

    let waiter = async {
        while panel.borrow().segments().is_empty() {
            yield_now().await;
        }
        let _guard = gui.refresh_lock().lock().await;
        let seen = panel.borrow().segments().len();
        for _ in 0..3 {
            yield_now().await;
            assert_eq!(panel.borrow().segments().len(), seen);
        }
        seen
    };
    let (refreshed, seen) = join(scheduler.refresh_once(), waiter).await;
    refreshed.unwrap();
    assert_eq!(seen, 1);
    assert_eq!(panel.borrow().segments().len(), 2);
}

#[tokio::test]
async fn shutdown_tears_everything_down() {
    let (panel, gui) = gui();
    let palette = gui.config().palette;
    let close = CancelToken::new();
    let leave = CancelToken::new();
    let (screen, _) = sliders(1, 1.0);
    gui.open(screen).unwrap();
    gui.register_task(close.clone(), TaskPolicy::CancelOnClose).unwrap();
    gui.open(titled("top")).unwrap();
    gui.register_task(leave.clone(), TaskPolicy::CancelOnLeave).unwrap();
    assert_eq!(gui.depth(), 2);

    let scheduler = RefreshScheduler::new(gui.clone(), panel.clone());
    gui.shutdown();
    scheduler.monitor().await.unwrap();

    assert!(close.is_cancelled());
    assert!(leave.is_cancelled());
    assert_eq!(gui.depth(), 0);
    assert!(gui.current_screen().is_none());
    assert!(panel.borrow().refresh_count() >= 1);
    // The "top" slider sat at row 20, col 10.
    assert_eq!(panel.borrow().pixel_at(15, 22), Some(palette.background));
}

#[tokio::test]
async fn panel_failure_still_tears_everything_down() {
    let (panel, gui) = gui();
    let palette = gui.config().palette;
    let close = CancelToken::new();
    let leave = CancelToken::new();
    let (screen, _) = sliders(1, 1.0);
    gui.open(screen).unwrap();
    gui.register_task(close.clone(), TaskPolicy::CancelOnClose).unwrap();
    gui.open(titled("top")).unwrap();
    gui.register_task(leave.clone(), TaskPolicy::CancelOnLeave).unwrap();
    panel.borrow_mut().set_failing(true);

    let scheduler = RefreshScheduler::new(gui.clone(), panel.clone());
    let outcome = tokio::time::timeout(Duration::from_secs(5), scheduler.monitor())
        .await
        .expect("monitor returned");

    assert_eq!(outcome, Err(GuiError::Display(DisplayError::Communication)));
    assert!(gui.is_shut_down());
    assert!(close.is_cancelled());
    assert!(leave.is_cancelled());
    assert_eq!(gui.depth(), 0);
    assert!(gui.current_screen().is_none());
    assert_eq!(panel.borrow().refresh_count(), 0);
    assert_eq!(panel.borrow().pixel_at(15, 22), Some(palette.background));
}

#[tokio::test]
async fn back_at_root_stops_the_scheduler() {
    let (panel, gui) = gui();
    gui.open(titled("root")).unwrap();
    let scheduler = RefreshScheduler::new(gui.clone(), panel.clone());

    let app = async {
        for _ in 0..3 {
            yield_now().await;
        }
        gui.back().unwrap();
    };
    let (stopped, ()) = tokio::time::timeout(Duration::from_secs(5), join(scheduler.monitor(), app))
        .await
        .expect("scheduler stopped");
    stopped.unwrap();
    assert_eq!(gui.depth(), 0);
}

#[tokio::test]
async fn cancelled_task_observes_navigation() {
    let (_panel, gui) = gui();
    let token = CancelToken::new();
    gui.open(titled("root")).unwrap();
    gui.register_task(token.clone(), TaskPolicy::CancelOnLeave).unwrap();

    let local = tokio::task::LocalSet::new();
    let finished = local
        .run_until(async {
            let worker = tokio::task::spawn_local({
                let token = token.clone();
                async move { token.run(std::future::pending::<()>()).await }
            });
            yield_now().await;
            gui.open(titled("next")).unwrap();
            worker.await.unwrap()
        })
        .await;
    assert_eq!(finished, None);
}
