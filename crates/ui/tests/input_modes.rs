//! Input engine end to end: gestures through operations into the GUI.
//!
//! Run: cargo test -p ui --test input_modes

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{approx, gui, gui_with, sliders};
use embassy_time::Instant;
use platform::mocks::MockInput;
use platform::{Button, InputEvent};
use ui::widgets::{Button as PushButton, Slider};
use ui::{
    Direction, Geometry, GuiConfig, InputEngine, InputMode, Operation, Rig, ScreenBuilder, Value,
    Widget, WidgetRef,
};

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

async fn feed(engine: &mut InputEngine, input: &MockInput, event: InputEvent, ms: u64) {
    for op in engine.handle_event(event, at(ms)) {
        engine.apply(op, input).await.unwrap();
    }
}

async fn tick(engine: &mut InputEngine, input: &MockInput, ms: u64) {
    for op in engine.handle_timeout(at(ms)) {
        engine.apply(op, input).await.unwrap();
    }
}

#[tokio::test]
async fn three_button_rig_walks_through_the_modes() {
    let (_panel, gui) = gui();
    let (screen, _) = sliders(2, 0.5);
    gui.open(screen).unwrap();
    let input = MockInput::new();
    let mut engine = InputEngine::new(gui.clone(), Rig::THREE_BUTTON);

    // Double click: NORMAL → ADJUST.
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Select), 0).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Select), 60).await;
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Select), 200).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Select), 260).await;
    assert_eq!(gui.mode(), InputMode::Adjust);

    // Long press: ADJUST → PRECISION.
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Select), 1000).await;
    assert_eq!(engine.next_deadline(), Some(at(1400)));
    tick(&mut engine, &input, 1400).await;
    assert_eq!(gui.mode(), InputMode::Adjust);
    tick(&mut engine, &input, 2000).await;
    assert_eq!(gui.mode(), InputMode::Precision);
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Select), 2100).await;

    // Single press leaves precision for ADJUST, not NORMAL.
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Select), 3000).await;
    assert_eq!(gui.mode(), InputMode::Adjust);
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Select), 3050).await;

    // Double click again: back to NORMAL.
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Select), 3200).await;
    assert_eq!(gui.mode(), InputMode::Normal);
}

#[tokio::test]
async fn three_button_adjust_mode_repurposes_next_and_prev() {
    let (_panel, gui) = gui();
    let (screen, handles) = sliders(2, 0.5);
    gui.open(screen).unwrap();
    let first = handles.borrow()[0].clone();
    let input = MockInput::new();
    let mut engine = InputEngine::new(gui.clone(), Rig::THREE_BUTTON);

    gui.set_mode(InputMode::Adjust);
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Next), 0).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Next), 50).await;
    assert!(first.has_focus());
    assert!(approx(first.value().as_f32().unwrap(), 0.51));

    gui.set_mode(InputMode::Normal);
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Next), 1000).await;
    assert!(handles.borrow()[1].has_focus());
}

#[tokio::test]
async fn quick_taps_are_never_swallowed() {
    let (_panel, gui) = gui();
    let (screen, handles) = sliders(3, 0.5);
    gui.open(screen).unwrap();
    let h = handles.borrow().clone();
    let input = MockInput::new();
    let mut engine = InputEngine::new(gui.clone(), Rig::THREE_BUTTON);

    // Two taps inside the double-click window: two moves.
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Next), 0).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Next), 50).await;
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Next), 200).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Next), 250).await;
    assert!(h[2].has_focus());

    // Same in ADJUST mode: two steps.
    gui.set_mode(InputMode::Adjust);
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Next), 1000).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Next), 1050).await;
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Next), 1200).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Next), 1250).await;
    assert!(approx(h[2].value().as_f32().unwrap(), 0.52));
}

#[tokio::test]
async fn second_button_is_ignored_while_the_first_is_down() {
    let (_panel, gui) = gui();
    let (screen, handles) = sliders(3, 0.5);
    gui.open(screen).unwrap();
    let h = handles.borrow().clone();
    let input = MockInput::new();
    let mut engine = InputEngine::new(gui.clone(), Rig::FIVE_BUTTON);

    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Next), 0).await;
    assert!(h[1].has_focus());
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Prev), 20).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Prev), 40).await;
    assert!(h[1].has_focus(), "prev pressed while next is down");

    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Next), 60).await;
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Prev), 80).await;
    assert!(h[0].has_focus());
}

#[test]
fn cancel_precision_outside_precision_is_a_no_op() {
    let (_panel, gui) = gui();
    let (screen, handles) = sliders(2, 0.5);
    gui.open(screen).unwrap();
    let h = handles.borrow().clone();
    // Opening drew everything.
    assert!(h.iter().all(|w| !w.borrow().base().is_dirty()));

    assert!(!gui.cancel_precision());
    assert_eq!(gui.mode(), InputMode::Normal);
    assert!(h.iter().all(|w| !w.borrow().base().is_dirty()));

    gui.set_mode(InputMode::Adjust);
    assert!(h[0].borrow().base().is_dirty(), "mode change marks the focus holder");
    assert!(!h[1].borrow().base().is_dirty());
}

#[test]
fn precision_needs_a_capable_widget() {
    let (_panel, gui) = gui();
    gui.open(ScreenBuilder::new(|gui| {
        PushButton::new(gui, Geometry::new(10, 10, 12, 40), "Go", |_| {})?;
        Ok(())
    }))
    .unwrap();
    assert!(!gui.enter_precision());
    assert_eq!(gui.mode(), InputMode::Normal);
}

#[test]
fn precision_is_dropped_when_focus_moves() {
    let (_panel, gui) = gui();
    let (screen, _) = sliders(2, 0.5);
    gui.open(screen).unwrap();
    gui.set_mode(InputMode::Adjust);
    assert!(gui.enter_precision());
    assert_eq!(gui.mode(), InputMode::Precision);

    gui.move_focus(Direction::Next).unwrap();
    assert_eq!(gui.mode(), InputMode::Adjust);
}

#[tokio::test]
async fn encoder_rotation_moves_then_adjusts() {
    let (_panel, gui) = gui_with(GuiConfig::new().encoder_ratio(2));
    let (screen, handles) = sliders(3, 0.5);
    gui.open(screen).unwrap();
    let h = handles.borrow().clone();
    let input = MockInput::new();
    let mut engine = InputEngine::new(gui.clone(), Rig::Encoder);

    feed(&mut engine, &input, InputEvent::RotaryIncrement(1), 0).await;
    assert!(h[0].has_focus(), "half a step does nothing yet");
    feed(&mut engine, &input, InputEvent::RotaryIncrement(3), 10).await;
    assert!(h[2].has_focus());

    // Double click the push button: ADJUST.
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Select), 100).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Select), 150).await;
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Select), 250).await;
    assert_eq!(gui.mode(), InputMode::Adjust);

    feed(&mut engine, &input, InputEvent::RotaryIncrement(6), 1000).await;
    assert!(approx(h[2].value().as_f32().unwrap(), 0.53));

    // Press while adjusting: precision, ten times finer.
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Select), 2000).await;
    assert_eq!(gui.mode(), InputMode::Precision);
    feed(&mut engine, &input, InputEvent::RotaryIncrement(-2), 2100).await;
    assert!(approx(h[2].value().as_f32().unwrap(), 0.529));
}

#[tokio::test]
async fn encoder_select_in_normal_mode_fires_the_button() {
    let (_panel, gui) = gui();
    let pressed = Rc::new(Cell::new(0));
    {
        let pressed = pressed.clone();
        gui.open(ScreenBuilder::new(move |gui| {
            PushButton::new(gui, Geometry::new(10, 10, 12, 40), "Go", move |_| {
                pressed.set(pressed.get() + 1);
            })?;
            Ok(())
        }))
        .unwrap();
    }
    let input = MockInput::new();
    let mut engine = InputEngine::new(gui.clone(), Rig::Encoder);
    feed(&mut engine, &input, InputEvent::ButtonPress(Button::Select), 0).await;
    feed(&mut engine, &input, InputEvent::ButtonRelease(Button::Select), 50).await;
    assert_eq!(pressed.get(), 1);
}

#[tokio::test]
async fn released_button_adjusts_exactly_once() {
    let (_panel, gui) = gui();
    let (screen, handles) = sliders(1, 0.2);
    gui.open(screen).unwrap();
    let slider = handles.borrow()[0].clone();
    let fired = Rc::new(Cell::new(0));
    let count = fired.clone();
    slider.on_change(move |_| count.set(count.get() + 1));

    let input = MockInput::new();
    let engine = InputEngine::new(gui.clone(), Rig::FIVE_BUTTON);
    engine
        .apply(
            Operation::Adjust {
                control: Some(Button::Increase),
                delta: 1,
            },
            &input,
        )
        .await
        .unwrap();
    assert!(approx(slider.value().as_f32().unwrap(), 0.21));
    assert_eq!(fired.get(), 1);
}

#[tokio::test]
async fn holding_a_button_accelerates_up_to_the_cap() {
    // Zero period: every poll of the held button doubles the step.
    let (_panel, gui) = gui_with(GuiConfig::new().hold_accel_ms(0));
    let (screen, handles) = sliders(1, 0.2);
    gui.open(screen).unwrap();
    let slider = handles.borrow()[0].clone();

    let polls = Cell::new(0);
    let held = || {
        polls.set(polls.get() + 1);
        polls.get() <= 3
    };
    gui.adjust(1, Some(&held)).await.unwrap();

    // 0.01, then 0.02, 0.04 and the 4× cap again.
    assert!(approx(slider.value().as_f32().unwrap(), 0.2 + 0.01 + 0.02 + 0.04 + 0.04));
    assert_eq!(polls.get(), 4);
}

#[tokio::test]
async fn holding_in_precision_uses_the_fine_step() {
    let (_panel, gui) = gui_with(GuiConfig::new().hold_accel_ms(0));
    let (screen, handles) = sliders(1, 0.5);
    gui.open(screen).unwrap();
    let slider = handles.borrow()[0].clone();
    assert!(gui.enter_precision());

    let polls = Cell::new(0);
    let held = || {
        polls.set(polls.get() + 1);
        polls.get() <= 1
    };
    gui.adjust(-1, Some(&held)).await.unwrap();
    assert!(approx(slider.value().as_f32().unwrap(), 0.5 - 0.001 - 0.002));
}

#[tokio::test]
async fn adjusting_a_button_moves_focus_to_the_ends() {
    let (_panel, gui) = gui();
    let pressed = Rc::new(Cell::new(0));
    let slot: Rc<RefCell<Vec<WidgetRef>>> = Rc::default();
    {
        let (pressed, out) = (pressed.clone(), slot.clone());
        gui.open(ScreenBuilder::new(move |gui| {
            let top = Slider::new(gui, Geometry::new(2, 4, 4, 60), 0.5)?;
            let go = PushButton::new(gui, Geometry::new(14, 4, 12, 40), "Go", move |_| {
                pressed.set(pressed.get() + 1);
            })?;
            let bottom = Slider::new(gui, Geometry::new(34, 4, 4, 60), 0.5)?;
            out.borrow_mut()
                .extend([top.as_dyn(), go.as_dyn(), bottom.as_dyn()]);
            Ok(())
        }))
        .unwrap();
    }
    let w = slot.borrow().clone();

    assert!(gui.move_to(&w[1]).unwrap());
    gui.adjust(1, None).await.unwrap();
    assert!(w[0].borrow().base().has_focus(), "increase on a button focuses the first widget");

    assert!(gui.move_to(&w[1]).unwrap());
    gui.adjust(-1, None).await.unwrap();
    assert!(w[2].borrow().base().has_focus(), "decrease on a button focuses the last widget");

    // Focus moved; nothing fired and nothing was adjusted.
    assert_eq!(pressed.get(), 0);
    assert_eq!(w[0].borrow().base().value(), Value::Float(0.5));
    assert_eq!(w[2].borrow().base().value(), Value::Float(0.5));
}

#[tokio::test]
async fn held_increase_on_a_button_moves_focus_once() {
    let (_panel, gui) = gui();
    let slot: Rc<RefCell<Vec<WidgetRef>>> = Rc::default();
    {
        let out = slot.clone();
        gui.open(ScreenBuilder::new(move |gui| {
            let top = Slider::new(gui, Geometry::new(2, 4, 4, 60), 0.5)?;
            let go = PushButton::new(gui, Geometry::new(14, 4, 12, 40), "Go", |_| {})?;
            out.borrow_mut().extend([top.as_dyn(), go.as_dyn()]);
            Ok(())
        }))
        .unwrap();
    }
    let w = slot.borrow().clone();
    assert!(gui.move_to(&w[1]).unwrap());

    let mut input = MockInput::new();
    input.set_held(Button::Increase, true);
    let engine = InputEngine::new(gui.clone(), Rig::FIVE_BUTTON);
    engine
        .apply(
            Operation::Adjust {
                control: Some(Button::Increase),
                delta: 1,
            },
            &input,
        )
        .await
        .unwrap();
    assert!(w[0].borrow().base().has_focus());
    assert_eq!(w[0].borrow().base().value(), Value::Float(0.5));
}

#[tokio::test]
async fn input_task_runs_until_shutdown() {
    let (_panel, gui) = gui_with(GuiConfig::new().long_press_ms(30));
    let (screen, handles) = sliders(2, 0.5);
    gui.open(screen).unwrap();
    let second = handles.borrow()[1].clone();

    let mut input = MockInput::new();
    input.add_event(InputEvent::ButtonPress(Button::Next)).unwrap();
    let mut engine = InputEngine::new(gui.clone(), Rig::FIVE_BUTTON);

    let stopper = async {
        while !second.has_focus() {
            embassy_futures::yield_now().await;
        }
        gui.shutdown();
    };
    let run = engine.run(&mut input);
    let (result, ()) = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        embassy_futures::join::join(run, stopper),
    )
    .await
    .expect("input task stopped");
    result.unwrap();
    assert!(gui.is_shut_down());
}
