//! Tests for RebuildScheduler.

use super::*;
use crate::test_harness::FakeContainer;

fn summary(rows: usize) -> RebuildSummary {
    RebuildSummary {
        rows,
        content_size: Vec2::new(100.0, rows as f32 * 10.0),
        cull: CullReport::default(),
    }
}

fn container() -> FakeContainer {
    FakeContainer::new(Vec2::new(100.0, 100.0))
}

#[test]
fn idle_tick_does_nothing() {
    let mut scheduler = RebuildScheduler::new(true);
    let mut c = container();
    let outcome = scheduler.tick(Some(&mut c), |_, _| unreachable!("nothing was requested"));
    assert_eq!(outcome, TickOutcome::Idle);
    assert_eq!(scheduler.ticks(), 1);
    assert_eq!(c.freezes(), 0);
}

#[test]
fn many_requests_coalesce_into_one_rebuild() {
    let mut scheduler = RebuildScheduler::new(false);
    let mut c = container();

    assert!(scheduler.request_rebuild());
    for _ in 0..4 {
        assert!(!scheduler.request_rebuild());
    }
    assert_eq!(scheduler.coalesced(), 4);
    assert!(scheduler.is_pending());

    let mut runs = 0;
    let outcome = scheduler.tick(Some(&mut c), |_, _| {
        runs += 1;
        summary(3)
    });
    assert_eq!(outcome, TickOutcome::Rebuilt(summary(3)));
    assert_eq!(runs, 1);
    assert!(!scheduler.is_pending());

    let next = scheduler.tick(Some(&mut c), |_, _| unreachable!("already rebuilt"));
    assert_eq!(next, TickOutcome::Idle);
    assert_eq!(scheduler.rebuilds(), 1);
}

#[test]
fn request_is_due_on_the_following_tick() {
    let mut scheduler = RebuildScheduler::new(false);
    let mut c = container();
    scheduler.tick(Some(&mut c), |_, _| summary(0));
    scheduler.request_rebuild();
    assert_eq!(scheduler.queue.front().map(|&(due, _)| due), Some(2));

    let outcome = scheduler.tick(Some(&mut c), |_, _| summary(1));
    assert!(matches!(outcome, TickOutcome::Rebuilt(_)));
}

#[test]
fn rebuild_with_rows_freezes_layout() {
    let mut scheduler = RebuildScheduler::new(true);
    let mut c = container();
    scheduler.request_rebuild();

    scheduler.tick(Some(&mut c), |_, _| summary(4));

    assert_eq!(c.frozen(), Some(Vec2::new(100.0, 40.0)));
    assert_eq!(
        scheduler.layout_state(),
        LayoutState::Frozen {
            size: Vec2::new(100.0, 40.0)
        }
    );
}

#[test]
fn empty_rebuild_does_not_freeze() {
    let mut scheduler = RebuildScheduler::new(true);
    let mut c = container();
    scheduler.request_rebuild();
    scheduler.tick(Some(&mut c), |_, _| summary(0));
    assert_eq!(c.freezes(), 0);
    assert_eq!(scheduler.layout_state(), LayoutState::Live);
}

#[test]
fn freezing_can_be_disabled() {
    let mut scheduler = RebuildScheduler::new(false);
    let mut c = container();
    scheduler.request_rebuild();
    scheduler.tick(Some(&mut c), |_, _| summary(10));
    assert!(c.frozen().is_none());
    assert!(!scheduler.freeze_enabled());
}

#[test]
fn frozen_layout_thaws_and_defers_one_tick() {
    let mut scheduler = RebuildScheduler::new(true);
    let mut c = container();
    scheduler.request_rebuild();
    scheduler.tick(Some(&mut c), |_, _| summary(2));
    assert!(c.frozen().is_some());

    scheduler.request_rebuild();
    let outcome = scheduler.tick(Some(&mut c), |_, _| unreachable!("layout still frozen"));
    assert_eq!(outcome, TickOutcome::Deferred);
    assert_eq!(c.thaws(), 1);
    assert!(c.frozen().is_none());
    assert!(scheduler.is_pending());

    let outcome = scheduler.tick(Some(&mut c), |_, _| summary(2));
    assert!(matches!(outcome, TickOutcome::Rebuilt(_)));
    assert_eq!(c.freezes(), 2);
}

#[test]
fn thaw_only_reports_true_when_frozen() {
    let mut scheduler = RebuildScheduler::new(true);
    let mut c = container();
    assert!(!scheduler.thaw(&mut c));

    scheduler.request_rebuild();
    scheduler.tick(Some(&mut c), |_, _| summary(1));
    assert!(scheduler.thaw(&mut c));
    assert!(!scheduler.thaw(&mut c));
    assert_eq!(c.thaws(), 1);
}

#[test]
fn dead_container_drops_pending_rebuild() {
    let mut scheduler = RebuildScheduler::new(true);
    let mut c = container();
    scheduler.request_rebuild();
    c.destroy();

    let outcome = scheduler.tick(Some(&mut c), |_, _| unreachable!("container is gone"));

    assert_eq!(outcome, TickOutcome::Dropped);
    assert!(!scheduler.is_pending());
    assert_eq!(scheduler.dropped(), 1);
    assert_eq!(
        scheduler.tick(Some(&mut c), |_, _| unreachable!()),
        TickOutcome::Idle
    );
}

#[test]
fn missing_container_drops_pending_rebuild() {
    let mut scheduler = RebuildScheduler::new(true);
    scheduler.request_rebuild();
    let outcome = scheduler.tick(None::<&mut FakeContainer>, |_, _| unreachable!());
    assert_eq!(outcome, TickOutcome::Dropped);
}

#[test]
fn request_from_inside_a_rebuild_runs_on_the_next_tick() {
    let mut scheduler = RebuildScheduler::new(false);
    let mut c = container();
    scheduler.request_rebuild();

    let first = scheduler.tick(Some(&mut c), |_, s| {
        assert!(s.is_in_flight());
        assert!(!s.request_rebuild(), "late request is not scheduled directly");
        summary(1)
    });
    assert!(matches!(first, TickOutcome::Rebuilt(_)));
    assert!(scheduler.is_pending(), "late request was requeued");
    assert!(!scheduler.is_in_flight());
    assert_eq!(scheduler.coalesced(), 0);

    let second = scheduler.tick(Some(&mut c), |_, _| summary(1));
    assert!(matches!(second, TickOutcome::Rebuilt(_)));
    assert_eq!(scheduler.rebuilds(), 2);
    assert!(!scheduler.is_pending());
}

#[test]
fn requeued_rebuild_keeps_layout_live() {
    let mut scheduler = RebuildScheduler::new(true);
    let mut c = container();
    scheduler.request_rebuild();

    scheduler.tick(Some(&mut c), |_, s| {
        s.request_rebuild();
        summary(3)
    });
    assert_eq!(scheduler.layout_state(), LayoutState::Live);
    assert_eq!(c.freezes(), 0);

    let outcome = scheduler.tick(Some(&mut c), |_, _| summary(3));
    assert!(matches!(outcome, TickOutcome::Rebuilt(_)), "no thaw needed first");
    assert_eq!(c.freezes(), 1);
}

#[test]
fn cancel_discards_pending_rebuild() {
    let mut scheduler = RebuildScheduler::new(true);
    let mut c = container();
    scheduler.request_rebuild();
    scheduler.cancel();
    assert!(!scheduler.is_pending());
    assert_eq!(
        scheduler.tick(Some(&mut c), |_, _| unreachable!()),
        TickOutcome::Idle
    );
}

#[test]
fn reset_layout_forgets_frozen_state() {
    let mut scheduler = RebuildScheduler::new(true);
    let mut c = container();
    scheduler.request_rebuild();
    scheduler.tick(Some(&mut c), |_, _| summary(1));
    scheduler.reset_layout();
    assert_eq!(scheduler.layout_state(), LayoutState::Live);
}
