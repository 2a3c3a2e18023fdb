use strand::future::{Fuse, fuse};
use strand::time::{self, sleep};
use strand::{join, select};

use anyhow::Context;
use std::future;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[strand::test]
async fn join_single_future() {
    let a = join!(async { 42 });

    assert_eq!(a, 42);
}

#[strand::test]
async fn join_keeps_argument_order() {
    let (a, b, c) = join!(
        async {
            sleep(Duration::from_millis(20)).await;
            "hello"
        },
        async { 42 },
        async {
            strand::yield_now().await;
            true
        }
    );

    assert_eq!((a, b, c), ("hello", 42, true));
}

#[strand::test]
async fn join_runs_every_branch() {
    let counter = Arc::new(AtomicUsize::new(0));

    let (c1, c2, c3) = (counter.clone(), counter.clone(), counter.clone());
    join!(
        async move {
            c1.fetch_add(1, Ordering::SeqCst);
        },
        async move {
            c2.fetch_add(10, Ordering::SeqCst);
        },
        async move {
            c3.fetch_add(100, Ordering::SeqCst);
        }
    );

    assert_eq!(counter.load(Ordering::SeqCst), 111);
}

#[strand::test]
async fn select_takes_the_first_ready_branch() {
    let winner = select! {
        async {
            sleep(Duration::from_millis(200)).await;
            "slow"
        } => |v| format!("first: {v}"),
        async { "fast" } => |v| format!("second: {v}"),
    };

    assert_eq!(winner, "second: fast");
}

#[strand::test]
async fn select_prefers_earlier_branches_on_ties() {
    let winner = select! {
        async { 1 } => |v| v,
        async { 2 } => |v| v * 10,
    };

    assert_eq!(winner, 1);
}

#[strand::test]
async fn select_loop_ends_once_every_branch_completed() {
    let mut a = fuse(future::ready(4));
    let mut b = fuse(future::ready(6));
    let mut total = 0;
    let mut rounds = 0;

    loop {
        rounds += 1;
        select! {
            &mut a => |v: i32| total += v,
            &mut b => |v: i32| total += v,
            complete => break,
            default => unreachable!("every branch is ready or terminated"),
        };
    }

    assert_eq!(total, 10);
    assert_eq!(rounds, 3);
}

#[strand::test]
async fn select_default_when_nothing_is_ready() {
    let (event, trigger) = time::event();
    let mut event = fuse(event);

    let first = select! {
        &mut event => |()| "fired",
        default => "nothing ready",
    };
    assert_eq!(first, "nothing ready");

    trigger.fire();
    let second = select! {
        &mut event => |()| "fired",
        default => "nothing ready",
    };
    assert_eq!(second, "fired");
}

#[strand::test]
async fn select_restarts_a_terminated_slot() {
    let mut slot = pin!(Fuse::<future::Ready<i32>>::terminated());
    let mut ticks = fuse(future::ready(()));
    let mut seen = Vec::new();

    loop {
        select! {
            &mut ticks => |()| slot.set(fuse(future::ready(7))),
            slot.as_mut() => |v: i32| seen.push(v),
            complete => break,
        };
    }

    assert_eq!(seen, [7]);
}

#[strand::test(name = "named")]
async fn test_accepts_a_runtime_name() {
    let handle = strand::spawn(async { "spawned" });

    assert_eq!(handle.await.expect("task failed"), "spawned");
}

#[strand::test]
async fn test_can_return_a_result() -> anyhow::Result<()> {
    let value = strand::spawn(async { 6 * 7 })
        .await
        .context("task failed")?;

    anyhow::ensure!(value == 42, "unexpected value {value}");
    Ok(())
}
