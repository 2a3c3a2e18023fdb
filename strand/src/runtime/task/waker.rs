use crate::runtime::task::Task;

use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// Returns the `RawWakerVTable` for a task with output type `T`.
///
/// The vtable defines how a readiness signal interacts with its task when:
/// - cloning the waker (one more `Arc` reference),
/// - waking the task (reschedule, consuming the reference),
/// - waking by reference (reschedule, keeping the reference),
/// - dropping the waker (one `Arc` reference less).
///
/// # Safety
///
/// Every function here receives a pointer produced by `Arc::into_raw` on an
/// `Arc<Task<T>>` and must keep the strong count balanced.
fn vtable<T: Send + 'static>() -> &'static RawWakerVTable {
    &RawWakerVTable::new(
        clone_raw::<T>,
        wake_raw::<T>,
        wake_by_ref_raw::<T>,
        drop_raw::<T>,
    )
}

/// Creates the readiness signal of a task.
///
/// The waker owns one strong reference to the task cell, which in turn owns
/// the ready queue's producer endpoint. A live waker therefore keeps both the
/// task and the queue alive, and waking it needs nothing but itself.
pub(crate) fn make_waker<T: Send + 'static>(task: Arc<Task<T>>) -> Waker {
    // Safety: the pointer comes from `Arc::into_raw` and the vtable functions
    // below treat it as exactly that.
    unsafe {
        Waker::from_raw(RawWaker::new(
            Arc::into_raw(task) as *const (),
            vtable::<T>(),
        ))
    }
}

/// Clones the raw waker by incrementing the task's reference count.
unsafe fn clone_raw<T: Send + 'static>(ptr: *const ()) -> RawWaker {
    // Safety: `ptr` is a live `Arc<Task<T>>` owned by the waker being cloned.
    unsafe { Arc::<Task<T>>::increment_strong_count(ptr as *const Task<T>) };

    RawWaker::new(ptr, vtable::<T>())
}

/// Wakes the task and consumes the waker's reference.
unsafe fn wake_raw<T: Send + 'static>(ptr: *const ()) {
    // Safety: ownership of the reference is transferred to us.
    let task = unsafe { Arc::<Task<T>>::from_raw(ptr as *const Task<T>) };
    task.wake_by_ref();
}

/// Wakes the task without consuming the waker's reference.
unsafe fn wake_by_ref_raw<T: Send + 'static>(ptr: *const ()) {
    // Safety: the reference stays owned by the waker, hence `ManuallyDrop`.
    let task = ManuallyDrop::new(unsafe { Arc::<Task<T>>::from_raw(ptr as *const Task<T>) });
    task.wake_by_ref();
}

/// Drops the raw waker, releasing its reference to the task.
unsafe fn drop_raw<T: Send + 'static>(ptr: *const ()) {
    // Safety: the waker owned exactly this one reference.
    drop(unsafe { Arc::<Task<T>>::from_raw(ptr as *const Task<T>) });
}
