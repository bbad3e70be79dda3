//! BDD step definitions for the history buffer feature

use cucumber::{given, then, when};

use api_monitor::history::HistoryBuffer;

use crate::world::ApiMonitorWorld;

#[given(expr = "a history buffer with capacity {int}")]
fn history_buffer(world: &mut ApiMonitorWorld, capacity: usize) {
    world.buffer = Some(HistoryBuffer::new(capacity));
}

#[when(expr = "the values {int} through {int} are pushed")]
fn push_values(world: &mut ApiMonitorWorld, first: u32, last: u32) {
    let buffer = world.buffer.as_mut().expect("buffer not set");
    for value in first..=last {
        buffer.push(value);
    }
}

#[then(expr = "the buffer should contain {string}")]
fn buffer_contains(world: &mut ApiMonitorWorld, expected: String) {
    let buffer = world.buffer.as_ref().expect("buffer not set");
    let expected: Vec<u32> = if expected.is_empty() {
        Vec::new()
    } else {
        expected
            .split(',')
            .map(|v| v.trim().parse().expect("not a number"))
            .collect()
    };
    assert_eq!(buffer.snapshot(), expected);
}

#[then(expr = "the buffer should hold {int} items")]
fn buffer_len(world: &mut ApiMonitorWorld, expected: usize) {
    let buffer = world.buffer.as_ref().expect("buffer not set");
    assert_eq!(buffer.len(), expected);
    assert!(buffer.len() <= buffer.capacity());
}
