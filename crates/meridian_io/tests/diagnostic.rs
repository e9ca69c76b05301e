//! Integration tests for node ids and graph rendering.


use meridian_io::prelude::*;
use test_utils::runtime;

#[test]
fn ids_follow_the_runtime_sequence() {
    let (_pool, io) = runtime();
    let ids: Vec<String> = (0..34)
        .map(|_| io.sync_io(|x: u32| x).id().to_string())
        .collect();

    assert_eq!(ids[0], "io-0");
    assert_eq!(ids[10], "io-a");
    assert_eq!(ids[31], "io-v");
    assert_eq!(ids[32], "io-10");
}

#[test]
fn runtimes_number_nodes_independently() {
    let (_pool_a, a) = runtime();
    let (_pool_b, b) = runtime();
    let _ = a.sync_io(|x: u32| x);
    let _ = a.sync_io(|x: u32| x);

    assert_eq!(b.sync_io(|x: u32| x).id(), "io-0");
    assert_eq!(a.sync_io(|x: u32| x).id(), "io-2");
}

#[test]
fn pipe_composites_have_their_own_ids() {
    let (_pool, io) = runtime();
    let first = io.sync_io(|x: u32| x);
    let last = io.sync_io(|x: u32| x);
    let chain = first.then(&last);
    assert_eq!(chain.id(), "io-pipe-2");
}

#[test]
fn render_lists_node_subscribers() {
    let (_pool, io) = runtime();
    let a = io.sync_io(|x: u32| x + 1);
    let b = io.sync_io(|x: u32| x + 1);
    let c = io.sync_io(|x: u32| x + 1);
    a.pipe(b.clone());
    a.pipe(c.clone());
    a.success(1);

    assert_eq!(
        a.render_diagnostic(),
        " · IO: io-0 (success)\n   · IO: io-1 (success)\n   · IO: io-2 (success)\n"
    );
}

#[test]
fn render_skips_dropped_subscribers() {
    let (_pool, io) = runtime();
    let a = io.sync_io(|x: u32| x);
    let kept = io.sync_io(|x: u32| x);
    a.pipe(kept.clone());
    a.pipe(io.sync_io(|x: u32| x));
    a.success(1);

    assert_eq!(
        a.render_diagnostic(),
        " · IO: io-0 (success)\n   · IO: io-1 (success)\n"
    );
}

#[test]
fn render_of_pipe_starts_at_its_first_node() {
    let (_pool, io) = runtime();
    let first = io.sync_io(|x: u32| x);
    let last = io.try_sync_io(|_: u32| Err::<u32, _>("no"));
    let chain = first.then(&last);
    chain.success(1);

    assert_eq!(
        render_diagnostic(&chain),
        " · IO: io-pipe-2 (pipe)\n   · IO: io-0 (success)\n     · IO: io-1 (failure)\n"
    );
}

#[test]
fn callback_subscribers_are_not_rendered() {
    let (_pool, io) = runtime();
    let node = io.sync_io(|x: u32| x);
    node.on_success(|_| {});
    assert_eq!(node.render_diagnostic(), " · IO: io-0 (pending)\n");
}

#[test]
fn deep_graphs_are_elided() {
    let (_pool, io) = runtime();
    let head = io.sync_io(|x: u32| x);
    let mut tail = head.clone();
    for _ in 0..100 {
        let next = io.sync_io(|x: u32| x);
        tail.pipe(next.clone());
        tail = next;
    }

    let rendered = head.render_diagnostic();
    assert_eq!(rendered.lines().count(), meridian_io::diagnostic::MAX_DEPTH + 2);
    assert!(rendered.trim_end().ends_with("· ..."));
}
