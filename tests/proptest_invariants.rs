//! Property tests: mount/unmount symmetry and branch exclusivity.

mod common;

use common::{setup, text, texts};
use proptest::prelude::*;
use spark_components::live_observer_count;
use spark_components::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────────

fn expected_switch(key: u8) -> &'static str {
    match key {
        0 => "zero",
        1 => "one",
        _ => "other",
    }
}

fn switch_tree(key: &Value<u8>) -> Switch<u8, MemoryHost> {
    Switch::new(key)
        .case(0, || text("zero"))
        .case(1, || text("one"))
        .default(|| text("other"))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. If: exactly one branch, always between its siblings
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn if_branch_exclusive(steps in proptest::collection::vec(any::<bool>(), 1..=40)) {
        let (host, container) = setup();
        let baseline = live_observer_count();
        let cond = Value::external(true);
        let tree = List::new()
            .child(text("left"))
            .child(If::new(&cond).then(|| text("yes")).otherwise(|| text("no")))
            .child(text("right"));
        let mut root = Root::with_scheduler(host.clone(), Scheduler::new(), tree);
        root.mount(container).expect("mount");

        for flag in steps {
            cond.set(flag);
            root.tick();
            let expected = if flag { "yes" } else { "no" };
            prop_assert_eq!(texts(&host), vec!["left", expected, "right"]);
            prop_assert_eq!(host.borrow().live_count(), 3);
        }

        root.unmount().expect("unmount");
        prop_assert_eq!(host.borrow().live_count(), 0);
        prop_assert_eq!(live_observer_count(), baseline);
        prop_assert_eq!(cond.observer_count(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Switch: the first matching case, else the default
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn switch_branch_matches_key(keys in proptest::collection::vec(0u8..4, 1..=40)) {
        let (host, container) = setup();
        let key = Value::external(keys[0]);
        let mut root = Root::with_scheduler(host.clone(), Scheduler::new(), switch_tree(&key));
        root.mount(container).expect("mount");
        prop_assert_eq!(texts(&host), vec![expected_switch(keys[0])]);

        for k in keys {
            key.set(k);
            root.tick();
            prop_assert_eq!(texts(&host), vec![expected_switch(k)]);
        }

        root.unmount().expect("unmount");
        prop_assert_eq!(host.borrow().live_count(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Batched changes: only the final value matters after a tick
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn batched_sets_settle_on_last(keys in proptest::collection::vec(0u8..4, 1..=20)) {
        let (host, container) = setup();
        let key = Value::external(9);
        let mut root = Root::with_scheduler(host.clone(), Scheduler::new(), switch_tree(&key));
        root.mount(container).expect("mount");

        for k in &keys {
            key.set(*k);
        }
        root.tick();
        let last = *keys.last().expect("non-empty");
        prop_assert_eq!(texts(&host), vec![expected_switch(last)]);
        prop_assert_eq!(root.scheduler().pending(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Symmetry: any mix of values changed before unmount leaks nothing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mount_unmount_symmetric(flags in proptest::collection::vec(any::<bool>(), 0..=10), depth in 1usize..6) {
        let (host, container) = setup();
        let baseline = live_observer_count();
        let cond = Value::external(false);

        // Each level: a container holding an `If` and the previous level.
        let mut tree: AnyComponent<MemoryHost> = Box::new(text("leaf"));
        for level in 0..depth {
            let label = if level % 2 == 0 { "even" } else { "odd" };
            tree = Box::new(
                Simple::new(move |h: &mut MemoryHost| h.create_container(label))
                    .child(If::new(&cond).then(|| text("shown")).otherwise(|| text("hidden")))
                    .child(tree),
            );
        }
        let mut root = Root::with_scheduler(host.clone(), Scheduler::new(), List::from_iter([tree]));
        root.mount(container).expect("mount");

        for flag in flags {
            cond.set(flag);
            root.tick();
        }

        root.unmount().expect("unmount");
        prop_assert_eq!(host.borrow().live_count(), 0);
        prop_assert_eq!(live_observer_count(), baseline);
    }
}
