//! Integration tests for portal relocation.
//!
//! These drive the registry, slots, host and activation guards together
//! against a shared tree, the way a page tree would.
//!
//! # Test Organization
//!
//! - `relocation` - payload moves between slot targets without being rebuilt
//! - `isolation` - portal ids never observe each other
//! - `fallback` - activation guards and page lifecycles
//! - `unregister_safety` - stale and unknown unregisters
//! - `reset` - reset completeness
//! - `host_options` - container tag and attributes

mod common;

use common::{NotificationCounter, TestEnv, MAIN, MINI, VIDEO};
use portal::{
    create_portal, ActivationState, HostOptions, PortalConfig, PortalRegistry, SlotAttrs,
};
use pretty_assertions::assert_eq as pretty_eq;

// ============================================================================
// Relocation
// ============================================================================

mod relocation {
    use super::*;

    #[test]
    fn test_concrete_main_then_mini() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let host = video.host().unwrap();
        let payload = env.render_payload(&host);

        let t1 = env.element();
        video.register_target(MAIN, t1).unwrap();
        video.set_active_slot(Some(MAIN)).unwrap();
        assert!(env.contains(t1, payload));

        let t2 = env.element();
        video.register_target(MINI, t2).unwrap();
        video.set_active_slot(Some(MINI)).unwrap();
        assert!(env.contains(t2, payload));
        assert!(!env.contains(t1, payload));
    }

    #[test]
    fn test_move_keeps_payload_identity() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let page = env.page();
        let host = video.host().unwrap();
        let payload = env.render_payload(&host);
        let main = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        let mini = video.slot(MINI, page, SlotAttrs::new()).unwrap();
        let destroyed_before = env.destroyed();

        video.set_active_slot(Some(MAIN)).unwrap();
        pretty_eq!(host.target(), Some(main.node()));
        video.set_active_slot(Some(MINI)).unwrap();
        pretty_eq!(host.target(), Some(mini.node()));
        video.set_active_slot(Some(MAIN)).unwrap();
        pretty_eq!(host.target(), Some(main.node()));

        assert!(env.is_alive(payload));
        pretty_eq!(env.parent(payload), Some(host.container()));
        pretty_eq!(env.destroyed(), destroyed_before);
    }

    #[test]
    fn test_slot_selected_before_it_mounts() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let host = video.host().unwrap();

        video.set_active_slot(Some(MAIN)).unwrap();
        assert!(host.is_suspended());

        let page = env.page();
        let main = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        pretty_eq!(host.target(), Some(main.node()));
    }

    #[test]
    fn test_host_mounted_after_slot_renders_immediately() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let page = env.page();
        let main = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        video.set_active_slot(Some(MAIN)).unwrap();

        let host = video.host().unwrap();
        pretty_eq!(host.target(), Some(main.node()));
    }

    #[test]
    fn test_unmounting_active_slot_suspends_payload() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let page = env.page();
        let host = video.host().unwrap();
        let payload = env.render_payload(&host);
        let main = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        video.set_active_slot(Some(MAIN)).unwrap();

        drop(main);

        assert!(host.is_suspended());
        assert!(env.is_alive(payload));
        pretty_eq!(video.state().active_slot(), Some(MAIN));
    }

    #[test]
    fn test_page_removed_before_slot_drop_rescues_payload() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let page = env.page();
        let host = video.host().unwrap();
        let payload = env.render_payload(&host);
        let main = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        video.set_active_slot(Some(MAIN)).unwrap();

        // Tear the page subtree down while the slot still thinks it is mounted.
        env.tree.lock().remove(page);
        assert!(env.is_alive(host.container()));
        assert!(env.is_alive(payload));

        drop(main);
        assert!(host.is_suspended());
    }

    #[test]
    fn test_dropping_host_destroys_container() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let host = video.host().unwrap();
        let container = host.container();
        let payload = env.render_payload(&host);

        drop(host);

        assert!(!env.is_alive(container));
        assert!(!env.is_alive(payload));
        pretty_eq!(env.registry.listener_count(VIDEO), 0);
    }

    #[test]
    fn test_host_with_renders_static_content() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let host = video
            .host_with(|tree, container| {
                let text = tree.create_text("now playing");
                tree.append_child(container, text)
            })
            .unwrap();

        pretty_eq!(env.tree.lock().text_content(host.container()), "now playing");
    }
}

// ============================================================================
// Isolation
// ============================================================================

mod isolation {
    use super::*;
    use proptest::prelude::*;
    use render_tree::{NodeId, Tree};

    #[test]
    fn test_two_portals_do_not_interfere() {
        let registry = PortalRegistry::new();
        let mut tree = Tree::new();
        let target = tree.create_element("div");
        let b_calls = NotificationCounter::new(&registry, "b");

        registry.register_target("a", MAIN, target);
        registry.set_active_slot("a", Some(MAIN));

        let b = registry.get_or_create("b");
        assert!(b.targets().is_empty());
        pretty_eq!(b.active_slot(), None);
        pretty_eq!(b_calls.count(), 0);
    }

    #[test]
    fn test_hosts_follow_their_own_portal() {
        let env = TestEnv::new();
        let slots = [MAIN, MINI];
        let a = create_portal(&env.registry, &env.tree, PortalConfig::new("a", slots)).unwrap();
        let b = create_portal(&env.registry, &env.tree, PortalConfig::new("b", slots)).unwrap();
        let page = env.page();
        let host_a = a.host().unwrap();
        let host_b = b.host().unwrap();
        let slot_a = a.slot(MAIN, page, SlotAttrs::new()).unwrap();
        let slot_b = b.slot(MAIN, page, SlotAttrs::new()).unwrap();

        a.set_active_slot(Some(MAIN)).unwrap();
        pretty_eq!(host_a.target(), Some(slot_a.node()));
        assert!(host_b.is_suspended());

        b.set_active_slot(Some(MAIN)).unwrap();
        pretty_eq!(host_a.target(), Some(slot_a.node()));
        pretty_eq!(host_b.target(), Some(slot_b.node()));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Register { slot: usize, node: usize },
        Unregister { slot: usize },
        Activate { slot: usize },
        Deactivate,
        ReturnPath { path: usize },
        Reset,
    }

    const SLOTS: [&str; 3] = ["main", "mini", "pip"];
    const NODES: usize = 4;

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..SLOTS.len(), 0..NODES).prop_map(|(slot, node)| Op::Register { slot, node }),
            (0..SLOTS.len()).prop_map(|slot| Op::Unregister { slot }),
            (0..SLOTS.len()).prop_map(|slot| Op::Activate { slot }),
            Just(Op::Deactivate),
            (0..3usize).prop_map(|path| Op::ReturnPath { path }),
            Just(Op::Reset),
        ]
    }

    fn apply(registry: &PortalRegistry, id: &str, op: &Op, nodes: &[NodeId]) {
        match op {
            Op::Register { slot, node } => registry.register_target(id, SLOTS[*slot], nodes[*node]),
            Op::Unregister { slot } => registry.unregister_target(id, SLOTS[*slot]),
            Op::Activate { slot } => {
                registry.set_active_slot(id, Some(SLOTS[*slot]));
            }
            Op::Deactivate => {
                registry.set_active_slot(id, None);
            }
            Op::ReturnPath { path } => {
                registry.set_return_path(id, Some(&format!("/video/{}", path)));
            }
            Op::Reset => registry.reset(id),
        }
    }

    proptest! {
        /// Interleaving operations on `a` never changes what `b` observes.
        #[test]
        fn prop_interleaved_portals_match_isolated_run(
            ops in prop::collection::vec((any::<bool>(), op()), 0..40)
        ) {
            let mut tree = Tree::new();
            let nodes: Vec<NodeId> = (0..NODES).map(|_| tree.create_element("div")).collect();

            let shared = PortalRegistry::new();
            let alone = PortalRegistry::new();
            for id in ["a", "b"] {
                shared.get_or_create(id);
            }
            alone.get_or_create("b");
            let shared_b = NotificationCounter::new(&shared, "b");
            let alone_b = NotificationCounter::new(&alone, "b");

            for (on_a, op) in &ops {
                if *on_a {
                    apply(&shared, "a", op, &nodes);
                } else {
                    apply(&shared, "b", op, &nodes);
                    apply(&alone, "b", op, &nodes);
                }
            }

            prop_assert_eq!(shared.get_or_create("b"), alone.get_or_create("b"));
            prop_assert_eq!(shared_b.count(), alone_b.count());
        }
    }
}

// ============================================================================
// Fallback
// ============================================================================

mod fallback {
    use super::*;

    #[test]
    fn test_leaving_page_falls_back_to_mini() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let root = env.tree.lock().root();
        let host = video.host().unwrap();
        let mini = video.slot(MINI, root, SlotAttrs::new()).unwrap();

        let page = env.page();
        let main = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        let guard = video.activate(MAIN, Some("/video/1")).unwrap();
        pretty_eq!(host.target(), Some(main.node()));

        drop(guard);
        drop(main);
        env.tree.lock().remove(page);

        let state = video.state();
        pretty_eq!(state.activation_state(), ActivationState::ActiveAt(MINI.into()));
        pretty_eq!(state.return_path(), Some("/video/1"));
        pretty_eq!(host.target(), Some(mini.node()));
    }

    #[test]
    fn test_slot_dropped_before_guard_still_lands_in_mini() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let root = env.tree.lock().root();
        let host = video.host().unwrap();
        let payload = env.render_payload(&host);
        let mini = video.slot(MINI, root, SlotAttrs::new()).unwrap();
        let page = env.page();
        let main = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        let guard = video.activate(MAIN, None).unwrap();
        let destroyed_before = env.destroyed();

        drop(main);
        drop(guard);

        pretty_eq!(host.target(), Some(mini.node()));
        assert!(env.is_alive(payload));
        // Only the main slot element went away.
        pretty_eq!(env.destroyed(), destroyed_before + 1);
    }

    #[test]
    fn test_navigating_between_pages_keeps_newer_activation() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let host = video.host().unwrap();

        let first_page = env.page();
        let first_slot = video.slot(MAIN, first_page, SlotAttrs::new()).unwrap();
        let first_guard = video.activate(MAIN, Some("/video/1")).unwrap();

        // The next page mounts before the previous one unmounts.
        let second_page = env.page();
        let second_slot = video.slot(MAIN, second_page, SlotAttrs::new()).unwrap();
        let second_guard = video.activate(MAIN, Some("/video/2")).unwrap();

        drop(first_guard);
        drop(first_slot);

        let state = video.state();
        pretty_eq!(state.active_slot(), Some(MAIN));
        pretty_eq!(state.return_path(), Some("/video/2"));
        pretty_eq!(state.target(MAIN), Some(second_slot.node()));
        pretty_eq!(host.target(), Some(second_slot.node()));
        assert!(second_guard.is_current());
    }

    #[test]
    fn test_reselecting_active_slot_keeps_guard_current() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let root = env.tree.lock().root();
        let host = video.host().unwrap();
        let mini = video.slot(MINI, root, SlotAttrs::new()).unwrap();
        let page = env.page();
        let main = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        let guard = video.activate(MAIN, Some("/video/1")).unwrap();

        video.set_active_slot(Some(MAIN)).unwrap();
        assert!(guard.is_current());

        drop(guard);
        drop(main);

        pretty_eq!(video.state().active_slot(), Some(MINI));
        pretty_eq!(host.target(), Some(mini.node()));
        assert!(!host.is_suspended());
    }

    #[test]
    fn test_reset_beats_pending_guard() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let guard = video.activate(MAIN, Some("/video/1")).unwrap();

        video.reset();
        drop(guard);

        assert!(video.state().is_empty());
    }

    #[test]
    fn test_portal_without_fallback_stays_put() {
        let env = TestEnv::new();
        let portal =
            create_portal(&env.registry, &env.tree, PortalConfig::new("plain", [MAIN])).unwrap();

        drop(portal.activate(MAIN, None).unwrap());

        pretty_eq!(portal.state().active_slot(), Some(MAIN));
    }
}

// ============================================================================
// Unregister Safety
// ============================================================================

mod unregister_safety {
    use super::*;

    #[test]
    fn test_unknown_portal_and_slot_are_no_ops() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let target = env.element();
        video.register_target(MAIN, target).unwrap();
        let before = video.state();

        env.registry.unregister_target("nope", MAIN);
        env.registry.unregister_target(VIDEO, "pip");
        env.registry.unregister_target_if(VIDEO, MINI, target);
        env.registry.reset("nope");

        pretty_eq!(video.state(), before);
        assert!(env.registry.get("nope").is_none());
    }

    #[test]
    fn test_stale_unmount_keeps_remounted_slot() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let host = video.host().unwrap();
        let page = env.page();
        video.set_active_slot(Some(MAIN)).unwrap();

        let old = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        let new = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        pretty_eq!(host.target(), Some(new.node()));
        assert!(!old.is_registered());

        drop(old);

        assert!(new.is_registered());
        pretty_eq!(video.state().target(MAIN), Some(new.node()));
        pretty_eq!(host.target(), Some(new.node()));
    }

    #[test]
    fn test_unconditional_unregister_removes_whatever_is_there() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let page = env.page();
        let slot = video.slot(MAIN, page, SlotAttrs::new()).unwrap();

        video.unregister_target(MAIN);

        assert!(!slot.is_registered());
        pretty_eq!(video.state().target(MAIN), None);
    }
}

// ============================================================================
// Reset
// ============================================================================

mod reset {
    use super::*;

    #[test]
    fn test_reset_clears_everything() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let page = env.page();
        let host = video.host().unwrap();
        let _main = video.slot(MAIN, page, SlotAttrs::new()).unwrap();
        let _mini = video.slot(MINI, page, SlotAttrs::new()).unwrap();
        video.activate(MAIN, Some("/video/3")).unwrap().keep();

        video.reset();

        let state = video.state();
        assert!(state.targets().is_empty());
        pretty_eq!(state.active_slot(), None);
        pretty_eq!(state.return_path(), None);
        assert!(host.is_suspended());
    }

    #[test]
    fn test_reset_notifies_once_and_only_when_needed() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let calls = NotificationCounter::new(&env.registry, VIDEO);

        video.reset();
        pretty_eq!(calls.count(), 0);

        video.set_return_path(Some("/"));
        video.reset();
        pretty_eq!(calls.count(), 2);
    }
}

// ============================================================================
// Host Options
// ============================================================================

mod host_options {
    use super::*;
    use portal::Host;
    use settings::constants::portal::{HOST_ATTRIBUTE, SLOT_KEY_ATTRIBUTE};

    #[test]
    fn test_container_tag_from_config() {
        let env = TestEnv::new();
        let video = create_portal(
            &env.registry,
            &env.tree,
            PortalConfig::new(VIDEO, [MAIN]).with_container_tag("section"),
        )
        .unwrap();
        let host = video.host().unwrap();

        let tree = env.tree.lock();
        pretty_eq!(tree.tag(host.container()), Some("section"));
        pretty_eq!(tree.attribute(host.container(), HOST_ATTRIBUTE), Some(VIDEO));
    }

    #[test]
    fn test_default_container_is_div() {
        let env = TestEnv::new();
        let host =
            Host::mount(&env.registry, &env.tree, VIDEO, HostOptions::default()).unwrap();
        pretty_eq!(env.tree.lock().tag(host.container()), Some("div"));
    }

    #[test]
    fn test_slot_element_carries_attributes() {
        let env = TestEnv::new();
        let video = env.video_portal();
        let page = env.page();
        let slot = video
            .slot(
                MINI,
                page,
                SlotAttrs::new().tag("aside").class("mini-player").attr("data-x", "1"),
            )
            .unwrap();

        let tree = env.tree.lock();
        pretty_eq!(tree.tag(slot.node()), Some("aside"));
        pretty_eq!(tree.attribute(slot.node(), "class"), Some("mini-player"));
        pretty_eq!(tree.attribute(slot.node(), "data-x"), Some("1"));
        pretty_eq!(tree.attribute(slot.node(), SLOT_KEY_ATTRIBUTE), Some(MINI));
        pretty_eq!(tree.parent(slot.node()), Some(page));
    }
}
