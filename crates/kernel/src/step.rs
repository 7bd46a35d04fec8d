//! The world step: input dispatch, logic, entity pass and repaint.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tileworld_common::EntityId;
use tileworld_input::{KeyEvent, KeyPhase, PointerEvent, WindowEvent};
use tracing::warn;

use crate::context::EntityCtx;
use crate::entity::Behavior;
use crate::frame::{Drawable, Frame};
use crate::logic::WorldLogic;
use crate::world::World;

impl World {
    /// Advance one step.
    ///
    /// Order: pending input (keys, pointers, window events), the world logic
    /// tick, one tick per entity, then a repaint. Entities added during the
    /// pass are first ticked on the next step; entities removed during it are
    /// skipped if not yet reached.
    pub fn step(&mut self) {
        self.tick += 1;
        let _span = tracing::debug_span!("world_step", world = %self.id(), tick = self.tick).entered();
        self.drain_input();
        self.run_logic("tick", |logic, world| logic.tick(world));
        self.tick_entities();
        self.repaint();
    }

    fn tick_entities(&mut self) {
        self.arena.begin_pass();
        let count = self.arena.order_len();
        for position in 0..count {
            let Some(id) = self.arena.order_at(position) else {
                break;
            };
            self.run_behavior(id, "tick", |behavior, ctx| behavior.tick(ctx));
        }
        self.arena.end_pass();
    }

    fn drain_input(&mut self) {
        let Some(bridge) = self.input.clone() else {
            return;
        };
        for event in bridge.drain_key_events() {
            self.dispatch_key(&event);
        }
        for event in bridge.drain_pointer_events() {
            self.dispatch_pointer(&event);
        }
        for event in bridge.drain_window_events() {
            self.dispatch_window(event);
        }
    }

    pub(crate) fn dispatch_key(&mut self, event: &KeyEvent) {
        match event.phase {
            KeyPhase::Typed => self.run_logic("key_typed", |l, w| l.key_typed(w, event)),
            KeyPhase::Pressed => self.run_logic("key_pressed", |l, w| l.key_pressed(w, event)),
            KeyPhase::Released => self.run_logic("key_released", |l, w| l.key_released(w, event)),
        }
    }

    /// World callback first, with the first hit as target, then the raw
    /// callback of every hit entity.
    pub(crate) fn dispatch_pointer(&mut self, event: &PointerEvent) -> Option<EntityId> {
        let hits = self.hits_at(event.x(), event.y());
        let target = hits.first().copied();
        self.run_logic("pointer", |l, w| l.pointer(w, event, target));
        for id in hits {
            self.run_behavior(id, "on_pointer", |behavior, ctx| behavior.on_pointer(ctx, event));
        }
        target
    }

    pub(crate) fn dispatch_window(&mut self, event: WindowEvent) {
        self.run_logic("window", |l, w| l.window(w, event));
    }

    fn run_logic(
        &mut self,
        hook: &'static str,
        call: impl FnOnce(&mut dyn WorldLogic, &mut World) -> anyhow::Result<()>,
    ) {
        let Some(mut logic) = self.logic.take() else {
            return;
        };
        if let Err(err) = guarded(|| call(logic.as_mut(), self)) {
            warn!(world = %self.id(), hook, error = %err, "world logic failed");
        }
        if self.logic.is_none() {
            self.logic = Some(logic);
        }
    }

    fn run_behavior(
        &mut self,
        id: EntityId,
        hook: &'static str,
        call: impl FnOnce(&mut dyn Behavior, &mut EntityCtx<'_>) -> anyhow::Result<()>,
    ) {
        let Some(mut behavior) = self.arena.take_behavior(id) else {
            return;
        };
        let result = guarded(|| {
            let mut ctx = EntityCtx::new(self, id);
            call(behavior.as_mut(), &mut ctx)
        });
        if let Err(err) = result {
            warn!(world = %self.id(), entity = %id, hook, error = %err, "entity callback failed");
        }
        self.arena.restore_behavior(id, behavior);
    }

    /// Snapshot for drawing, ordered back to front by paint order. Kinds
    /// outside the paint order sit at the back in insertion order.
    pub fn frame(&self) -> Frame {
        let mut layered: Vec<(usize, Drawable)> = self
            .arena
            .iter()
            .map(|(id, e)| {
                let drawable = Drawable {
                    id,
                    kind: e.kind().name(),
                    cell: [e.position.x, e.position.y],
                    bounds: self.rect_for(e),
                    rotation: e.rotation,
                    image: e.sprite.image,
                    anchor: e.sprite.anchor,
                };
                (self.paint_order.layer(e.kinds()), drawable)
            })
            .collect();
        layered.sort_by_key(|(layer, _)| *layer);
        Frame {
            world: self.id(),
            tick: self.tick,
            abs_width: self.abs_width(),
            abs_height: self.abs_height(),
            cell_size: self.cell_size(),
            background: self.background(),
            background_opacity: self.background_opacity(),
            drawables: layered.into_iter().map(|(_, d)| d).collect(),
        }
    }

    /// Push a frame to the attached canvas, if any.
    pub fn repaint(&self) {
        if let Some(canvas) = &self.canvas {
            canvas.repaint(self.frame());
        }
    }
}

/// Runs a user callback, turning a panic into an error so the caller can
/// put the callback's box back.
fn guarded(call: impl FnOnce() -> anyhow::Result<()>) -> anyhow::Result<()> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref())))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, Sprite};
    use crate::frame::Canvas;
    use std::sync::{Arc, Mutex};
    use tileworld_common::Tag;
    use tileworld_input::InputBridge;

    const BUG: Tag = Tag::kind("Bug");
    const LEAF: Tag = Tag::kind("Leaf");

    #[derive(Default)]
    struct Walker {
        ticks: u32,
    }

    impl Behavior for Walker {
        fn tick(&mut self, ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
            self.ticks += 1;
            ctx.move_by(1, 0)?;
            Ok(())
        }
    }

    /// Removes the entity named in `victim` on its first tick.
    struct Eater {
        victim: Option<EntityId>,
    }

    impl Behavior for Eater {
        fn tick(&mut self, ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
            if let Some(victim) = self.victim.take() {
                ctx.world_mut().remove_object(victim)?;
            }
            Ok(())
        }
    }

    struct Spawner;

    impl Behavior for Spawner {
        fn tick(&mut self, ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
            ctx.spawn(Entity::new(BUG).with_behavior(Walker::default()), 0, 0);
            Ok(())
        }
    }

    struct Quitter;

    impl Behavior for Quitter {
        fn tick(&mut self, ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
            ctx.remove_self()?;
            Ok(())
        }
    }

    struct Failing;

    impl Behavior for Failing {
        fn tick(&mut self, _ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
            anyhow::bail!("always fails")
        }
    }

    /// Panics on its first tick, then counts.
    #[derive(Default)]
    struct Flaky {
        ticks: u32,
    }

    impl Behavior for Flaky {
        fn tick(&mut self, _ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
            self.ticks += 1;
            if self.ticks == 1 {
                panic!("flaky first tick");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FlakyLogic {
        ticks: u32,
    }

    impl WorldLogic for FlakyLogic {
        fn tick(&mut self, _world: &mut World) -> anyhow::Result<()> {
            self.ticks += 1;
            if self.ticks == 1 {
                panic!("flaky logic");
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
        ticks: u32,
    }

    impl WorldLogic for Recorder {
        fn tick(&mut self, _world: &mut World) -> anyhow::Result<()> {
            self.ticks += 1;
            Ok(())
        }

        fn key_typed(&mut self, _world: &mut World, event: &KeyEvent) -> anyhow::Result<()> {
            self.log.push(format!("typed {:?}", event.ch));
            Ok(())
        }

        fn key_pressed(&mut self, _world: &mut World, event: &KeyEvent) -> anyhow::Result<()> {
            self.log.push(format!("pressed {:?}", event.ch));
            Ok(())
        }

        fn key_released(&mut self, _world: &mut World, event: &KeyEvent) -> anyhow::Result<()> {
            self.log.push(format!("released {:?}", event.ch));
            Ok(())
        }

        fn pointer(
            &mut self,
            _world: &mut World,
            event: &PointerEvent,
            target: Option<EntityId>,
        ) -> anyhow::Result<()> {
            self.log.push(format!("pointer {:?} {}", event.phase, target.is_some()));
            Ok(())
        }

        fn window(&mut self, _world: &mut World, event: WindowEvent) -> anyhow::Result<()> {
            self.log.push(format!("window {event:?}"));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Clicks(u32);

    impl Behavior for Clicks {
        fn tick(&mut self, _ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
            Ok(())
        }

        fn on_pointer(&mut self, _ctx: &mut EntityCtx<'_>, event: &PointerEvent) -> anyhow::Result<()> {
            if event.phase == tileworld_input::PointerPhase::Clicked {
                self.0 += 1;
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Capture(Mutex<Vec<Frame>>);

    impl Canvas for Capture {
        fn repaint(&self, frame: Frame) {
            self.0.lock().unwrap().push(frame);
        }
    }

    #[test]
    fn step_counts_and_ticks_behaviors() {
        let mut w = World::default().with_logic(Recorder::default());
        let id = w.add_object(Entity::new(BUG).with_behavior(Walker::default()), 0, 0);
        w.step();
        w.step();
        assert_eq!(w.tick(), 2);
        assert_eq!(w.behavior::<Walker>(id).unwrap().ticks, 2);
        assert_eq!(w.position(id).unwrap().x, 2);
        assert_eq!(w.logic::<Recorder>().unwrap().ticks, 2);
    }

    #[test]
    fn entity_removed_before_its_turn_is_skipped() {
        let mut w = World::default();
        let eater = w.add_object(Entity::new(BUG).with_behavior(Eater { victim: None }), 0, 0);
        let victim = w.add_object(Entity::new(LEAF).with_behavior(Walker::default()), 5, 5);
        w.behavior_mut::<Eater>(eater).unwrap().victim = Some(victim);
        w.step();
        assert!(!w.contains(victim));
        assert_eq!(w.entity_count(), 1);
        assert_eq!(w.objects(), vec![eater]);
    }

    #[test]
    fn entity_added_mid_pass_waits_for_next_step() {
        let mut w = World::default();
        w.add_object(Entity::new(LEAF).with_behavior(Spawner), 0, 0);
        w.step();
        let spawned = w.objects_of(BUG);
        assert_eq!(spawned.len(), 1);
        assert_eq!(w.behavior::<Walker>(spawned[0]).unwrap().ticks, 0);
        w.step();
        assert_eq!(w.behavior::<Walker>(spawned[0]).unwrap().ticks, 1);
        assert_eq!(w.objects_of(BUG).len(), 2);
    }

    #[test]
    fn self_removal_mid_tick() {
        let mut w = World::default();
        let quitter = w.add_object(Entity::new(BUG).with_behavior(Quitter), 0, 0);
        let walker = w.add_object(Entity::new(BUG).with_behavior(Walker::default()), 0, 0);
        w.step();
        assert!(!w.contains(quitter));
        assert_eq!(w.behavior::<Walker>(walker).unwrap().ticks, 1);
        w.step();
        assert_eq!(w.entity_count(), 1);
    }

    #[test]
    fn failing_behavior_does_not_stop_the_pass() {
        let mut w = World::default();
        let failing = w.add_object(Entity::new(BUG).with_behavior(Failing), 0, 0);
        let walker = w.add_object(Entity::new(BUG).with_behavior(Walker::default()), 0, 0);
        w.step();
        w.step();
        assert_eq!(w.behavior::<Walker>(walker).unwrap().ticks, 2);
        assert!(w.entity(failing).unwrap().has_behavior());
    }

    #[test]
    fn panicking_behavior_is_kept_and_the_pass_continues() {
        let canvas = Arc::new(Capture::default());
        let mut w = World::default().with_canvas(canvas.clone());
        let flaky = w.add_object(Entity::new(BUG).with_behavior(Flaky::default()), 0, 0);
        let walker = w.add_object(Entity::new(BUG).with_behavior(Walker::default()), 0, 0);
        for _ in 0..3 {
            w.step();
        }
        assert_eq!(w.behavior::<Walker>(walker).unwrap().ticks, 3);
        assert_eq!(w.behavior::<Flaky>(flaky).unwrap().ticks, 3);
        assert_eq!(canvas.0.lock().unwrap().len(), 3);
    }

    #[test]
    fn panicking_logic_is_kept() {
        let mut w = World::default().with_logic(FlakyLogic::default());
        let walker = w.add_object(Entity::new(BUG).with_behavior(Walker::default()), 0, 0);
        w.step();
        w.step();
        assert_eq!(w.logic::<FlakyLogic>().unwrap().ticks, 2);
        assert_eq!(w.behavior::<Walker>(walker).unwrap().ticks, 2);
    }

    #[test]
    fn input_scenario_click_and_key_state() {
        let bridge = Arc::new(InputBridge::new());
        let mut w = World::new(10, 10, 16)
            .unwrap()
            .with_input(bridge.clone())
            .with_logic(Recorder::default());
        let e = w.add_object(
            Entity::new(BUG)
                .with_sprite(Sprite::blank(16, 16))
                .with_behavior(Clicks::default()),
            2,
            2,
        );

        bridge.on_key_pressed(KeyEvent::pressed('a'));
        let pointer_thread = {
            let bridge = bridge.clone();
            std::thread::spawn(move || bridge.on_pointer_clicked(PointerEvent::click(40, 40)))
        };
        pointer_thread.join().unwrap();
        bridge.on_key_released(KeyEvent::released('a'));
        w.step();

        assert_eq!(w.behavior::<Clicks>(e).unwrap().0, 1);
        assert!(!bridge.is_key_down('a'));
        let log = &w.logic::<Recorder>().unwrap().log;
        assert_eq!(
            log,
            &vec![
                "pressed Some('a')".to_string(),
                "released Some('a')".to_string(),
                "pointer Clicked true".to_string(),
            ]
        );
    }

    #[test]
    fn pointer_outside_entities_has_no_target() {
        let mut w = World::new(10, 10, 16).unwrap().with_logic(Recorder::default());
        w.add_object(Entity::new(BUG).with_sprite(Sprite::blank(16, 16)), 2, 2);
        let event = PointerEvent::click(150, 150);
        assert_eq!(w.dispatch_pointer(&event), None);
        assert_eq!(w.logic::<Recorder>().unwrap().log, vec!["pointer Clicked false"]);
    }

    #[test]
    fn typed_and_window_events_reach_logic() {
        let bridge = Arc::new(InputBridge::new());
        let mut w = World::default()
            .with_input(bridge.clone())
            .with_logic(Recorder::default());
        bridge.on_key_typed(KeyEvent::typed('x'));
        bridge.on_window(WindowEvent::Activated);
        w.step();
        assert_eq!(
            w.logic::<Recorder>().unwrap().log,
            vec!["typed Some('x')", "window Activated"]
        );
        w.step();
        assert_eq!(w.logic::<Recorder>().unwrap().log.len(), 2);
    }

    #[test]
    fn logic_replaced_mid_hook_keeps_replacement() {
        struct Swapper;
        impl WorldLogic for Swapper {
            fn tick(&mut self, world: &mut World) -> anyhow::Result<()> {
                world.set_logic(Recorder::default());
                Ok(())
            }
        }
        let mut w = World::default().with_logic(Swapper);
        w.step();
        assert!(w.logic::<Recorder>().is_some());
        w.step();
        assert_eq!(w.logic::<Recorder>().unwrap().ticks, 1);
    }

    #[test]
    fn frame_respects_paint_order() {
        let mut w = World::default();
        let leaf = w.add_object(Entity::new(LEAF), 1, 1);
        let bug = w.add_object(Entity::new(BUG), 1, 1);
        let rock = w.add_object(Entity::new(Tag::kind("Rock")), 1, 1);
        w.set_paint_order(&[LEAF, BUG]);
        let order: Vec<EntityId> = w.frame().drawables.iter().map(|d| d.id).collect();
        // unlisted at the back, first listed kind on top
        assert_eq!(order, vec![rock, bug, leaf]);
    }

    #[test]
    fn step_repaints_attached_canvas() {
        let canvas = Arc::new(Capture::default());
        let mut w = World::default().with_canvas(canvas.clone());
        w.add_object(Entity::new(BUG), 3, 4);
        w.step();
        w.step();
        let frames = canvas.0.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].tick, 2);
        assert_eq!(frames[1].drawables[0].cell, [3, 4]);
        assert_eq!(frames[1].drawables[0].kind, "Bug");
    }
}
