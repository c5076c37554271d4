/// 可見性引擎的 ECS 整合
///
/// 提供位置同步與 tick 驅動的 specs 系統。實體的註冊與
/// 移除仍由生成/消滅程式碼透過 `RegistryHandle` 推入
/// （push 模型），本系統不做全場景掃描
use specs::prelude::*;
use specs::Component;
use vek::Vec3;

use crate::comp::EntityId;
use crate::vision::engine::VisionEngine;

/// 位置組件
#[derive(Component, Debug, Clone, Copy)]
#[storage(VecStorage)]
pub struct Pos(pub Vec3<f32>);

/// 觀察者標記組件（一個世界一個觀察者；多觀察者各跑獨立引擎）
#[derive(Component, Default, Debug, Clone, Copy)]
#[storage(NullStorage)]
pub struct Viewer;

/// 模擬時鐘資源（秒）
#[derive(Default, Debug, Clone, Copy)]
pub struct Time(pub f64);

/// 由 specs `Entity` 導出穩定識別碼
pub fn entity_id_of(entity: Entity) -> EntityId {
    EntityId(u64::from(entity.id()))
}

/// 可見性 tick 系統
///
/// 每幀把已註冊實體的位置從 ECS 儲存同步進引擎、以
/// `Viewer` 標記的實體位置更新觀察者，然後驅動引擎 tick
/// （引擎內部自行依更新間隔節流）
#[derive(Default)]
pub struct VisionTickSystem;

impl<'a> System<'a> for VisionTickSystem {
    type SystemData = (
        Entities<'a>,
        Read<'a, Time>,
        ReadStorage<'a, Pos>,
        ReadStorage<'a, Viewer>,
        Write<'a, VisionEngine>,
    );

    fn run(&mut self, (entities, time, positions, viewers, mut engine): Self::SystemData) {
        let viewer_pos = (&positions, &viewers)
            .join()
            .next()
            .map(|(pos, _)| pos.0);
        engine.set_viewer_pos(viewer_pos);

        for (entity, pos) in (&entities, &positions).join() {
            let id = entity_id_of(entity);
            if engine.is_tracked(id) {
                engine.update_position(id, pos.0);
            }
        }

        engine.tick(time.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comp::{EntityCategory, TrackedEntity};
    use crate::config::VisionConfig;

    #[test]
    fn test_system_syncs_positions_and_ticks() {
        let mut world = World::new();
        world.register::<Pos>();
        world.register::<Viewer>();

        let mut config = VisionConfig::default();
        config.use_line_of_sight = false;
        world.insert(VisionEngine::new(config));
        world.insert(Time(0.0));

        // 觀察者在原點
        world
            .create_entity()
            .with(Pos(Vec3::zero()))
            .with(Viewer)
            .build();

        // 生成一隻在視野內的敵人並向引擎註冊（push 模型）
        let enemy = world
            .create_entity()
            .with(Pos(Vec3::new(30.0, 0.0, 0.0)))
            .build();
        let enemy_id = entity_id_of(enemy);
        {
            let mut engine = world.write_resource::<VisionEngine>();
            engine.register(TrackedEntity::new(
                enemy_id,
                EntityCategory::HostileNpc,
                Vec3::zero(),
            ));
        }

        let mut system = VisionTickSystem;
        system.run_now(&world);
        world.maintain();

        let engine = world.read_resource::<VisionEngine>();
        assert!(engine.is_visible(enemy_id), "位置同步後應在視野內");
        assert_eq!(engine.stats().passes, 1);
    }

    #[test]
    fn test_unregistered_entities_are_not_scanned_in() {
        let mut world = World::new();
        world.register::<Pos>();
        world.register::<Viewer>();
        world.insert(VisionEngine::default());
        world.insert(Time(0.0));

        world
            .create_entity()
            .with(Pos(Vec3::zero()))
            .with(Viewer)
            .build();
        world
            .create_entity()
            .with(Pos(Vec3::new(1.0, 0.0, 0.0)))
            .build();

        let mut system = VisionTickSystem;
        system.run_now(&world);

        let engine = world.read_resource::<VisionEngine>();
        assert_eq!(engine.tracked_count(), 0);
    }
}
