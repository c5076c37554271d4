/// 可見性引擎
///
/// 每 tick 驅動一次的協調者：套用註冊命令、依更新間隔
/// 節流評估、組裝觀察者上下文、逐實體走評估器與滯留
/// 過濾、發布狀態轉換事件，並驅動靜態場景的調暗 pass。
/// 任何失敗都降級為保守的記錄後備，絕不向宿主迴圈拋出
use crossbeam_channel::{unbounded, Receiver, Sender};
use vek::{Rgb, Vec3};

use crate::comp::{EntityId, SceneryId, TrackedEntity, ViewerContext};
use crate::config::VisionConfig;
use crate::provider::{RayCastProvider, RenderSink, VisionRadiusProvider};
use crate::vision::darkening::{DarkeningInterpolator, SceneryItem};
use crate::vision::evaluator::evaluate_raw;
use crate::vision::hysteresis;
use crate::vision::registry::{EntityRegistry, RegistryHandle, RegistryStats};

/// 可見性事件，每次公布狀態實際轉換時恰好發出一次
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisionEvent {
    VisibilityChanged { id: EntityId, visible: bool },
}

/// 引擎統計
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineStats {
    /// 完成的評估 pass 數
    pub passes: usize,
    /// 因更新間隔未到而跳過的 tick 數
    pub gated_ticks: usize,
    /// 因缺少觀察者而跳過的 pass 數
    pub skipped_passes: usize,
    /// 累計評估過的實體數
    pub entities_evaluated: usize,
    /// 已發出的事件數
    pub events_fired: usize,
}

/// 可見性引擎
pub struct VisionEngine {
    config: VisionConfig,
    registry: EntityRegistry,
    darkening: DarkeningInterpolator,
    /// 觀察者位置，由宿主每 tick 推入；None 時整個 pass 跳過
    viewer_pos: Option<Vec3<f32>>,
    ray_provider: Option<Box<dyn RayCastProvider + Send + Sync>>,
    radius_provider: Option<Box<dyn VisionRadiusProvider + Send + Sync>>,
    render_sink: Option<Box<dyn RenderSink + Send + Sync>>,
    last_eval_time: Option<f64>,
    outcomes: Vec<VisionEvent>,
    subscribers: Vec<Sender<VisionEvent>>,
    warned_missing_viewer: bool,
    warned_missing_ray: bool,
    stats: EngineStats,
}

impl VisionEngine {
    /// 以配置創建引擎，配置先經鉗制
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config: config.sanitized(),
            registry: EntityRegistry::new(),
            darkening: DarkeningInterpolator::new(),
            viewer_pos: None,
            ray_provider: None,
            radius_provider: None,
            render_sink: None,
            last_eval_time: None,
            outcomes: Vec::new(),
            subscribers: Vec::new(),
            warned_missing_viewer: false,
            warned_missing_ray: false,
            stats: EngineStats::default(),
        }
    }

    /// 接上射線查詢提供者
    pub fn with_ray_provider(mut self, provider: Box<dyn RayCastProvider + Send + Sync>) -> Self {
        self.ray_provider = Some(provider);
        self
    }

    /// 接上視野半徑提供者（每個 pass 重新讀取）
    pub fn with_radius_provider(
        mut self,
        provider: Box<dyn VisionRadiusProvider + Send + Sync>,
    ) -> Self {
        self.radius_provider = Some(provider);
        self
    }

    /// 接上渲染端
    pub fn with_render_sink(mut self, sink: Box<dyn RenderSink + Send + Sync>) -> Self {
        self.render_sink = Some(sink);
        self
    }

    // ---- 註冊生命週期 ----

    /// 註冊被追蹤實體（重複註冊為無操作）
    pub fn register(&mut self, entity: TrackedEntity) {
        self.registry.register(entity);
    }

    /// 移除實體，其可見性與滯留狀態立即丟棄
    pub fn unregister(&mut self, id: EntityId) {
        self.registry.unregister(id);
    }

    /// 更新實體位置
    pub fn update_position(&mut self, id: EntityId, pos: Vec3<f32>) {
        self.registry.update_position(id, pos);
    }

    /// 更新實體存活旗標
    pub fn set_alive(&mut self, id: EntityId, alive: bool) {
        self.registry.set_alive(id, alive);
    }

    /// 取得可在生成/消滅回呼中使用的註冊句柄，
    /// 命令在下一個 tick 開頭一次套用
    pub fn registry_handle(&self) -> RegistryHandle {
        self.registry.handle()
    }

    /// 註冊靜態場景物件（原始顏色在此刻快照）
    pub fn register_scenery(&mut self, item: SceneryItem) {
        self.darkening.register(item);
    }

    /// 移除靜態場景物件
    pub fn unregister_scenery(&mut self, id: SceneryId) {
        self.darkening.unregister(id);
    }

    // ---- 查詢介面 ----

    /// 查詢實體的公布狀態；未註冊或已移除的 id 一律回傳隱藏
    pub fn is_visible(&self, id: EntityId) -> bool {
        self.registry
            .state(id)
            .map(|s| s.published_visible)
            .unwrap_or(false)
    }

    /// 目前公布為可見的所有實體
    pub fn visible_entities(&self) -> Vec<EntityId> {
        self.registry
            .snapshot_ids()
            .into_iter()
            .filter(|id| self.is_visible(*id))
            .collect()
    }

    pub fn is_tracked(&self, id: EntityId) -> bool {
        self.registry.contains(id)
    }

    pub fn tracked_count(&self) -> usize {
        self.registry.len()
    }

    /// 場景物件的當前調暗係數
    pub fn darken_factor(&self, id: SceneryId) -> f32 {
        self.darkening.factor(id)
    }

    /// 場景物件依當前係數計算的基底顯示顏色
    pub fn shaded_base(&self, id: SceneryId) -> Option<Rgb<f32>> {
        self.darkening.shaded_base(id, self.config.darkened_brightness)
    }

    /// 場景物件依當前係數計算的自發光顯示顏色
    pub fn shaded_emissive(&self, id: SceneryId) -> Option<Rgb<f32>> {
        self.darkening
            .shaded_emissive(id, self.config.darkened_brightness)
    }

    // ---- 事件介面 ----

    /// 取走本輪累積的事件
    pub fn drain_events(&mut self) -> Vec<VisionEvent> {
        std::mem::take(&mut self.outcomes)
    }

    /// 訂閱事件串流；接收端斷線後自動清除
    pub fn subscribe(&mut self) -> Receiver<VisionEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    // ---- 配置 ----

    /// 熱更新配置（先鉗制）
    pub fn apply_config(&mut self, config: VisionConfig) {
        self.config = config.sanitized();
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// 設定觀察者位置；None 表示本輪沒有觀察者
    pub fn set_viewer_pos(&mut self, pos: Option<Vec3<f32>>) {
        self.viewer_pos = pos;
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// 導出當前狀態摘要（用於調試）
    pub fn export_debug(&self) -> serde_json::Value {
        let visible: Vec<u64> = self.visible_entities().iter().map(|id| id.0).collect();
        serde_json::json!({
            "tracked": self.registry.len(),
            "scenery": self.darkening.len(),
            "visible": visible,
            "passes": self.stats.passes,
            "events_fired": self.stats.events_fired,
        })
    }

    // ---- tick ----

    /// 宿主每幀呼叫一次；實際評估依 `update_interval` 節流
    ///
    /// `now` 為宿主時鐘的秒數，單調遞增
    pub fn tick(&mut self, now: f64) {
        // 排隊中的註冊命令永遠先套用，與評估節流無關
        self.registry.apply_pending();

        if let Some(last) = self.last_eval_time {
            if now - last < f64::from(self.config.update_interval) {
                self.stats.gated_ticks += 1;
                return;
            }
        }

        let viewer_pos = match self.viewer_pos {
            Some(pos) => {
                self.warned_missing_viewer = false;
                pos
            }
            None => {
                // 缺少觀察者：跳過本輪，保留先前公布狀態
                if !self.warned_missing_viewer {
                    log::warn!("no viewer context this tick, evaluation skipped");
                    self.warned_missing_viewer = true;
                }
                self.stats.skipped_passes += 1;
                return;
            }
        };

        let mut radius = self
            .radius_provider
            .as_ref()
            .map(|p| p.radius())
            .unwrap_or(self.config.radius);
        if radius < 0.0 || !radius.is_finite() {
            log::warn!("vision radius {} is invalid, clamped to 0", radius);
            radius = 0.0;
        }

        if self.config.use_line_of_sight && self.ray_provider.is_none() && !self.warned_missing_ray
        {
            log::warn!("line of sight enabled but no raycast provider wired, treating as clear");
            self.warned_missing_ray = true;
        }

        let viewer = ViewerContext::from_config(viewer_pos, radius, &self.config);

        for id in self.registry.snapshot_ids() {
            let entity = match self.registry.entity(id) {
                Some(entity) => *entity,
                None => continue,
            };

            let transition = if self.config.always_visible_categories.contains(&entity.category) {
                // 類別覆寫：完全跳過評估器與滯留過濾
                match self.registry.state_mut(id) {
                    Some(state) => {
                        state.raw_visible = true;
                        state.last_visible_time = now;
                        if !state.published_visible {
                            state.published_visible = true;
                            Some(true)
                        } else {
                            None
                        }
                    }
                    None => None,
                }
            } else {
                let raw = evaluate_raw(
                    &viewer,
                    &entity,
                    self.ray_provider.as_deref().map(|p| p as &dyn RayCastProvider),
                    self.config.eye_height,
                    self.config.layer_mask,
                );
                match self.registry.state_mut(id) {
                    Some(state) => hysteresis::publish(state, raw, now, self.config.dwell_threshold),
                    None => None,
                }
            };

            self.stats.entities_evaluated += 1;
            if let Some(visible) = transition {
                self.fire(id, visible);
            }
        }

        self.darkening.update(
            viewer_pos,
            radius,
            &self.config,
            self.render_sink.as_deref_mut().map(|s| s as &mut dyn RenderSink),
        );

        self.last_eval_time = Some(now);
        self.stats.passes += 1;
    }

    /// 發布一次狀態轉換
    fn fire(&mut self, id: EntityId, visible: bool) {
        if let Some(sink) = self.render_sink.as_deref_mut() {
            sink.set_visible(id, visible);
        }
        let event = VisionEvent::VisibilityChanged { id, visible };
        self.subscribers.retain(|tx| tx.send(event).is_ok());
        self.outcomes.push(event);
        self.stats.events_fired += 1;
    }
}

impl Default for VisionEngine {
    fn default() -> Self {
        Self::new(VisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comp::EntityCategory;

    fn npc(id: u64, x: f32) -> TrackedEntity {
        TrackedEntity::new(
            EntityId(id),
            EntityCategory::HostileNpc,
            Vec3::new(x, 0.0, 0.0),
        )
    }

    fn engine_without_los() -> VisionEngine {
        let mut config = VisionConfig::default();
        config.use_line_of_sight = false;
        VisionEngine::new(config)
    }

    #[test]
    fn test_unknown_id_is_hidden() {
        let engine = VisionEngine::default();
        assert!(!engine.is_visible(EntityId(123)));
    }

    #[test]
    fn test_missing_viewer_retains_published_state() {
        let mut engine = engine_without_los();
        engine.register(npc(1, 10.0));
        engine.set_viewer_pos(Some(Vec3::zero()));
        engine.tick(0.0);
        assert!(engine.is_visible(EntityId(1)));

        // 觀察者消失：跳過評估，狀態保持不變
        engine.set_viewer_pos(None);
        engine.tick(1.0);
        assert!(engine.is_visible(EntityId(1)));
        assert_eq!(engine.stats().skipped_passes, 1);
    }

    #[test]
    fn test_update_interval_gates_evaluation() {
        let mut engine = engine_without_los();
        engine.register(npc(1, 10.0));
        engine.set_viewer_pos(Some(Vec3::zero()));

        engine.tick(0.0);
        engine.tick(0.05);
        engine.tick(0.1);
        assert_eq!(engine.stats().passes, 1);
        assert_eq!(engine.stats().gated_ticks, 2);

        engine.tick(0.25);
        assert_eq!(engine.stats().passes, 2);
    }

    #[test]
    fn test_event_fired_once_per_transition() {
        let mut engine = engine_without_los();
        let rx = engine.subscribe();
        engine.register(npc(1, 10.0));
        engine.set_viewer_pos(Some(Vec3::zero()));

        engine.tick(0.0);
        engine.tick(0.3);
        engine.tick(0.6);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![VisionEvent::VisibilityChanged { id: EntityId(1), visible: true }]
        );
        assert_eq!(engine.drain_events().len(), 1);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_handle_commands_apply_before_pass() {
        let mut engine = engine_without_los();
        let handle = engine.registry_handle();
        engine.set_viewer_pos(Some(Vec3::zero()));

        handle.register(npc(5, 5.0));
        engine.tick(0.0);
        assert!(engine.is_visible(EntityId(5)));

        handle.unregister(EntityId(5));
        engine.tick(0.3);
        assert!(!engine.is_visible(EntityId(5)));
        assert_eq!(engine.tracked_count(), 0);
    }

    #[test]
    fn test_radius_provider_reread_each_pass() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        struct ShrinkingRadius(Arc<AtomicU32>);
        impl crate::provider::VisionRadiusProvider for ShrinkingRadius {
            fn radius(&self) -> f32 {
                self.0.load(Ordering::Relaxed) as f32
            }
        }

        let radius = Arc::new(AtomicU32::new(60));
        let mut config = VisionConfig::default();
        config.use_line_of_sight = false;
        config.dwell_threshold = 0.0;
        let mut engine = VisionEngine::new(config)
            .with_radius_provider(Box::new(ShrinkingRadius(radius.clone())));

        engine.register(npc(1, 50.0));
        engine.set_viewer_pos(Some(Vec3::zero()));
        engine.tick(0.0);
        assert!(engine.is_visible(EntityId(1)));

        // 屬性系統把半徑縮到 40，下一個 pass 立即生效
        radius.store(40, Ordering::Relaxed);
        engine.tick(0.5);
        engine.tick(1.0);
        assert!(!engine.is_visible(EntityId(1)));
    }

    #[test]
    fn test_dead_entity_goes_hidden() {
        let mut config = VisionConfig::default();
        config.use_line_of_sight = false;
        config.dwell_threshold = 0.0;
        let mut engine = VisionEngine::new(config);

        engine.register(npc(1, 10.0));
        engine.set_viewer_pos(Some(Vec3::zero()));
        engine.tick(0.0);
        assert!(engine.is_visible(EntityId(1)));

        engine.set_alive(EntityId(1), false);
        engine.tick(0.5);
        engine.tick(1.0);
        assert!(!engine.is_visible(EntityId(1)));
    }

    #[test]
    fn test_export_debug_snapshot() {
        let mut engine = engine_without_los();
        engine.register(npc(1, 10.0));
        engine.set_viewer_pos(Some(Vec3::zero()));
        engine.tick(0.0);

        let snapshot = engine.export_debug();
        assert_eq!(snapshot["tracked"], 1);
        assert_eq!(snapshot["passes"], 1);
        assert_eq!(snapshot["visible"][0], 1);
    }
}
