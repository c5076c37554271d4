/// 實體註冊表
///
/// 擁有所有被追蹤實體與其可見性狀態的生命週期。
/// 生成/消滅回呼可能在評估 pass 之外的任意時機發生，
/// 來自句柄的變更先進入命令佇列，在下一個 tick 開頭
/// 一次套用，避免疊代中的集合被改動
use crossbeam_channel::{unbounded, Receiver, Sender};
use hashbrown::HashMap;
use vek::Vec3;

use crate::comp::{EntityId, TrackedEntity, VisibilityState};

/// 註冊表命令
#[derive(Debug, Clone)]
pub enum RegistryCommand {
    /// 註冊實體（已存在則忽略）
    Register(TrackedEntity),
    /// 移除實體並立即丟棄其狀態
    Unregister(EntityId),
    /// 更新實體位置
    UpdatePos(EntityId, Vec3<f32>),
    /// 更新存活旗標
    SetAlive(EntityId, bool),
}

/// 可複製的註冊表句柄
///
/// 供生成/消滅回呼持有，命令在下一個 tick 開頭套用
#[derive(Clone)]
pub struct RegistryHandle {
    tx: Sender<RegistryCommand>,
}

impl RegistryHandle {
    pub fn register(&self, entity: TrackedEntity) {
        let _ = self.tx.send(RegistryCommand::Register(entity));
    }

    pub fn unregister(&self, id: EntityId) {
        let _ = self.tx.send(RegistryCommand::Unregister(id));
    }

    pub fn update_position(&self, id: EntityId, pos: Vec3<f32>) {
        let _ = self.tx.send(RegistryCommand::UpdatePos(id, pos));
    }

    pub fn set_alive(&self, id: EntityId, alive: bool) {
        let _ = self.tx.send(RegistryCommand::SetAlive(id, alive));
    }
}

/// 註冊統計
#[derive(Debug, Default, Clone, Copy)]
pub struct RegistryStats {
    /// 成功註冊次數
    pub registered: usize,
    /// 成功移除次數
    pub unregistered: usize,
    /// 被忽略的重複註冊次數
    pub ignored_duplicates: usize,
}

/// 實體註冊表
pub struct EntityRegistry {
    /// 被追蹤實體
    entities: HashMap<EntityId, TrackedEntity>,
    /// 每實體的可見性狀態，與實體同生共滅
    states: HashMap<EntityId, VisibilityState>,
    cmd_tx: Sender<RegistryCommand>,
    cmd_rx: Receiver<RegistryCommand>,
    stats: RegistryStats,
}

impl EntityRegistry {
    /// 創建空的註冊表
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = unbounded();
        Self {
            entities: HashMap::new(),
            states: HashMap::new(),
            cmd_tx,
            cmd_rx,
            stats: RegistryStats::default(),
        }
    }

    /// 取得可複製的命令句柄
    pub fn handle(&self) -> RegistryHandle {
        RegistryHandle {
            tx: self.cmd_tx.clone(),
        }
    }

    /// 註冊實體，已存在時忽略
    pub fn register(&mut self, entity: TrackedEntity) {
        if self.entities.contains_key(&entity.id) {
            self.stats.ignored_duplicates += 1;
            return;
        }
        self.states.insert(entity.id, VisibilityState::default());
        self.entities.insert(entity.id, entity);
        self.stats.registered += 1;
    }

    /// 移除實體，可見性與滯留狀態同步丟棄
    ///
    /// 已移除的實體不存在「閃爍保護中的延遲隱藏」，重複移除為無操作
    pub fn unregister(&mut self, id: EntityId) {
        if self.entities.remove(&id).is_some() {
            self.states.remove(&id);
            self.stats.unregistered += 1;
        }
    }

    /// 更新實體位置
    pub fn update_position(&mut self, id: EntityId, pos: Vec3<f32>) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.pos = pos;
        }
    }

    /// 更新存活旗標
    pub fn set_alive(&mut self, id: EntityId, alive: bool) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.alive = alive;
        }
    }

    /// 在 tick 開頭套用所有排隊中的命令
    pub fn apply_pending(&mut self) {
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            match cmd {
                RegistryCommand::Register(entity) => self.register(entity),
                RegistryCommand::Unregister(id) => self.unregister(id),
                RegistryCommand::UpdatePos(id, pos) => self.update_position(id, pos),
                RegistryCommand::SetAlive(id, alive) => self.set_alive(id, alive),
            }
        }
    }

    /// 目前追蹤中的實體 id 快照（順序不定）
    pub fn snapshot_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&TrackedEntity> {
        self.entities.get(&id)
    }

    pub fn state(&self, id: EntityId) -> Option<&VisibilityState> {
        self.states.get(&id)
    }

    pub fn state_mut(&mut self, id: EntityId) -> Option<&mut VisibilityState> {
        self.states.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// 取得註冊統計
    pub fn stats(&self) -> RegistryStats {
        self.stats
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
