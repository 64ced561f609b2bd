use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// 房间成员表: 活动编号 -> 当前在房间里的用户ID集合。
/// 仅进程内, 不持久化; 进程重启即清空, 客户端重连后需重新 join。
/// 同一用户多端连接按集合语义只计一次, leave/断连时一次性移除, 不做引用计数。
/// 多实例部署时各实例各自维护一份视图 (见 DESIGN.md 决策 1),
/// 接口保持窄, 便于换成共享存储实现。
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<String, HashSet<i64>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入房间 (不存在则创建), 幂等。返回加入后的房间人数。
    pub fn add(&self, raffle_code: &str, user_id: i64) -> u64 {
        let mut members = self.rooms.entry(raffle_code.to_string()).or_default();
        members.insert(user_id);
        members.len() as u64
    }

    /// 移除用户, 幂等; 集合空了就回收整个房间条目。返回剩余人数。
    pub fn remove(&self, raffle_code: &str, user_id: i64) -> u64 {
        let remaining = match self.rooms.get_mut(raffle_code) {
            Some(mut members) => {
                members.remove(&user_id);
                members.len() as u64
            }
            None => return 0,
        };
        if remaining == 0 {
            self.remove_if_empty(raffle_code);
        }
        remaining
    }

    /// 房间人数; 未跟踪的房间为 0
    pub fn count_for(&self, raffle_code: &str) -> u64 {
        self.rooms
            .get(raffle_code)
            .map(|members| members.len() as u64)
            .unwrap_or(0)
    }

    /// 空房间回收, 活动结束后条目不堆积
    pub fn remove_if_empty(&self, raffle_code: &str) {
        self.rooms
            .remove_if(raffle_code, |_, members| members.is_empty());
    }

    /// 断连清理: 把用户从出现过的所有房间移除,
    /// 返回受影响的 (活动编号, 剩余人数) 列表。
    /// 这是成员表唯一的跨房间扫描, 只被断连路径使用。
    pub fn drain_user(&self, user_id: i64) -> Vec<(String, u64)> {
        let mut affected = Vec::new();
        for mut entry in self.rooms.iter_mut() {
            if entry.value_mut().remove(&user_id) {
                affected.push((entry.key().clone(), entry.value().len() as u64));
            }
        }
        for (code, remaining) in &affected {
            if *remaining == 0 {
                self.remove_if_empty(code);
            }
        }
        affected
    }
}
