use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheItem<T> {
    value: T,
    expires_at: Instant,
}

/// 进程内的 TTL 缓存，克隆后共享同一份数据
#[derive(Debug, Clone)]
pub struct Cache<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<String, CacheItem<T>>>>,
    default_ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    /// 设置缓存项
    pub fn set(&self, key: impl Into<String>, value: T) {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// 设置带有自定义TTL的缓存项
    pub fn set_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let item = CacheItem {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.data.write().insert(key.into(), item);
    }

    /// 获取未过期的缓存项
    pub fn get(&self, key: &str) -> Option<T> {
        let data = self.data.read();
        data.get(key)
            .filter(|item| item.expires_at > Instant::now())
            .map(|item| item.value.clone())
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        let mut data = self.data.write();
        debug!("Clearing {} cached entries", data.len());
        data.clear();
    }

    /// 条目数量，包括尚未清理的过期项
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清理过期项，返回删除的数量
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut data = self.data.write();
        let before = data.len();
        data.retain(|_, item| item.expires_at > now);
        before - data.len()
    }

    /// 启动后台清理任务
    pub fn spawn_janitor(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = cache.cleanup_expired();
                if removed > 0 {
                    debug!("Removed {} expired cache entries", removed);
                }
            }
        })
    }
}

/// 页面缓存键：前缀加上按参数名排序后的查询串
pub fn page_key(prefix: &str, query: Option<&str>) -> String {
    let mut pairs: Vec<(String, String)> = query
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default();
    pairs.sort();
    let normalized = serde_urlencoded::to_string(&pairs).unwrap_or_default();
    format!("{}:{}", prefix, normalized)
}
