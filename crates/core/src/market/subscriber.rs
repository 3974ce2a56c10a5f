use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};
use tracing::error;

/// 订阅回调。回调内部允许调用自身的 `Subscription::unsubscribe`。
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T: ?Sized> {
    id: u64,
    handler: Handler<T>,
}

struct Registry<T: ?Sized> {
    next_id: u64,
    // Vec 保持订阅顺序
    entries: Vec<Entry<T>>,
}

/// 类型擦除后的注销入口，使 `Subscription` 不携带泛型参数。
trait Unregister: Send + Sync {
    fn unregister(&self, id: u64) -> bool;
}

impl<T: ?Sized> Unregister for Mutex<Registry<T>> {
    fn unregister(&self, id: u64) -> bool {
        let mut registry = self.lock().unwrap_or_else(|e| e.into_inner());
        let before = registry.entries.len();
        registry.entries.retain(|entry| entry.id != id);
        registry.entries.len() != before
    }
}

/// # Summary
/// 订阅者集合，订阅通道与行情服务共用的分发器。
///
/// # Invariants
/// - 按订阅顺序投递。
/// - 分发时先对订阅者拍快照，投递前逐个复核仍处于注册状态；
///   已注销的回调不会再被调用，即使注销发生在同一批次的投递过程中。
/// - 持锁期间从不调用回调，回调内可安全地订阅或注销。
/// - 单个回调 panic 会被捕获并记录，不影响其余回调。
pub struct Subscribers<T: ?Sized> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: ?Sized> Clone for Subscribers<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<T: ?Sized + 'static> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// # Summary
    /// 注册回调。
    ///
    /// # Returns
    /// 返回可用于注销的 `Subscription` 句柄。
    pub fn subscribe(&self, handler: Handler<T>) -> Subscription {
        let id = {
            let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Entry { id, handler });
            id
        };
        let weak: Weak<dyn Unregister> = Arc::downgrade(&self.registry) as Weak<dyn Unregister>;
        Subscription { id, registry: weak }
    }

    /// 向当前全部订阅者投递一条消息，返回成功完成投递的回调数量
    pub fn dispatch(&self, item: &T) -> usize {
        self.dispatch_while(item, || true)
    }

    /// # Summary
    /// 在 `live` 持续成立期间向订阅者投递一条消息。
    ///
    /// # Logic
    /// 1. 持锁复制订阅者快照后立即释放锁。
    /// 2. 依序遍历快照，每次调用回调前复核 `live` 与注册状态；
    ///    `live` 一旦不成立，本批次剩余回调全部跳过。
    /// 3. 通过 `catch_unwind` 隔离回调 panic，记录错误后继续投递。
    ///
    /// # Returns
    /// 成功完成投递的回调数量。
    pub fn dispatch_while(&self, item: &T, live: impl Fn() -> bool) -> usize {
        let snapshot: Vec<(u64, Handler<T>)> = {
            let registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
            registry
                .entries
                .iter()
                .map(|entry| (entry.id, entry.handler.clone()))
                .collect()
        };

        let mut delivered = 0;
        for (id, handler) in snapshot {
            if !live() {
                break;
            }
            if !self.is_registered(id) {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| handler(item))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    error!(
                        subscriber = id,
                        "Subscriber handler panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_registered(&self, id: u64) -> bool {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .iter()
            .any(|entry| entry.id == id)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

/// # Summary
/// 订阅句柄，`unsubscribe` 即注销函数。
///
/// # Invariants
/// - 丢弃句柄不会注销订阅，必须显式调用 `unsubscribe`。
/// - `unsubscribe` 幂等；订阅集合已被释放时为空操作。
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Unregister>,
}

impl Subscription {
    /// 注销订阅。首次成功注销返回 true。
    pub fn unsubscribe(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.unregister(self.id))
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Handler<u32> {
        let log = log.clone();
        Arc::new(move |v: &u32| log.lock().unwrap().push(format!("{name}:{v}")))
    }

    #[test]
    fn test_dispatch_in_subscription_order() {
        let subscribers = Subscribers::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        subscribers.subscribe(recorder(&log, "a"));
        subscribers.subscribe(recorder(&log, "b"));
        subscribers.subscribe(recorder(&log, "c"));

        assert_eq!(subscribers.dispatch(&1), 3);
        assert_eq!(*log.lock().unwrap(), vec!["a:1", "b:1", "c:1"]);
    }

    #[test]
    fn test_self_unsubscribe_during_delivery() {
        let subscribers = Subscribers::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        subscribers.subscribe(recorder(&log, "before"));

        let own: Arc<OnceLock<Subscription>> = Arc::new(OnceLock::new());
        let own_in_handler = own.clone();
        let log_in_handler = log.clone();
        let sub = subscribers.subscribe(Arc::new(move |v: &u32| {
            log_in_handler.lock().unwrap().push(format!("self:{v}"));
            if let Some(sub) = own_in_handler.get() {
                sub.unsubscribe();
            }
        }));
        own.set(sub).unwrap();
        subscribers.subscribe(recorder(&log, "after"));

        subscribers.dispatch(&1);
        subscribers.dispatch(&2);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["before:1", "self:1", "after:1", "before:2", "after:2"]
        );
        assert_eq!(subscribers.len(), 2);
    }

    #[test]
    fn test_unsubscribe_of_later_handler_mid_batch() {
        let subscribers = Subscribers::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let victim: Arc<OnceLock<Subscription>> = Arc::new(OnceLock::new());
        let victim_in_handler = victim.clone();
        subscribers.subscribe(Arc::new(move |_: &u32| {
            if let Some(sub) = victim_in_handler.get() {
                sub.unsubscribe();
            }
        }));
        victim.set(subscribers.subscribe(recorder(&log, "victim"))).unwrap();

        assert_eq!(subscribers.dispatch(&1), 1);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    #[allow(clippy::panic)]
    fn test_panicking_handler_is_isolated() {
        let subscribers = Subscribers::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        subscribers.subscribe(Arc::new(|_: &u32| panic!("boom")));
        subscribers.subscribe(recorder(&log, "ok"));

        assert_eq!(subscribers.dispatch(&7), 1);
        assert_eq!(*log.lock().unwrap(), vec!["ok:7"]);
        // 出错的回调仍保持注册
        assert_eq!(subscribers.len(), 2);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let subscribers = Subscribers::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sub = subscribers.subscribe(recorder(&log, "x"));
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert_eq!(subscribers.dispatch(&1), 0);

        drop(subscribers);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_unsized_payload() {
        let subscribers = Subscribers::<[u32]>::new();
        let total = Arc::new(Mutex::new(0u32));
        let total_in_handler = total.clone();
        subscribers.subscribe(Arc::new(move |items: &[u32]| {
            *total_in_handler.lock().unwrap() += items.iter().sum::<u32>();
        }));
        subscribers.dispatch(&[1, 2, 3][..]);
        assert_eq!(*total.lock().unwrap(), 6);
    }

    #[test]
    fn test_dispatch_stops_once_no_longer_live() {
        let subscribers = Subscribers::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let live = Arc::new(AtomicBool::new(true));

        subscribers.subscribe(recorder(&log, "a"));
        let live_in_handler = live.clone();
        subscribers.subscribe(Arc::new(move |_: &u32| {
            live_in_handler.store(false, Ordering::SeqCst);
        }));
        subscribers.subscribe(recorder(&log, "c"));

        let delivered = subscribers.dispatch_while(&5, || live.load(Ordering::SeqCst));
        assert_eq!(delivered, 2);
        assert_eq!(*log.lock().unwrap(), vec!["a:5"]);

        assert_eq!(subscribers.dispatch_while(&6, || false), 0);
        assert_eq!(*log.lock().unwrap(), vec!["a:5"]);
    }
}
