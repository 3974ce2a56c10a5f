/// # Summary
/// 固定容量的滚动环形缓冲区，用于实时行情窗口。
///
/// # Invariants
/// - 内存空间在初始化时一次性分配，后续不再扩容。
/// - 始终保持最近 N 个元素，满载后按先进先出覆盖最旧元素。
/// - 容量至少为 1。
#[derive(Debug, Clone)]
pub struct RollingBuffer<T> {
    // 内部存储容器
    data: Vec<T>,
    // 最大容量
    capacity: usize,
    // 满载后下一次覆盖的位置，同时也是最旧元素的位置
    cursor: usize,
}

impl<T: Clone> RollingBuffer<T> {
    /// # Summary
    /// 创建一个新的滚动缓冲区。
    ///
    /// # Arguments
    /// * `capacity`: 固定容量上限，传入 0 时按 1 处理。
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// # Summary
    /// 向缓冲区推送新元素。
    ///
    /// # Logic
    /// 1. 未满时直接 push。
    /// 2. 已满时覆盖 cursor 处的最旧元素，并递增（取模）cursor。
    pub fn push(&mut self, item: T) {
        if self.data.len() < self.capacity {
            self.data.push(item);
        } else {
            self.data[self.cursor] = item;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    /// 最新插入的元素
    pub fn last(&self) -> Option<&T> {
        if self.data.len() < self.capacity {
            self.data.last()
        } else {
            let last_idx = (self.cursor + self.capacity - 1) % self.capacity;
            self.data.get(last_idx)
        }
    }

    /// 按插入顺序遍历，从最旧到最新
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        let (newer, older) = self.data.split_at(self.cursor);
        older.iter().chain(newer.iter())
    }

    /// # Summary
    /// 获取按插入顺序排序的完整数据列表。
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.cursor = 0;
    }
}
