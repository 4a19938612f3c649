use std::collections::VecDeque;

/// 容量固定的最近使用列表，按加入顺序保存，满时淘汰最早的一项。
#[derive(Debug, Clone)]
pub struct RecentItems<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T: PartialEq> RecentItems<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// 加入新项；已存在的项不会重复加入。返回是否实际加入。
    pub fn add(&mut self, item: T) -> bool {
        if self.capacity == 0 || self.items.contains(&item) {
            return false;
        }
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
        true
    }

    /// 索引 0 为最早的一项，越界时返回 `None`。
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
