//! 通用类型定义

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::new_id;

/// 用户（Principal）ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[display("{_0}")]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

/// 代金券 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[display("{_0}")]
pub struct VoucherId(pub Uuid);

impl VoucherId {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for VoucherId {
    fn default() -> Self {
        Self::new()
    }
}

/// 分页参数（页码从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// 跳过的条数；在 u64 中计算，两个 u32 的乘积不会溢出
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// 对已排序的完整结果集切片
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.page_size as usize)
            .cloned()
            .collect()
    }
}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset_and_slice() {
        let items: Vec<u32> = (1..=7).collect();

        let first = Pagination::new(1, 3);
        assert_eq!(first.offset(), 0);
        assert_eq!(first.slice(&items), vec![1, 2, 3]);

        let last = Pagination::new(3, 3);
        assert_eq!(last.offset(), 6);
        assert_eq!(last.slice(&items), vec![7]);

        let beyond = Pagination::new(4, 3);
        assert!(beyond.slice(&items).is_empty());
    }

    #[test]
    fn test_huge_page_yields_empty_slice() {
        let items: Vec<u32> = (1..=7).collect();

        let huge = Pagination::new(u32::MAX, u32::MAX);
        assert_eq!(huge.offset(), u64::from(u32::MAX - 1) * u64::from(u32::MAX));
        assert!(huge.slice(&items).is_empty());

        let far = Pagination::new(100_000, 100_000);
        assert!(far.slice(&items).is_empty());
    }

    #[test]
    fn test_total_pages() {
        let page = PagedResult::new(vec![1, 2], 7, &Pagination::new(1, 3));
        assert_eq!(page.total_pages(), 3);

        let empty: PagedResult<u32> = PagedResult::new(vec![], 0, &Pagination::new(1, 3));
        assert_eq!(empty.total_pages(), 0);
    }

    #[test]
    fn test_id_parse_roundtrip() {
        let id = PrincipalId::new();
        assert_eq!(PrincipalId::parse(&id.to_string()).unwrap(), id);
        assert!(VoucherId::parse("not-a-uuid").is_err());
    }
}
