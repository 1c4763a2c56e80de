//! 代金券列表过滤与排序

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use voyage_common::{PrincipalId, VoucherId};

use crate::{HotelType, Money, TourType, TransferType, Voucher, VoucherStatus};

/// 列表过滤条件
///
/// 所有字段为空（或空集合）时视为默认查询。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoucherFilter {
    pub statuses: Option<Vec<VoucherStatus>>,
    pub tours: Option<Vec<TourType>>,
    pub transfers: Option<Vec<TransferType>>,
    pub hotels: Option<Vec<HotelType>>,
    pub is_hot: Option<bool>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub title: Option<String>,
    pub voucher_id: Option<VoucherId>,
}

fn populated<T>(values: &Option<Vec<T>>) -> Option<&[T]> {
    values.as_deref().filter(|v| !v.is_empty())
}

impl VoucherFilter {
    pub fn is_empty(&self) -> bool {
        populated(&self.statuses).is_none()
            && populated(&self.tours).is_none()
            && populated(&self.transfers).is_none()
            && populated(&self.hotels).is_none()
            && self.is_hot.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.title.as_deref().is_none_or(str::is_empty)
            && self.voucher_id.is_none()
    }

    pub fn matches(&self, voucher: &Voucher) -> bool {
        if let Some(statuses) = populated(&self.statuses) {
            if !statuses.contains(&voucher.status) {
                return false;
            }
        }
        if let Some(tours) = populated(&self.tours) {
            if !tours.contains(&voucher.tour_type) {
                return false;
            }
        }
        if let Some(transfers) = populated(&self.transfers) {
            if !transfers.contains(&voucher.transfer_type) {
                return false;
            }
        }
        if let Some(hotels) = populated(&self.hotels) {
            if !hotels.contains(&voucher.hotel_type) {
                return false;
            }
        }
        if let Some(is_hot) = self.is_hot {
            if voucher.is_hot != is_hot {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if voucher.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if voucher.price > max {
                return false;
            }
        }
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            if !voucher
                .title
                .to_lowercase()
                .contains(&title.to_lowercase())
            {
                return false;
            }
        }
        if let Some(id) = self.voucher_id {
            if voucher.id != id {
                return false;
            }
        }
        true
    }
}

/// 列表范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingScope {
    /// 公开目录：只含未售出的 CREATED 代金券
    Catalog,
    /// 某个用户持有的代金券
    Owner(PrincipalId),
    /// 管理视图：全部代金券
    Admin,
}

impl ListingScope {
    pub fn admits(&self, voucher: &Voucher) -> bool {
        match self {
            Self::Catalog => voucher.status == VoucherStatus::Created,
            Self::Owner(owner) => voucher.owner == Some(*owner),
            Self::Admin => true,
        }
    }

    pub fn compare(&self, a: &Voucher, b: &Voucher) -> Ordering {
        match self {
            Self::Catalog => b
                .is_hot
                .cmp(&a.is_hot)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.title.cmp(&b.title)),
            Self::Owner(_) => a.status.cmp(&b.status).then_with(|| a.title.cmp(&b.title)),
            Self::Admin => b
                .is_hot
                .cmp(&a.is_hot)
                .then_with(|| a.status.cmp(&b.status))
                .then_with(|| a.title.cmp(&b.title)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn voucher(title: &str, price: u64, hot: bool) -> Voucher {
        let mut v = Voucher::new(
            title,
            Money::from_units(price),
            TourType::Leisure,
            TransferType::Plane,
            HotelType::ThreeStars,
        );
        v.is_hot = hot;
        v
    }

    #[test]
    fn test_empty_collections_do_not_count_as_filters() {
        let filter = VoucherFilter {
            statuses: Some(vec![]),
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.is_empty());

        let filter = VoucherFilter {
            is_hot: Some(false),
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_price_range_and_title() {
        let filter = VoucherFilter {
            min_price: Some(Money::from_units(5)),
            max_price: Some(Money::from_units(20)),
            title: Some("BEACH".to_string()),
            ..Default::default()
        };

        assert!(filter.matches(&voucher("Sunny beach", 10, false)));
        assert!(!filter.matches(&voucher("Sunny beach", 25, false)));
        assert!(!filter.matches(&voucher("Mountain hut", 10, false)));
    }

    #[test]
    fn test_catalog_order_hot_then_newest() {
        let mut old_hot = voucher("b", 1, true);
        old_hot.created_at = Utc::now() - Duration::days(2);
        let new_cold = voucher("a", 1, false);
        let new_hot = voucher("c", 1, true);

        let mut items = vec![new_cold.clone(), old_hot.clone(), new_hot.clone()];
        items.sort_by(|a, b| ListingScope::Catalog.compare(a, b));

        let titles: Vec<_> = items.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_owner_scope_admits_only_owned() {
        let owner = PrincipalId::new();
        let mut owned = voucher("mine", 1, false);
        owned.assign_to(owner);
        let unowned = voucher("free", 1, false);

        assert!(ListingScope::Owner(owner).admits(&owned));
        assert!(!ListingScope::Owner(owner).admits(&unowned));
        assert!(!ListingScope::Catalog.admits(&owned));
        assert!(ListingScope::Admin.admits(&owned));
    }
}
