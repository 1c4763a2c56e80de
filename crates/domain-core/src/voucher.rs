//! 代金券实体

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use voyage_common::{PrincipalId, VoucherId};

use crate::{Money, UnknownVariant};

/// 代金券状态
///
/// 声明顺序即排序顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoucherStatus {
    Created,
    Registered,
    Paid,
    Canceled,
}

impl VoucherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Registered => "REGISTERED",
            Self::Paid => "PAID",
            Self::Canceled => "CANCELED",
        }
    }

    /// 该状态下代金券必须有持有人
    pub fn requires_owner(&self) -> bool {
        matches!(self, Self::Registered | Self::Paid)
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoucherStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(Self::Created),
            "REGISTERED" => Ok(Self::Registered),
            "PAID" => Ok(Self::Paid),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(UnknownVariant {
                kind: "voucher status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TourType {
    Health,
    Sports,
    Leisure,
    Safari,
    Wine,
    Eco,
    Adventure,
    Cultural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferType {
    Bus,
    Train,
    Plane,
    Ship,
    Private,
    Jeeps,
    Minibus,
    Elephants,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HotelType {
    OneStar,
    TwoStars,
    ThreeStars,
    FourStars,
    FiveStars,
}

/// 代金券实体
///
/// 不变量：当且仅当状态为 REGISTERED 或 PAID 时 `owner` 非空。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
    pub title: String,
    pub description: String,
    pub price: Money,
    pub tour_type: TourType,
    pub transfer_type: TransferType,
    pub hotel_type: HotelType,
    pub status: VoucherStatus,
    pub arrival_date: Option<NaiveDate>,
    pub eviction_date: Option<NaiveDate>,
    pub owner: Option<PrincipalId>,
    pub is_hot: bool,
    pub created_at: DateTime<Utc>,
}

impl Voucher {
    pub fn new(
        title: impl Into<String>,
        price: Money,
        tour_type: TourType,
        transfer_type: TransferType,
        hotel_type: HotelType,
    ) -> Self {
        Self {
            id: VoucherId::new(),
            title: title.into(),
            description: String::new(),
            price,
            tour_type,
            transfer_type,
            hotel_type,
            status: VoucherStatus::Created,
            arrival_date: None,
            eviction_date: None,
            owner: None,
            is_hot: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owner.is_some()
    }

    /// 分配给持有人并登记
    pub fn assign_to(&mut self, owner: PrincipalId) {
        self.owner = Some(owner);
        self.status = VoucherStatus::Registered;
    }

    /// 解除持有关系，返回原持有人
    pub fn detach(&mut self) -> Option<PrincipalId> {
        self.owner.take()
    }

    pub fn is_consistent(&self) -> bool {
        self.owner.is_some() == self.status.requires_owner()
    }
}
