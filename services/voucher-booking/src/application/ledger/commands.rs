//! 账本命令

use chrono::NaiveDate;
use serde::Deserialize;
use voyage_domain_core::{HotelType, Money, TourType, TransferType, Voucher};
use voyage_errors::{AppError, AppResult};

/// 新建代金券
#[derive(Debug, Clone, Deserialize)]
pub struct NewVoucher {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub tour_type: TourType,
    pub transfer_type: TransferType,
    pub hotel_type: HotelType,
    pub arrival_date: Option<NaiveDate>,
    pub eviction_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_hot: bool,
}

impl NewVoucher {
    pub(crate) fn into_voucher(self) -> AppResult<Voucher> {
        validate_title(&self.title)?;
        validate_dates(self.arrival_date, self.eviction_date)?;

        let mut voucher = Voucher::new(
            self.title,
            self.price,
            self.tour_type,
            self.transfer_type,
            self.hotel_type,
        );
        voucher.description = self.description;
        voucher.arrival_date = self.arrival_date;
        voucher.eviction_date = self.eviction_date;
        voucher.is_hot = self.is_hot;
        Ok(voucher)
    }
}

/// 修改代金券描述性字段
///
/// 状态与持有人只能经由下单和状态流转修改。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoucherPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub tour_type: Option<TourType>,
    pub transfer_type: Option<TransferType>,
    pub hotel_type: Option<HotelType>,
    pub arrival_date: Option<NaiveDate>,
    pub eviction_date: Option<NaiveDate>,
    pub is_hot: Option<bool>,
}

impl VoucherPatch {
    pub(crate) fn apply(self, voucher: &mut Voucher) -> AppResult<()> {
        if let Some(title) = self.title {
            validate_title(&title)?;
            voucher.title = title;
        }
        if let Some(description) = self.description {
            voucher.description = description;
        }
        if let Some(price) = self.price {
            voucher.price = price;
        }
        if let Some(tour_type) = self.tour_type {
            voucher.tour_type = tour_type;
        }
        if let Some(transfer_type) = self.transfer_type {
            voucher.transfer_type = transfer_type;
        }
        if let Some(hotel_type) = self.hotel_type {
            voucher.hotel_type = hotel_type;
        }
        if self.arrival_date.is_some() {
            voucher.arrival_date = self.arrival_date;
        }
        if self.eviction_date.is_some() {
            voucher.eviction_date = self.eviction_date;
        }
        if let Some(is_hot) = self.is_hot {
            voucher.is_hot = is_hot;
        }
        validate_dates(voucher.arrival_date, voucher.eviction_date)
    }
}

/// 状态流转请求；两个字段互相独立
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusRequest {
    /// 目标状态（原样字符串，如 `CANCELED`）
    pub status: Option<String>,
    pub is_hot: Option<bool>,
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::validation("Voucher title must not be blank"));
    }
    Ok(())
}

fn validate_dates(arrival: Option<NaiveDate>, eviction: Option<NaiveDate>) -> AppResult<()> {
    if let (Some(arrival), Some(eviction)) = (arrival, eviction) {
        if eviction < arrival {
            return Err(AppError::validation(
                "Eviction date must not be before arrival date",
            ));
        }
    }
    Ok(())
}
