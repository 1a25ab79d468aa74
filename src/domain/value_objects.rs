use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// 氏名・物件タイトル・呼び出し元IDの最大文字数
pub const MAX_TEXT_LEN: usize = 255;

/// CIN・カテゴリ名の最大文字数
pub const MAX_CODE_LEN: usize = 64;

/// 文字数（バイト数ではない）の上限を確認する
pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("must be at most {} characters (got {})", max, len),
        });
    }
    Ok(())
}

/// 物件ID - 予約対象となる掲載物件（Post）の集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(Uuid);

impl PostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 予約ID - コミット時に台帳が採番する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 呼び出し元ID - 認証済みの呼び出し元コンテキスト
///
/// 認証層が発行したものをそのまま信頼する（ここでは検証しない）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// ヘッダーなど外部から受け取った値を長さだけ確認して取り込む
    pub fn parse(raw: &str, field: &'static str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        check_length(field, trimmed, MAX_TEXT_LEN)?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 顧客氏名（fullName）
///
/// 不変条件：前後の空白を除いて空でなく、`MAX_TEXT_LEN`文字以内
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerName(String);

impl CustomerName {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingRequiredField("fullName"));
        }
        check_length("fullName", trimmed, MAX_TEXT_LEN)?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 国民ID番号（CIN）
///
/// 形式は国ごとに異なるため中身は解釈せず、空でないことと長さのみ保証する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cin(String);

impl Cin {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingRequiredField("CIN"));
        }
        check_length("CIN", trimmed, MAX_CODE_LEN)?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 価格
///
/// 不変条件：有限かつ0以上
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidField {
                field: "price",
                reason: format!("price must be a non-negative number, got {}", value),
            });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// 予約期間 `[start, end)`
///
/// 半開区間。終了日は含まないため、ある予約の終了日に次の予約を開始できる。
/// 不変条件：start < end（型で保証し、不正な期間は作成できない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// `[a1,a2)` と `[b1,b2)` は a1 < b2 かつ b1 < a2 のとき重なる
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// 物件カテゴリ
///
/// オープンな集合。`Location`（賃貸）のみ期間付き予約となり、
/// それ以外は一度きりの予約（売買など）として扱う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Location,
    Vente,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Location => "Location",
            Category::Vente => "Vente",
            Category::Other(name) => name,
        }
    }

    /// 期間付き予約が必要か
    pub fn requires_date_range(&self) -> bool {
        matches!(self, Category::Location)
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(if trimmed.eq_ignore_ascii_case("location") {
            Category::Location
        } else if trimmed.eq_ignore_ascii_case("vente") {
            Category::Vente
        } else {
            Category::Other(trimmed.to_string())
        })
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 物件ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// 予約受付中
    Available,
    /// 賃貸で有効な予約が1件以上ある
    Reserved,
    /// 売買などで予約済み（一度きり）
    Taken,
    /// 掲載停止中
    Unavailable,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Available => "available",
            PostStatus::Reserved => "reserved",
            PostStatus::Taken => "taken",
            PostStatus::Unavailable => "unavailable",
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(PostStatus::Available),
            "reserved" => Ok(PostStatus::Reserved),
            "taken" => Ok(PostStatus::Taken),
            "unavailable" => Ok(PostStatus::Unavailable),
            _ => Err(format!("Invalid post status: {}", s)),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 予約の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationState {
    Pending,
    Committed,
    Cancelled,
}

impl ReservationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Pending => "pending",
            ReservationState::Committed => "committed",
            ReservationState::Cancelled => "cancelled",
        }
    }

    /// 取消されていない予約は有効とみなす
    pub fn is_active(&self) -> bool {
        !matches!(self, ReservationState::Cancelled)
    }
}

impl FromStr for ReservationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReservationState::Pending),
            "committed" => Ok(ReservationState::Committed),
            "cancelled" => Ok(ReservationState::Cancelled),
            _ => Err(format!("Invalid reservation state: {}", s)),
        }
    }
}
