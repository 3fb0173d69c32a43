//! # 金額
//!
//! 金額はセント単位の符号付き整数（`i64`）で表現する。
//! 浮動小数点の丸め誤差を避けるため、入力文字列は直接セントへ変換する。
//!
//! 正の値は入金（credit）、負の値は出金（debit）を表す。
//!
//! ## 書式
//!
//! | 入力 | セント |
//! |------|--------|
//! | `"50"` | 5000 |
//! | `"50.5"` | 5050 |
//! | `"-20.00"` | -2000 |
//! | `"1,234.56"` | 123456 |
//!
//! 表示は `$1,234.56` / `-$20.00` の形式。

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// 金額（値オブジェクト、セント単位）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    /// セント数から金額を作成する
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// 文字列表現から金額を作成する
    ///
    /// 先頭の符号（`+` / `-`）と `$`、3 桁ごとのカンマを受け付ける。
    /// 小数部は 2 桁まで。
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::Validation(format!("金額の形式が不正です: {input}"));

        let trimmed = input.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);

        let (units_str, decimal_str) = match rest.split_once('.') {
            Some((units, decimals)) => (units, decimals),
            None => (rest, ""),
        };

        if units_str.is_empty() && decimal_str.is_empty() {
            return Err(invalid());
        }

        let units_digits = strip_thousands_separators(units_str).ok_or_else(invalid)?;

        if decimal_str.len() > 2 {
            return Err(DomainError::Validation(format!(
                "金額の小数部は 2 桁以内である必要があります: {input}"
            )));
        }
        if !decimal_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = if units_digits.is_empty() {
            0
        } else {
            units_digits.parse().map_err(|_| invalid())?
        };
        let decimal_cents: i64 = match decimal_str.len() {
            0 => 0,
            1 => decimal_str.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => decimal_str.parse().map_err(|_| invalid())?,
        };

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(decimal_cents))
            .ok_or_else(|| DomainError::Validation(format!("金額が大きすぎます: {input}")))?;

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// セント数を取得する
    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// 入金（正の金額）か
    pub const fn is_credit(self) -> bool {
        self.0 > 0
    }

    /// 絶対値
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// オーバーフローを検出する加算
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

/// 整数部のカンマ区切りを検証して数字だけを返す
///
/// カンマを含む場合は先頭グループが 1〜3 桁、以降が 3 桁ずつであること。
fn strip_thousands_separators(units: &str) -> Option<String> {
    if !units.contains(',') {
        return units
            .chars()
            .all(|c| c.is_ascii_digit())
            .then(|| units.to_string());
    }

    let mut groups = units.split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !first.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs_cents = self.0.unsigned_abs();
        let units = (abs_cents / 100).to_string();
        let remainder = abs_cents % 100;

        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, c) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        write!(f, "{sign}${grouped}.{remainder:02}")
    }
}
