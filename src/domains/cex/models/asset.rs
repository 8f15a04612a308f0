use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::errors::ExchangeError;

// =====================================================
// Asset 모델
// =====================================================
// 역할: 거래소가 다루는 두 자산을 나타냄
//
// - Base: 사고파는 자산 (예: BTC)
// - Quote: 가격을 매기는 자산 (예: USDT)
//
// 실제 심볼(BTC, USDT)은 설정에서 주입되며, 엔진 내부에서는
// 항상 Base/Quote 두 값만 사용합니다.
// =====================================================

/// 자산 구분 (기준 자산 / 호가 자산)
/// Asset kind (base / quote)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    /// 기준 자산 (예: BTC)
    Base,
    /// 호가 자산 (예: USDT)
    Quote,
}

impl Asset {
    pub const ALL: [Asset; 2] = [Asset::Base, Asset::Quote];

    /// DB 저장용 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Base => "base",
            Asset::Quote => "quote",
        }
    }

    /// users 테이블의 잔고 컬럼명
    /// Balance column name in the users table
    pub fn balance_column(&self) -> &'static str {
        match self {
            Asset::Base => "base_available",
            Asset::Quote => "quote_available",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Asset {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Asset::Base),
            "quote" => Ok(Asset::Quote),
            other => Err(ExchangeError::Persistence(anyhow::anyhow!(
                "unknown asset column value: {}",
                other
            ))),
        }
    }
}

/// 자산 심볼 설정
/// Asset symbols (e.g. BTC / USDT)
///
/// HTTP 요청에서 들어오는 심볼 문자열을 `Asset`으로 변환하고,
/// 응답에서는 `Asset`을 다시 심볼로 표시합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSymbols {
    pub base: String,
    pub quote: String,
}

impl AssetSymbols {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    pub fn symbol(&self, asset: Asset) -> &str {
        match asset {
            Asset::Base => &self.base,
            Asset::Quote => &self.quote,
        }
    }

    /// 심볼 → Asset (대소문자 무시)
    /// Resolve a symbol such as "btc" or "USDT"
    pub fn resolve(&self, symbol: &str) -> Option<Asset> {
        if symbol.eq_ignore_ascii_case(&self.base) {
            Some(Asset::Base)
        } else if symbol.eq_ignore_ascii_case(&self.quote) {
            Some(Asset::Quote)
        } else {
            None
        }
    }
}

impl Default for AssetSymbols {
    fn default() -> Self {
        Self::new("BTC", "USDT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_insensitive() {
        let symbols = AssetSymbols::default();
        assert_eq!(symbols.resolve("btc"), Some(Asset::Base));
        assert_eq!(symbols.resolve("USDT"), Some(Asset::Quote));
        assert_eq!(symbols.resolve("ETH"), None);
    }

    #[test]
    fn test_unknown_asset_column_is_persistence_error() {
        let err = "sol".parse::<Asset>().unwrap_err();
        assert!(matches!(err, ExchangeError::Persistence(_)));
    }
}
