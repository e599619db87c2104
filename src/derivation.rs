//! The fixed arithmetic that turns the raw fields of a sale into its charges and total.
//!
//! Everything here is pure so that the create, update and preview routes all
//! agree on the numbers that are shown and the numbers that are stored.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The per-bag weight deduction used when the client does not provide one.
pub const DEFAULT_KAPAT_PER_BAG: f64 = 1.75;

/// The rate is quoted per this many units of net weight.
pub const RATE_UNIT_WEIGHT: f64 = 20.0;

/// The commission charged on the net amount, as a percentage.
pub const COMMISSION_PERCENT: f64 = 1.25;

/// The bardan (sacking) market charge per bag.
pub const BARDAN_MARKET_PER_BAG: f64 = 15.0;

/// The tolai (weighing) charge per bag.
pub const TOLAI_PER_BAG: f64 = 2.0;

/// The market fee per bag.
pub const MARKET_FEE_PER_BAG: f64 = 3.0;

/// The numeric fields of a sale that the derived fields are computed from.
///
/// Values are expected to be non-negative but this is not enforced: a gross
/// weight smaller than the kapat simply yields a negative net weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivationInputs {
    /// Price per [RATE_UNIT_WEIGHT] units of net weight.
    pub rate: f64,
    /// Number of bags.
    pub bag: i64,
    /// Weight before the per-bag deduction.
    pub gross_weight: f64,
    /// Weight deducted for each bag.
    pub kapat_per_bag: f64,
}

/// The fields computed from [DerivationInputs].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFields {
    /// Total weight deducted for the bags, `kapat_per_bag * bag`.
    pub kapat: f64,
    /// `gross_weight - kapat`.
    pub net_weight: f64,
    /// `rate * net_weight / 20`.
    pub net_amount: f64,
    /// 1.25% of the net amount.
    pub commission: f64,
    /// `bag * 15`.
    pub bardan_market: f64,
    /// `bag * 2`.
    pub tolai: f64,
    /// `bag * 3`.
    pub market_fee: f64,
    /// The net amount plus every charge.
    pub total: f64,
}

/// Compute the derived fields of a sale.
pub fn derive(inputs: &DerivationInputs) -> DerivedFields {
    let bag = inputs.bag as f64;

    let kapat = inputs.kapat_per_bag * bag;
    let net_weight = inputs.gross_weight - kapat;
    let net_amount = inputs.rate * net_weight / RATE_UNIT_WEIGHT;
    let commission = net_amount * COMMISSION_PERCENT / 100.0;
    let bardan_market = bag * BARDAN_MARKET_PER_BAG;
    let tolai = bag * TOLAI_PER_BAG;
    let market_fee = bag * MARKET_FEE_PER_BAG;
    let total = net_amount + commission + bardan_market + tolai + market_fee;

    DerivedFields {
        kapat,
        net_weight,
        net_amount,
        commission,
        bardan_market,
        tolai,
        market_fee,
        total,
    }
}

impl DerivedFields {
    /// The JSON name of the first field that is infinite or NaN, if any.
    fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("kapat", self.kapat),
            ("netWeight", self.net_weight),
            ("netAmount", self.net_amount),
            ("commission", self.commission),
            ("bardanMarket", self.bardan_market),
            ("tolai", self.tolai),
            ("marketFee", self.market_fee),
            ("total", self.total),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(field, _)| field)
    }
}

/// Compute the derived fields of a sale that is about to be shown or stored.
///
/// Finite inputs can still overflow, e.g. a kapat per bag near [f64::MAX].
/// Such results cannot be stored or sent as JSON numbers.
///
/// # Errors
///
/// Returns an [Error::Validation] naming the first derived field that is not finite.
pub fn derive_checked(inputs: &DerivationInputs) -> Result<DerivedFields, Error> {
    let derived = derive(inputs);

    match derived.first_non_finite() {
        Some(field) => Err(Error::Validation(format!("{field} is too large"))),
        None => Ok(derived),
    }
}
