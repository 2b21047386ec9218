use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::constants::{AMOUNT_DECIMAL_PRECISION, PERCENT_DECIMAL_PRECISION};

use super::dashboard_model::{DashboardRange, PeriodAggregate, ReturnMethod, SeriesPoint};

/// Trims the full ascending series to the requested display window and
/// returns it together with the cumulative net flow of everything before the
/// window start. Computing the windowed series against that baseline keeps
/// net income identical to a full-series computation, whatever the window.
pub fn select_window(
    points: &[PeriodAggregate],
    range: DashboardRange,
) -> (&[PeriodAggregate], Decimal) {
    if points.is_empty() {
        return (points, Decimal::ZERO);
    }

    let start = match range {
        DashboardRange::All => 0,
        DashboardRange::OneYear => points.len().saturating_sub(12),
        DashboardRange::Ytd => {
            let last_year = points[points.len() - 1].period.year;
            points
                .iter()
                .position(|p| p.period.year == last_year)
                .unwrap_or(0)
        }
    };

    let baseline: Decimal = points[..start].iter().map(|p| p.inflow).sum();
    (&points[start..], baseline)
}

/// Derives net income and period returns for an ordered window of
/// aggregates. `baseline_net_flow` is the cumulative net flow contributed
/// before the window start. The first point never carries a return.
pub fn compute_series(
    window: &[PeriodAggregate],
    baseline_net_flow: Decimal,
    method: ReturnMethod,
) -> Vec<SeriesPoint> {
    let mut series: Vec<SeriesPoint> = Vec::with_capacity(window.len());
    let mut cumulative_net_flow = baseline_net_flow;

    for aggregate in window {
        cumulative_net_flow += aggregate.inflow;
        series.push(SeriesPoint {
            period: aggregate.period,
            inflow: aggregate.inflow,
            total_equity: aggregate.total_equity,
            net_income: aggregate.total_equity - cumulative_net_flow,
            return_pct: None,
        });
    }

    let one = Decimal::ONE;
    let two = dec!(2);
    let mut cumulative_twr = one;

    for i in 1..series.len() {
        let prev = series[i - 1];
        let curr = series[i];

        series[i].return_pct = match method {
            ReturnMethod::Simple => {
                if prev.total_equity.is_zero() {
                    None
                } else {
                    let change = curr.total_equity / prev.total_equity - one;
                    Some(round_percentage(change * Decimal::ONE_HUNDRED))
                }
            }
            ReturnMethod::TimeWeighted => {
                if prev.total_equity.is_zero() {
                    None
                } else {
                    let period_return =
                        (curr.net_income - prev.net_income) / prev.total_equity;
                    cumulative_twr *= one + period_return;
                    Some(round_percentage((cumulative_twr - one) * Decimal::ONE_HUNDRED))
                }
            }
            ReturnMethod::MoneyWeighted => {
                // Average invested capital approximation, not an IRR solve.
                let denominator = prev.total_equity + curr.inflow / two;
                if denominator.is_zero() {
                    None
                } else {
                    let gain = curr.total_equity - prev.total_equity - curr.inflow;
                    Some(round_percentage(gain / denominator * Decimal::ONE_HUNDRED))
                }
            }
        };
    }

    series
}

/// Round-half-up on the percentage value itself.
pub(crate) fn round_percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PERCENT_DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::Period;

    fn aggregate(year: i32, month: u32, inflow: Decimal, total_equity: Decimal) -> PeriodAggregate {
        PeriodAggregate {
            period: Period::new(year, month).unwrap(),
            inflow,
            total_equity,
        }
    }

    #[test]
    fn test_net_income_and_simple_return() {
        // Deposit 1000 in January, grow to 1100 by February.
        let points = vec![
            aggregate(2024, 1, dec!(1000), dec!(1000)),
            aggregate(2024, 2, dec!(0), dec!(1100)),
        ];

        let series = compute_series(&points, Decimal::ZERO, ReturnMethod::Simple);
        assert_eq!(series[0].net_income, dec!(0));
        assert_eq!(series[0].return_pct, None);
        assert_eq!(series[1].net_income, dec!(100));
        assert_eq!(series[1].return_pct, Some(dec!(10.00)));
    }

    #[test]
    fn test_simple_return_is_none_on_zero_equity() {
        let points = vec![
            aggregate(2024, 1, dec!(0), dec!(0)),
            aggregate(2024, 2, dec!(1000), dec!(1000)),
        ];
        let series = compute_series(&points, Decimal::ZERO, ReturnMethod::Simple);
        assert_eq!(series[1].return_pct, None);
    }

    #[test]
    fn test_time_weighted_return_chains_across_flows() {
        // 10% gain in February, then another 100 of gains on top of a 500
        // deposit in March: TWR keeps compounding at ~10% per period
        // regardless of the deposit size.
        let points = vec![
            aggregate(2024, 1, dec!(1000), dec!(1000)),
            aggregate(2024, 2, dec!(0), dec!(1100)),
            aggregate(2024, 3, dec!(500), dec!(1700)),
        ];

        let series = compute_series(&points, Decimal::ZERO, ReturnMethod::TimeWeighted);
        assert_eq!(series[1].return_pct, Some(dec!(10.00)));
        // (1 + 0.10) * (1 + 100/1100) - 1 = 0.20
        assert_eq!(series[2].return_pct, Some(dec!(20.00)));
    }

    #[test]
    fn test_money_weighted_return_uses_average_invested_capital() {
        let points = vec![
            aggregate(2024, 1, dec!(1000), dec!(1000)),
            aggregate(2024, 2, dec!(1000), dec!(2100)),
        ];

        let series = compute_series(&points, Decimal::ZERO, ReturnMethod::MoneyWeighted);
        // gain = 2100 - 1000 - 1000 = 100, capital = 1000 + 1000/2 = 1500
        assert_eq!(series[1].return_pct, Some(dec!(6.67)));
    }

    #[test]
    fn test_money_weighted_return_is_none_on_zero_denominator() {
        let points = vec![
            aggregate(2024, 1, dec!(0), dec!(0)),
            aggregate(2024, 2, dec!(0), dec!(50)),
        ];
        let series = compute_series(&points, Decimal::ZERO, ReturnMethod::MoneyWeighted);
        assert_eq!(series[1].return_pct, None);
    }

    #[test]
    fn test_one_year_window_keeps_last_twelve_points() {
        let points: Vec<PeriodAggregate> = (1..=12)
            .map(|m| aggregate(2023, m, dec!(10), dec!(100)))
            .chain((1..=6).map(|m| aggregate(2024, m, dec!(10), dec!(100))))
            .collect();

        let (window, baseline) = select_window(&points, DashboardRange::OneYear);
        assert_eq!(window.len(), 12);
        assert_eq!(window[0].period, Period::new(2023, 7).unwrap());
        // Six months of 10 fell before the window.
        assert_eq!(baseline, dec!(60));
    }

    #[test]
    fn test_ytd_window_starts_at_calendar_year() {
        let points = vec![
            aggregate(2023, 11, dec!(10), dec!(100)),
            aggregate(2023, 12, dec!(10), dec!(110)),
            aggregate(2024, 1, dec!(10), dec!(120)),
            aggregate(2024, 3, dec!(10), dec!(130)),
        ];

        let (window, baseline) = select_window(&points, DashboardRange::Ytd);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].period.year, 2024);
        assert_eq!(baseline, dec!(20));
    }

    #[test]
    fn test_windowing_preserves_net_income() {
        // Net income inside the window must be identical whether the series
        // is computed in full and sliced, or windowed first and computed
        // against the carried baseline.
        let points: Vec<PeriodAggregate> = (0..24)
            .map(|i| {
                let year = 2022 + i / 12;
                let month = (i % 12) + 1;
                aggregate(
                    year,
                    month as u32,
                    Decimal::from(100 + i * 7),
                    Decimal::from(1000 + i * 150),
                )
            })
            .collect();

        let full = compute_series(&points, Decimal::ZERO, ReturnMethod::Simple);
        let (window, baseline) = select_window(&points, DashboardRange::OneYear);
        let windowed = compute_series(window, baseline, ReturnMethod::Simple);

        let sliced = &full[full.len() - windowed.len()..];
        for (sliced_point, windowed_point) in sliced.iter().zip(windowed.iter()) {
            assert_eq!(sliced_point.period, windowed_point.period);
            assert_eq!(sliced_point.net_income, windowed_point.net_income);
        }
    }

    #[test]
    fn test_empty_series() {
        let (window, baseline) = select_window(&[], DashboardRange::Ytd);
        assert!(window.is_empty());
        assert_eq!(baseline, Decimal::ZERO);
        assert!(compute_series(window, baseline, ReturnMethod::Simple).is_empty());
    }
}
