// =====================================================
// Matcher - 주문 매칭 로직
// =====================================================
// 역할: 미체결 매수/매도 주문 스냅샷에서 체결 가능한 쌍을 찾음
//
// 핵심 알고리즘 (Price-Time Priority):
// 1. 가격 우선: 가장 높은 매수가 vs 가장 낮은 매도가
// 2. 시간 우선: 같은 가격이면 먼저 온 주문 (created_at)
// 3. 같은 시간이면 낮은 주문 ID
//
// 처리 흐름:
// 1. 양쪽을 우선순위대로 정렬
// 2. 두 포인터로 최선 매수가 >= 최선 매도가인 동안 교차
// 3. qty = min(남은 매수량, 남은 매도량), 체결가 = 매수 지정가
// 4. 수량이 0이 된 쪽은 filled + completed_at, 포인터 이동
// 5. 최선 매수가 < 최선 매도가가 되면 종료 (이후 쌍은 교차 불가)
//
// I/O 없음. DB 트랜잭션 안에서 스냅샷으로만 호출됩니다.
// =====================================================

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domains::cex::models::{MatchCreate, Order, OrderStatus};

/// 매수 우선순위: 가격 내림차순 → created_at → id
pub fn buy_priority(a: &Order, b: &Order) -> Ordering {
    b.price
        .cmp(&a.price)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// 매도 우선순위: 가격 오름차순 → created_at → id
pub fn sell_priority(a: &Order, b: &Order) -> Ordering {
    a.price
        .cmp(&b.price)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// 매칭 결과
/// Output of one matching pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// 교차 순서대로의 체결 목록
    pub matches: Vec<MatchCreate>,
    /// 수량/상태가 바뀐 주문 (부분 체결 포함)
    pub updated_orders: Vec<Order>,
}

impl MatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// 매칭 엔진
/// Pure price-time priority crossing over an order snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher;

impl Matcher {
    /// 새 Matcher 생성
    pub fn new() -> Self {
        Self
    }

    /// 매칭 실행
    ///
    /// # Arguments
    /// * `buy_orders` - 미체결 매수 주문 (순서 무관, 내부에서 정렬)
    /// * `sell_orders` - 미체결 매도 주문
    /// * `now` - 체결 시각 (matched_at / completed_at)
    ///
    /// # Returns
    /// 체결 목록과 바뀐 주문들
    pub fn match_orders(
        &self,
        mut buy_orders: Vec<Order>,
        mut sell_orders: Vec<Order>,
        now: DateTime<Utc>,
    ) -> MatchOutcome {
        buy_orders.sort_by(buy_priority);
        sell_orders.sort_by(sell_priority);

        let mut buy_touched = vec![false; buy_orders.len()];
        let mut sell_touched = vec![false; sell_orders.len()];
        let mut matches = Vec::new();

        let (mut i, mut j) = (0, 0);
        while i < buy_orders.len() && j < sell_orders.len() {
            let buy = &buy_orders[i];
            let sell = &sell_orders[j];

            // 최선 매수가 < 최선 매도가: 남은 어떤 쌍도 교차하지 않음
            if buy.price < sell.price {
                break;
            }

            let quantity = buy.quantity.min(sell.quantity);
            matches.push(MatchCreate {
                buy_order_id: buy.id,
                sell_order_id: sell.id,
                price: buy.price,
                quantity,
                matched_at: now,
            });

            buy_touched[i] = true;
            sell_touched[j] = true;

            if Self::apply_fill(&mut buy_orders[i], quantity, now) {
                i += 1;
            }
            if Self::apply_fill(&mut sell_orders[j], quantity, now) {
                j += 1;
            }
        }

        let updated_orders = Self::collect_touched(buy_orders, &buy_touched)
            .chain(Self::collect_touched(sell_orders, &sell_touched))
            .collect();

        MatchOutcome {
            matches,
            updated_orders,
        }
    }

    /// 체결 수량 차감. 전량 체결되면 true
    fn apply_fill(order: &mut Order, quantity: Decimal, now: DateTime<Utc>) -> bool {
        order.quantity -= quantity;
        order.updated_at = now;

        if order.quantity.is_zero() {
            order.status = OrderStatus::Filled;
            order.completed_at = Some(now);
            true
        } else {
            // 남은 수량이 있으면 완료 시각은 항상 비움
            order.completed_at = None;
            false
        }
    }

    fn collect_touched(orders: Vec<Order>, touched: &[bool]) -> impl Iterator<Item = Order> + '_ {
        orders
            .into_iter()
            .zip(touched.iter())
            .filter(|(_, touched)| **touched)
            .map(|(order, _)| order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::domains::cex::models::OrderSide;

    fn create_test_order(id: u64, user_id: u64, side: OrderSide, price: i64, quantity: i64, age_secs: i64) -> Order {
        let created_at = Utc::now() - Duration::seconds(age_secs);
        Order {
            id,
            user_id,
            side,
            asset: "BTC".to_string(),
            price: Decimal::new(price, 0),
            quantity: Decimal::new(quantity, 0),
            status: OrderStatus::Open,
            created_at,
            updated_at: created_at,
            completed_at: None,
            deleted_at: None,
        }
    }

    fn find(outcome: &MatchOutcome, id: u64) -> &Order {
        outcome.updated_orders.iter().find(|o| o.id == id).unwrap()
    }

    #[test]
    fn test_full_fill_at_equal_price() {
        let matcher = Matcher::new();
        let buys = vec![create_test_order(1, 100, OrderSide::Buy, 10, 5, 10)];
        let sells = vec![create_test_order(2, 200, OrderSide::Sell, 10, 5, 5)];

        let outcome = matcher.match_orders(buys, sells, Utc::now());

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].quantity, Decimal::new(5, 0));
        assert_eq!(outcome.matches[0].notional(), Decimal::new(50, 0));
        assert!(find(&outcome, 1).is_filled());
        assert!(find(&outcome, 2).is_filled());
        assert!(find(&outcome, 1).completed_at.is_some());
    }

    #[test]
    fn test_partial_fill_keeps_buy_open() {
        let matcher = Matcher::new();
        let mut buy = create_test_order(1, 100, OrderSide::Buy, 10, 10, 10);
        // 이전에 완료 시각이 남아 있어도 부분 체결이면 지워져야 함
        buy.completed_at = Some(Utc::now());
        let sells = vec![create_test_order(2, 200, OrderSide::Sell, 10, 4, 5)];

        let outcome = matcher.match_orders(vec![buy], sells, Utc::now());

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].quantity, Decimal::new(4, 0));
        let buy = find(&outcome, 1);
        assert_eq!(buy.quantity, Decimal::new(6, 0));
        assert_eq!(buy.status, OrderStatus::Open);
        assert!(buy.completed_at.is_none());
        assert!(find(&outcome, 2).is_filled());
    }

    #[test]
    fn test_no_cross_when_bid_below_ask() {
        let matcher = Matcher::new();
        let buys = vec![create_test_order(1, 100, OrderSide::Buy, 9, 5, 10)];
        let sells = vec![create_test_order(2, 200, OrderSide::Sell, 10, 5, 5)];

        let outcome = matcher.match_orders(buys, sells, Utc::now());

        assert!(outcome.is_empty());
        assert!(outcome.updated_orders.is_empty());
    }

    #[test]
    fn test_best_price_beats_older_order() {
        // 오래된 10짜리보다 새로운 11짜리 매수가 먼저 체결
        let matcher = Matcher::new();
        let buys = vec![
            create_test_order(1, 100, OrderSide::Buy, 10, 5, 60),
            create_test_order(2, 101, OrderSide::Buy, 11, 5, 1),
        ];
        let sells = vec![create_test_order(3, 200, OrderSide::Sell, 10, 5, 30)];

        let outcome = matcher.match_orders(buys, sells, Utc::now());

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].buy_order_id, 2);
        assert_eq!(outcome.matches[0].price, Decimal::new(11, 0));
        assert!(outcome.updated_orders.iter().all(|o| o.id != 1));
    }

    #[test]
    fn test_older_order_first_at_equal_price() {
        let matcher = Matcher::new();
        let buys = vec![
            create_test_order(1, 100, OrderSide::Buy, 10, 5, 5),
            create_test_order(2, 101, OrderSide::Buy, 10, 5, 50),
        ];
        let sells = vec![create_test_order(3, 200, OrderSide::Sell, 10, 5, 30)];

        let outcome = matcher.match_orders(buys, sells, Utc::now());

        assert_eq!(outcome.matches[0].buy_order_id, 2);
    }

    #[test]
    fn test_equal_timestamp_falls_back_to_lower_id() {
        let matcher = Matcher::new();
        let mut a = create_test_order(7, 100, OrderSide::Buy, 10, 5, 0);
        let mut b = create_test_order(4, 101, OrderSide::Buy, 10, 5, 0);
        let ts = Utc::now();
        a.created_at = ts;
        b.created_at = ts;
        let sells = vec![create_test_order(9, 200, OrderSide::Sell, 10, 5, 0)];

        let outcome = matcher.match_orders(vec![a, b], sells, Utc::now());

        assert_eq!(outcome.matches[0].buy_order_id, 4);
    }

    #[test]
    fn test_one_sell_sweeps_several_buys() {
        let matcher = Matcher::new();
        let buys = vec![
            create_test_order(1, 100, OrderSide::Buy, 12, 2, 10),
            create_test_order(2, 101, OrderSide::Buy, 11, 2, 10),
            create_test_order(3, 102, OrderSide::Buy, 9, 2, 10),
        ];
        let sells = vec![create_test_order(4, 200, OrderSide::Sell, 10, 5, 10)];

        let outcome = matcher.match_orders(buys, sells, Utc::now());

        let pairs: Vec<(u64, Decimal)> = outcome.matches.iter().map(|m| (m.buy_order_id, m.quantity)).collect();
        assert_eq!(pairs, vec![(1, Decimal::new(2, 0)), (2, Decimal::new(2, 0))]);
        let sell = find(&outcome, 4);
        assert_eq!(sell.quantity, Decimal::new(1, 0));
        assert_eq!(sell.status, OrderStatus::Open);
    }

    #[test]
    fn test_fractional_quantities_complete_exactly() {
        let matcher = Matcher::new();
        let mut buy = create_test_order(1, 100, OrderSide::Buy, 10, 0, 10);
        buy.quantity = Decimal::new(3, 1); // 0.3
        let mut s1 = create_test_order(2, 200, OrderSide::Sell, 10, 0, 9);
        s1.quantity = Decimal::new(1, 1); // 0.1
        let mut s2 = create_test_order(3, 201, OrderSide::Sell, 10, 0, 8);
        s2.quantity = Decimal::new(2, 1); // 0.2

        let outcome = matcher.match_orders(vec![buy], vec![s1, s2], Utc::now());

        assert_eq!(outcome.matches.len(), 2);
        assert!(outcome.updated_orders.iter().all(|o| o.is_filled()));
    }
}
