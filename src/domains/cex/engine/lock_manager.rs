// =====================================================
// LockManager - 잔고 잠금 관리
// =====================================================
// 역할: available 잔고와 reserved 잔고를 분리
//
// 잔고 흐름:
// 1. reserve: available -= amount, reservation 생성
// 2. settle: 체결 시 reservation 소비 (오래된 것부터)
//    - 합계 == amount: 전부 삭제
//    - 합계 > amount: 차감 (부분 체결)
//    - 합계 < amount: InsufficientReservation (정산 회계 오류)
//
// 받는 쪽 자산의 available 증가는 정산 코디네이터가
// BalanceLedger::credit으로 같은 단계에서 처리합니다.
// =====================================================

use rust_decimal::Decimal;
use tracing::debug;

use crate::domains::cex::models::{Asset, Reservation};
use crate::shared::database::{BalanceLedger, ReservationStore};
use crate::shared::errors::{ExchangeError, ExchangeResult};

/// 잔고 잠금 관리자
/// Reserve / settle protocol on top of a unit of work
#[derive(Debug, Clone, Copy, Default)]
pub struct LockManager;

impl LockManager {
    pub fn new() -> Self {
        Self
    }

    /// 잔고 잠금
    /// Move `amount` from available into a new reservation
    ///
    /// 잔고가 부족하면 InsufficientBalance, 아무것도 바뀌지 않음
    pub async fn reserve<U>(
        &self,
        uow: &mut U,
        user_id: u64,
        asset: Asset,
        amount: Decimal,
    ) -> ExchangeResult<Reservation>
    where
        U: BalanceLedger + ReservationStore,
    {
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(format!(
                "reservation amount must be positive: {}",
                amount
            )));
        }

        uow.debit(user_id, asset, amount).await?;
        let reservation = uow.insert_reservation(user_id, asset, amount).await?;

        debug!(user_id, %asset, %amount, reservation_id = reservation.id, "reserved");
        Ok(reservation)
    }

    /// 잠긴 금액 합계
    pub async fn reserved_total<U>(&self, uow: &mut U, user_id: u64, asset: Asset) -> ExchangeResult<Decimal>
    where
        U: ReservationStore,
    {
        uow.reserved_total(user_id, asset).await
    }

    /// 체결로 넘겨준 금액만큼 잠금 소비
    /// Consume `amount` of the user's reservations for `asset`, oldest first
    pub async fn settle<U>(
        &self,
        uow: &mut U,
        user_id: u64,
        asset: Asset,
        amount: Decimal,
    ) -> ExchangeResult<()>
    where
        U: ReservationStore,
    {
        let reservations = uow.list_reservations(user_id, asset).await?;
        let reserved: Decimal = reservations.iter().map(|r| r.amount).sum();

        if reserved < amount {
            return Err(ExchangeError::InsufficientReservation {
                user_id,
                asset,
                required: amount,
                reserved,
            });
        }

        let mut remaining = amount;
        for reservation in reservations {
            if remaining.is_zero() {
                break;
            }
            if reservation.amount <= remaining {
                uow.delete_reservation(reservation.id).await?;
                remaining -= reservation.amount;
            } else {
                uow.update_reservation_amount(reservation.id, reservation.amount - remaining)
                    .await?;
                remaining = Decimal::ZERO;
            }
        }

        debug!(user_id, %asset, %amount, reserved_before = %reserved, "settled reservation");
        Ok(())
    }
}
