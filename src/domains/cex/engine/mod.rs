// =====================================================
// 체결 / 정산 엔진 모듈
// Matching & Settlement Engine Module
// =====================================================
// 구조:
// - matcher: 가격-시간 우선 매칭 (순수 함수)
// - lock_manager: 잔고 잠금 (reserve / settle)
// - settlement: 매칭 + 잔고 이동을 한 트랜잭션으로 실행
// - scheduler: 고정 주기로 정산 실행
//
// 엔진은 Store trait에만 의존합니다.
// (PostgreSQL / 메모리 구현체 모두 같은 코드 경로)
// =====================================================

pub mod lock_manager;
pub mod matcher;
pub mod scheduler;
pub mod settlement;

pub use lock_manager::LockManager;
pub use matcher::{MatchOutcome, Matcher};
pub use scheduler::SettlementScheduler;
pub use settlement::{SettlementCoordinator, SettlementReport};
