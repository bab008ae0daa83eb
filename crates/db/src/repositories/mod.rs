//! Repository abstractions for data access.
//!
//! Repositories are the only code that touches the database. Cross-entity
//! money movements (payment + projection + posting) are composed here inside
//! single transactions; the pure rules they enforce live in `pinewood-core`.

pub mod gateway_event;
pub mod payment;
pub mod payout;
pub mod period;
pub mod posting;
pub mod processor;
pub mod reconciliation;
pub mod reservation;

pub use gateway_event::GatewayEventRepository;
pub use payment::PaymentRepository;
pub use payout::PayoutLineRepository;
pub use period::PeriodRepository;
pub use posting::PostingRepository;
pub use processor::PaymentEventProcessor;
pub use reconciliation::ReconciliationRepository;
pub use reservation::ReservationRepository;
