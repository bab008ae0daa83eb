//! Initial database migration.
//!
//! Creates the financial core tables: reservations (balance fields),
//! payments, ledger_entries, gl_periods, payout_lines, gateway_events,
//! unresolved_events, plus enums, indexes, and triggers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: GL PERIODS
        // ============================================================
        db.execute_unprepared(GL_PERIODS_SQL).await?;

        // ============================================================
        // PART 3: RESERVATIONS (FINANCIAL FIELDS)
        // ============================================================
        db.execute_unprepared(RESERVATIONS_SQL).await?;

        // ============================================================
        // PART 4: PAYMENTS & LEDGER
        // ============================================================
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;

        // ============================================================
        // PART 5: RECONCILIATION
        // ============================================================
        db.execute_unprepared(PAYOUT_LINES_SQL).await?;

        // ============================================================
        // PART 6: EVENT DEDUPLICATION & QUARANTINE
        // ============================================================
        db.execute_unprepared(GATEWAY_EVENTS_SQL).await?;
        db.execute_unprepared(UNRESOLVED_EVENTS_SQL).await?;

        // ============================================================
        // PART 7: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Ledger entry direction
CREATE TYPE entry_direction AS ENUM (
    'debit',
    'credit'
);

-- Payment direction
CREATE TYPE payment_direction AS ENUM (
    'charge',
    'refund'
);

-- Payment method
CREATE TYPE payment_method AS ENUM (
    'card',
    'cash',
    'wallet',
    'check',
    'pos_terminal'
);

-- Payment lifecycle state
CREATE TYPE payment_state AS ENUM (
    'pending',
    'authorized',
    'succeeded',
    'partially_refunded',
    'refunded',
    'disputed',
    'charged_back',
    'failed'
);

-- Reservation payment status
CREATE TYPE reservation_payment_status AS ENUM (
    'unpaid',
    'partial',
    'paid'
);

-- GL period status
CREATE TYPE gl_period_status AS ENUM (
    'open',
    'closed',
    'locked'
);

-- Settlement line classification
CREATE TYPE settlement_line_type AS ENUM (
    'charge',
    'refund',
    'fee',
    'chargeback',
    'adjustment'
);
";

const GL_PERIODS_SQL: &str = r"
CREATE TABLE gl_periods (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    name VARCHAR(64) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status gl_period_status NOT NULL DEFAULT 'open',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT gl_periods_date_range CHECK (start_date <= end_date)
);

CREATE INDEX idx_gl_periods_tenant_dates ON gl_periods (tenant_id, start_date, end_date);
";

const RESERVATIONS_SQL: &str = r"
CREATE TABLE reservations (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    total_amount_cents BIGINT NOT NULL DEFAULT 0,
    paid_amount_cents BIGINT NOT NULL DEFAULT 0,
    balance_amount_cents BIGINT NOT NULL DEFAULT 0,
    payment_status reservation_payment_status NOT NULL DEFAULT 'unpaid',
    currency VARCHAR(3) NOT NULL DEFAULT 'USD',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT reservations_balance_non_negative CHECK (balance_amount_cents >= 0)
);

CREATE INDEX idx_reservations_tenant ON reservations (tenant_id);
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    reservation_id UUID NOT NULL REFERENCES reservations(id),
    direction payment_direction NOT NULL,
    method payment_method NOT NULL,
    state payment_state NOT NULL,
    amount_cents BIGINT NOT NULL,
    gateway_reference_id VARCHAR(255),
    charge_reference_id VARCHAR(255),
    occurred_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT payments_amount_positive CHECK (amount_cents > 0)
);

CREATE INDEX idx_payments_tenant_reservation ON payments (tenant_id, reservation_id);
CREATE INDEX idx_payments_tenant_gateway_ref ON payments (tenant_id, gateway_reference_id);
CREATE INDEX idx_payments_tenant_charge_ref ON payments (tenant_id, charge_reference_id);
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    account_code VARCHAR(64) NOT NULL,
    direction entry_direction NOT NULL,
    amount_cents BIGINT NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    posted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    dedupe_key VARCHAR(255) NOT NULL,
    line_no SMALLINT NOT NULL,
    reservation_id UUID,
    reference_id VARCHAR(255),
    period_id UUID NOT NULL REFERENCES gl_periods(id),

    CONSTRAINT ledger_entries_amount_positive CHECK (amount_cents > 0)
);

-- Dedupe keys are namespaced by tenant; line_no disambiguates lines of one group.
CREATE UNIQUE INDEX uq_ledger_entries_dedupe ON ledger_entries (tenant_id, dedupe_key, line_no);
CREATE INDEX idx_ledger_entries_tenant_occurred ON ledger_entries (tenant_id, occurred_at);
CREATE INDEX idx_ledger_entries_tenant_account ON ledger_entries (tenant_id, account_code, occurred_at);
CREATE INDEX idx_ledger_entries_tenant_reservation ON ledger_entries (tenant_id, reservation_id);
";

const PAYOUT_LINES_SQL: &str = r"
CREATE TABLE payout_lines (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    payout_ref VARCHAR(255) NOT NULL,
    balance_transaction_id VARCHAR(255) NOT NULL,
    line_type settlement_line_type NOT NULL,
    source_ref VARCHAR(255),
    gross_cents BIGINT NOT NULL,
    fee_cents BIGINT NOT NULL DEFAULT 0,
    net_cents BIGINT NOT NULL,
    currency VARCHAR(3) NOT NULL DEFAULT 'USD',
    matched BOOLEAN NOT NULL DEFAULT FALSE,
    payment_id UUID,
    drift_cents BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Re-running reconciliation upserts on this key instead of inserting again.
CREATE UNIQUE INDEX uq_payout_lines_balance_txn ON payout_lines (tenant_id, balance_transaction_id);
CREATE INDEX idx_payout_lines_tenant_payout ON payout_lines (tenant_id, payout_ref);
";

const GATEWAY_EVENTS_SQL: &str = r"
CREATE TABLE gateway_events (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL,
    event_id VARCHAR(255) NOT NULL,
    event_type VARCHAR(128) NOT NULL,
    fact_key VARCHAR(255) NOT NULL,
    processed_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- The fact key, not the event id, is the idempotency unit.
CREATE UNIQUE INDEX uq_gateway_events_fact ON gateway_events (tenant_id, fact_key);
CREATE INDEX idx_gateway_events_tenant_event ON gateway_events (tenant_id, event_id);
";

const UNRESOLVED_EVENTS_SQL: &str = r"
CREATE TABLE unresolved_events (
    id UUID PRIMARY KEY,
    event_id VARCHAR(255) NOT NULL,
    event_type VARCHAR(128) NOT NULL,
    payload JSONB NOT NULL,
    reason TEXT NOT NULL,
    received_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_unresolved_events_received ON unresolved_events (received_at);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_reservations_updated_at
    BEFORE UPDATE ON reservations
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_payments_updated_at
    BEFORE UPDATE ON payments
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_payout_lines_updated_at
    BEFORE UPDATE ON payout_lines
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS unresolved_events CASCADE;
DROP TABLE IF EXISTS gateway_events CASCADE;
DROP TABLE IF EXISTS payout_lines CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS reservations CASCADE;
DROP TABLE IF EXISTS gl_periods CASCADE;

DROP FUNCTION IF EXISTS set_updated_at CASCADE;

DROP TYPE IF EXISTS settlement_line_type;
DROP TYPE IF EXISTS gl_period_status;
DROP TYPE IF EXISTS reservation_payment_status;
DROP TYPE IF EXISTS payment_state;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS payment_direction;
DROP TYPE IF EXISTS entry_direction;
";
